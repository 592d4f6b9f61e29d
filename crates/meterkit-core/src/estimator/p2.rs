//! P² streaming estimator for a single quantile (Jain & Chlamtac, 1985).
//!
//! Five markers track the minimum, the target quantile, the two mid-points
//! around it, and the maximum. Memory is constant regardless of stream length.
//!
//! Marker invariants (hold after every `add`):
//! - `heights` is non-decreasing
//! - `positions` is strictly increasing

use crate::config::validate_quantile;
use crate::error::{ensure_finite, Result};

const MARKERS: usize = 5;

#[derive(Debug, Clone)]
pub struct P2Estimator {
    q: f64,
    count: u64,
    min: f64,
    max: f64,
    heights: [f64; MARKERS],
    positions: [i64; MARKERS],
    desired: [f64; MARKERS],
    /// Desired-position increments per observation; `desired[4]` tracks count.
    step: [f64; MARKERS],
}

impl P2Estimator {
    /// Estimator for quantile `q`, which must lie strictly within (0, 1).
    pub fn new(q: f64) -> Result<Self> {
        let q = validate_quantile(q)?;
        Ok(Self {
            q,
            count: 0,
            min: 0.0,
            max: 0.0,
            heights: [0.0; MARKERS],
            positions: [1, 2, 3, 4, 5],
            desired: Self::initial_desired(q),
            step: [0.0, q / 2.0, q, (1.0 + q) / 2.0, 1.0],
        })
    }

    fn initial_desired(q: f64) -> [f64; MARKERS] {
        [1.0, 1.0 + 2.0 * q, 1.0 + 4.0 * q, 3.0 + 2.0 * q, 5.0]
    }

    pub fn quantile(&self) -> f64 {
        self.q
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Exact stream minimum, or 0 when empty.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Exact stream maximum, or 0 when empty.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Feed one observation. Non-finite values are rejected untouched.
    pub fn add(&mut self, x: f64) -> Result<()> {
        let x = ensure_finite(x)?;
        self.push(x);
        Ok(())
    }

    /// Infallible path for callers that already checked `x`.
    pub(crate) fn push(&mut self, x: f64) {
        if self.count == 0 {
            self.min = x;
            self.max = x;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }

        if self.count < MARKERS as u64 {
            // bootstrap: the first five samples live in `heights`, unsorted
            self.heights[self.count as usize] = x;
            self.count += 1;
            if self.count == MARKERS as u64 {
                self.heights.sort_by(f64::total_cmp);
            }
            return;
        }
        self.count += 1;

        let cell = self.locate(x);
        for n in &mut self.positions[cell + 1..] {
            *n += 1;
        }
        for (np, dn) in self.desired.iter_mut().zip(self.step) {
            *np += dn;
        }
        self.desired[4] = self.count as f64;

        for i in 1..MARKERS - 1 {
            self.adjust(i);
        }
    }

    /// Index k of the cell `heights[k] <= x < heights[k+1]`, widening the
    /// outer markers when `x` is a new extreme.
    fn locate(&mut self, x: f64) -> usize {
        let h = &mut self.heights;
        if x < h[0] {
            h[0] = x;
            0
        } else if x >= h[4] {
            h[4] = x;
            3
        } else {
            // h[0] <= x < h[4], so some k in 0..4 matches
            (0..MARKERS - 1).find(|&k| x < h[k + 1]).unwrap_or(3)
        }
    }

    fn adjust(&mut self, i: usize) {
        let n = &self.positions;
        let d = self.desired[i] - n[i] as f64;
        let room_up = n[i + 1] - n[i] > 1;
        let room_down = n[i - 1] - n[i] < -1;
        if !((d >= 1.0 && room_up) || (d <= -1.0 && room_down)) {
            return;
        }

        let sign: i64 = if d > 0.0 { 1 } else { -1 };
        let candidate = self.parabolic(i, sign as f64);
        let within = self.heights[i - 1] < candidate && candidate < self.heights[i + 1];
        let next = if within { candidate } else { self.linear(i, sign) };
        self.heights[i] = next;
        self.positions[i] += sign;
    }

    fn parabolic(&self, i: usize, d: f64) -> f64 {
        let (q, n) = (&self.heights, &self.positions);
        let (n_prev, n_cur, n_next) = (n[i - 1] as f64, n[i] as f64, n[i + 1] as f64);
        q[i] + d / (n_next - n_prev)
            * ((n_cur - n_prev + d) * (q[i + 1] - q[i]) / (n_next - n_cur)
                + (n_next - n_cur - d) * (q[i] - q[i - 1]) / (n_cur - n_prev))
    }

    fn linear(&self, i: usize, sign: i64) -> f64 {
        let j = if sign > 0 { i + 1 } else { i - 1 };
        let (q, n) = (&self.heights, &self.positions);
        q[i] + sign as f64 * (q[j] - q[i]) / (n[j] - n[i]) as f64
    }

    /// Current estimate. With fewer than five samples this is the naive
    /// quantile of the partial set; with none it is 0.
    pub fn get_quantile(&self) -> f64 {
        match self.count {
            0 => 0.0,
            c if c < MARKERS as u64 => {
                let mut partial = self.heights[..c as usize].to_vec();
                partial.sort_by(f64::total_cmp);
                let idx = ((c - 1) as f64 * self.q).floor() as usize;
                partial[idx.min(partial.len() - 1)]
            }
            _ => self.heights[2],
        }
    }

    /// Forget every observation; the quantile is kept.
    pub fn reset(&mut self) {
        self.count = 0;
        self.min = 0.0;
        self.max = 0.0;
        self.heights = [0.0; MARKERS];
        self.positions = [1, 2, 3, 4, 5];
        self.desired = Self::initial_desired(self.q);
    }

    #[cfg(test)]
    fn markers_ordered(&self) -> bool {
        self.heights.windows(2).all(|w| w[0] <= w[1])
            && self.positions.windows(2).all(|w| w[0] < w[1])
    }
}
