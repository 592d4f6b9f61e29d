//! meterkit soak: hammer every instrument kind from worker threads and log
//! periodic snapshots.
//!
//! Usage: `meterkit-soak [config.yaml] [seconds]` (defaults: built-in config, 5s).
//! Log level via `RUST_LOG`, e.g. `RUST_LOG=info,meterkit_core=debug`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing_subscriber::{fmt, EnvFilter};

use meterkit::core::{
    BucketHistogramValue, CounterValue, DistributionValue, GaugeValue, MultiGaugeValue, Result,
    SummaryValue,
};
use meterkit::prelude::*;

const WORKERS: usize = 4;

/// Writes each snapshot as one structured log line.
struct LogVisitor;

impl MetricVisitor for LogVisitor {
    fn visit_counter(&mut self, id: &MetricIdentity, v: &CounterValue) {
        tracing::info!(metric = %id, value = v.value, "counter");
    }
    fn visit_gauge(&mut self, id: &MetricIdentity, v: &GaugeValue) {
        tracing::info!(metric = %id, value = v.value, "gauge");
    }
    fn visit_distribution(&mut self, id: &MetricIdentity, v: &DistributionValue) {
        tracing::info!(
            metric = %id, count = v.count, min = v.min, p50 = v.p50,
            p90 = v.p90, p99 = v.p99, max = v.max, "distribution"
        );
    }
    fn visit_summary(&mut self, id: &MetricIdentity, v: &SummaryValue) {
        tracing::info!(metric = %id, count = v.count, min = v.min, max = v.max, quantiles = ?v.quantiles, "summary");
    }
    fn visit_bucket_histogram(&mut self, id: &MetricIdentity, v: &BucketHistogramValue) {
        tracing::info!(metric = %id, count = v.count, sum = v.sum, counts = ?v.counts, "buckets");
    }
    fn visit_multi_gauge(&mut self, id: &MetricIdentity, v: &MultiGaugeValue) {
        tracing::info!(metric = %id, siblings = v.siblings.len(), "multi_gauge");
    }
}

struct Instruments {
    ops: Arc<meterkit::core::Counter>,
    inflight: Arc<meterkit::core::Gauge>,
    sizes: Arc<meterkit::core::Histogram>,
    buckets: Arc<meterkit::core::BucketHistogram>,
    latency: Arc<meterkit::core::Summary>,
    work: Arc<meterkit::core::Timer>,
    per_worker: Arc<meterkit::core::MultiGauge>,
}

impl Instruments {
    fn build(cfg: Arc<MetricsConfig>) -> Result<Self> {
        Ok(Self {
            ops: Arc::new(
                CounterBuilder::new(cfg.clone(), "soak.ops", "Operations")
                    .with_unit("ops")
                    .build()?,
            ),
            inflight: Arc::new(GaugeBuilder::new(cfg.clone(), "soak.last", "Last value").build()?),
            sizes: Arc::new(HistogramBuilder::new(cfg.clone(), "soak.sizes", "Sizes").build()?),
            buckets: Arc::new(
                BucketHistogramBuilder::new(cfg.clone(), "soak.buckets", "Size buckets")
                    .exponential(1.0, 2.0, 12)
                    .build()?,
            ),
            latency: Arc::new(SummaryBuilder::new(cfg.clone(), "soak.latency", "Latency").build()?),
            work: Arc::new(TimerBuilder::new(cfg.clone(), "soak.work", "Work time").build()?),
            per_worker: Arc::new(
                MultiGaugeBuilder::new(cfg, "soak.worker", "Per-worker last value").build()?,
            ),
        })
    }

    fn all(&self) -> Vec<Arc<dyn Instrument>> {
        vec![
            self.ops.clone() as Arc<dyn Instrument>,
            self.inflight.clone() as Arc<dyn Instrument>,
            self.sizes.clone() as Arc<dyn Instrument>,
            self.buckets.clone() as Arc<dyn Instrument>,
            self.latency.clone() as Arc<dyn Instrument>,
            self.work.clone() as Arc<dyn Instrument>,
            self.per_worker.clone() as Arc<dyn Instrument>,
        ]
    }
}

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let cfg = match args.next() {
        Some(path) => match load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(%path, error = %e, kind = e.kind().as_str(), "config load failed");
                std::process::exit(2);
            }
        },
        None => MetricsConfig::default(),
    };
    let seconds: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);

    let instruments = match Instruments::build(Arc::new(cfg)) {
        Ok(i) => Arc::new(i),
        Err(e) => {
            tracing::error!(error = %e, "instrument build failed");
            std::process::exit(2);
        }
    };

    tracing::info!(workers = WORKERS, seconds, "meterkit-soak starting");
    let stop = Arc::new(AtomicBool::new(false));
    let workers: Vec<_> = (0..WORKERS)
        .map(|w| {
            let (m, stop) = (Arc::clone(&instruments), Arc::clone(&stop));
            thread::spawn(move || {
                let worker = w.to_string();
                let mut i: u64 = 0;
                while !stop.load(Ordering::Relaxed) {
                    let x = ((i * 7919 + w as u64 * 104_729) % 4096) as f64;
                    m.work.measure(|| {
                        m.ops.increment_one();
                        m.inflight.try_set_value(x);
                        m.sizes.try_record(x);
                        m.buckets.try_record(x);
                        m.latency.try_record(x);
                        m.per_worker.try_add_sibling([("worker", worker.as_str())], x);
                    });
                    i += 1;
                }
            })
        })
        .collect();

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut visitor = LogVisitor;
    while Instant::now() < deadline {
        thread::sleep(Duration::from_secs(1));
        for inst in instruments.all() {
            inst.accept(&mut visitor);
        }
    }

    stop.store(true, Ordering::Relaxed);
    for h in workers {
        if h.join().is_err() {
            tracing::warn!("worker thread panicked");
        }
    }
    tracing::info!(ops = instruments.ops.get_value().value, "meterkit-soak finished");
}
