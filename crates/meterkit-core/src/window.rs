//! Windowing policy for instruments that can forget old observations.

use std::time::Duration;

use crate::error::{MeterError, Result};

/// How long accumulated state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPolicy {
    /// State accumulates for the instrument's lifetime.
    #[default]
    Cumulative,
    /// State resets lazily on the first write after each period elapses.
    Tumbling(Duration),
}

impl WindowPolicy {
    pub fn tumbling(period: Duration) -> Result<Self> {
        let policy = WindowPolicy::Tumbling(period);
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            WindowPolicy::Tumbling(period) if period.is_zero() => Err(MeterError::InvalidConfig(
                "tumbling window period must be greater than zero".into(),
            )),
            _ => Ok(()),
        }
    }
}
