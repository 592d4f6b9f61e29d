//! Shared error type across meterkit crates.

use thiserror::Error;

/// Coarse error classes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised while building an instrument or loading configuration.
    Configuration,
    /// Raised by a write/read call on an already built instrument.
    Usage,
}

impl ErrorKind {
    /// String representation used in logs and by collaborators.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CONFIGURATION",
            ErrorKind::Usage => "USAGE",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MeterError>;

/// Unified error type used by core and config.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeterError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("quantile must be within (0, 1), got {0}")]
    QuantileOutOfRange(f64),
    #[error("value must be finite, got {0}")]
    NonFinite(f64),
    #[error("counter increment must be non-negative, got {0}")]
    NegativeIncrement(i64),
    #[error("quantile {0} is not tracked by this estimator")]
    UnknownQuantile(f64),
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),
    #[error("io: {0}")]
    Io(String),
}

impl MeterError {
    /// Map the error to a stable coarse class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeterError::InvalidConfig(_)
            | MeterError::QuantileOutOfRange(_)
            | MeterError::UnsupportedVersion(_)
            | MeterError::Io(_) => ErrorKind::Configuration,
            MeterError::NonFinite(_)
            | MeterError::NegativeIncrement(_)
            | MeterError::UnknownQuantile(_) => ErrorKind::Usage,
        }
    }
}

/// Reject NaN and infinities with a usage error.
pub(crate) fn ensure_finite(v: f64) -> Result<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MeterError::NonFinite(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(MeterError::NonFinite(f64::NAN).kind().as_str(), "USAGE");
        assert_eq!(MeterError::NegativeIncrement(-1).kind(), ErrorKind::Usage);
        assert_eq!(
            MeterError::InvalidConfig("x".into()).kind().as_str(),
            "CONFIGURATION"
        );
        assert_eq!(MeterError::QuantileOutOfRange(1.5).kind(), ErrorKind::Configuration);
    }

    #[test]
    fn finite_check() {
        assert_eq!(ensure_finite(1.5), Ok(1.5));
        assert!(ensure_finite(f64::INFINITY).is_err());
        assert!(ensure_finite(f64::NEG_INFINITY).is_err());
        assert!(ensure_finite(f64::NAN).is_err());
    }
}
