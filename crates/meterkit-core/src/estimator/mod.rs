//! Streaming quantile estimation.

pub mod multi;
pub mod p2;

pub use multi::{MultiQuantileEstimator, QuantileSnapshot};
pub use p2::P2Estimator;
