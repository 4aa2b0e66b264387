//! # Error
//!
//! Typed failures surfaced by the analytics core. No computation ever falls
//! back to a placeholder value; every undefined statistic ends up here.

use thiserror::Error;

/// Error type for all analytics operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
  /// Malformed input data, e.g. non-positive prices or too short a price series.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// Date indexes do not match across instruments where alignment is required.
  #[error("misaligned series: {0}")]
  MisalignedSeries(String),

  /// Fewer observations than the statistic requires.
  #[error("insufficient data: need at least {required} observations, got {got}")]
  InsufficientData { required: usize, got: usize },

  /// A ratio is undefined, e.g. a zero-variance regressor or zero-volatility portfolio.
  #[error("degenerate input: {0}")]
  DegenerateInput(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
