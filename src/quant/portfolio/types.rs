//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}\in\Delta^{k-1}} \frac{\mathbf{w}^\top\mu-r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Weight vectors on the simplex and scored portfolio samples.

use ndarray::Array1;

use crate::error::AnalyticsError;
use crate::error::Result;

/// Long-only, fully invested weights: non-negative and summing to one.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioWeights(Array1<f64>);

impl PortfolioWeights {
  /// Normalize non-negative raw draws by their sum.
  pub fn from_raw(raw: Array1<f64>) -> Result<Self> {
    if raw.iter().any(|w| !w.is_finite() || *w < 0.0) {
      return Err(AnalyticsError::InvalidInput(
        "weights must be finite and non-negative".to_string(),
      ));
    }

    let total = raw.sum();
    if total <= 0.0 {
      return Err(AnalyticsError::DegenerateInput(
        "weights sum to zero and cannot be normalized".to_string(),
      ));
    }

    Ok(Self(raw / total))
  }

  /// Equal weight on each of `k` instruments.
  pub fn equal(k: usize) -> Result<Self> {
    Self::from_raw(Array1::ones(k))
  }

  pub fn as_array(&self) -> &Array1<f64> {
    &self.0
  }

  pub fn to_vec(&self) -> Vec<f64> {
    self.0.to_vec()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// One scored candidate of a frontier search.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioSample {
  pub weights: PortfolioWeights,
  /// `w . mu`, annualized if the inputs are.
  pub expected_return: f64,
  /// `sqrt(w' Sigma w)`.
  pub volatility: f64,
  /// `(expected_return - risk_free) / volatility`.
  pub sharpe_ratio: f64,
}

/// Result of a frontier search.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingOutcome {
  /// Highest Sharpe ratio among all candidates; ties go to the earliest draw.
  pub best: PortfolioSample,
  /// Every candidate in draw order, when requested.
  pub samples: Option<Vec<PortfolioSample>>,
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn from_raw_normalizes() {
    let w = PortfolioWeights::from_raw(array![1.0, 3.0]).unwrap();
    assert_abs_diff_eq!(w.as_array()[0], 0.25);
    assert_abs_diff_eq!(w.as_array()[1], 0.75);
  }

  #[test]
  fn zero_draw_is_degenerate() {
    let err = PortfolioWeights::from_raw(array![0.0, 0.0]).unwrap_err();
    assert!(matches!(err, AnalyticsError::DegenerateInput(_)));
  }

  #[test]
  fn negative_weight_is_rejected() {
    let err = PortfolioWeights::from_raw(array![1.0, -0.5]).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
  }
}
