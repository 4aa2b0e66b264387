//! # Capital Allocation Line
//!
//! $$
//! E[R_c] = r_f + \sigma_c\,\frac{E[R_i]-r_f}{\sigma_i}
//! $$
//!
//! Risk/return trade-off of mixing one risky position with the risk-free
//! asset.

use statrs::statistics::Statistics;

use super::portfolio::PortfolioSample;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Line from the risk-free rate through one risky position.
#[derive(Clone, Debug, PartialEq)]
pub struct CapitalAllocationLine {
  pub id: String,
  pub risk_free_rate: f64,
  /// Annualized expected return of the risky position.
  pub expected_return: f64,
  /// Annualized volatility of the risky position.
  pub volatility: f64,
  /// Slope of the line.
  pub sharpe_ratio: f64,
}

impl CapitalAllocationLine {
  /// From daily log returns: mean and standard deviation are scaled by
  /// `periods_per_year` and its square root.
  pub fn from_returns(
    id: impl Into<String>,
    returns: &[f64],
    risk_free_rate: f64,
    periods_per_year: f64,
  ) -> Result<Self> {
    if returns.len() < 2 {
      return Err(AnalyticsError::InsufficientData {
        required: 2,
        got: returns.len(),
      });
    }

    let expected_return = returns.mean() * periods_per_year;
    let volatility = returns.std_dev() * periods_per_year.sqrt();
    Self::from_point(id, expected_return, volatility, risk_free_rate)
  }

  /// Tangent line through a sampled portfolio.
  pub fn from_sample(
    id: impl Into<String>,
    sample: &PortfolioSample,
    risk_free_rate: f64,
  ) -> Result<Self> {
    Self::from_point(id, sample.expected_return, sample.volatility, risk_free_rate)
  }

  fn from_point(
    id: impl Into<String>,
    expected_return: f64,
    volatility: f64,
    risk_free_rate: f64,
  ) -> Result<Self> {
    let id = id.into();
    if !(volatility > 0.0) || !volatility.is_finite() {
      return Err(AnalyticsError::DegenerateInput(format!(
        "{id} has zero volatility, Sharpe ratio is undefined"
      )));
    }

    Ok(Self {
      id,
      risk_free_rate,
      expected_return,
      volatility,
      sharpe_ratio: (expected_return - risk_free_rate) / volatility,
    })
  }

  /// Expected return of the combination with volatility `sigma`.
  pub fn expected_return_at(&self, sigma: f64) -> f64 {
    self.risk_free_rate + sigma * self.sharpe_ratio
  }

  /// `n` evenly spaced `(volatility, expected return)` points on `[0, max_sigma]`.
  pub fn points(&self, n: usize, max_sigma: f64) -> Vec<(f64, f64)> {
    match n {
      0 => Vec::new(),
      1 => vec![(0.0, self.risk_free_rate)],
      _ => (0..n)
        .map(|i| {
          let sigma = max_sigma * i as f64 / (n - 1) as f64;
          (sigma, self.expected_return_at(sigma))
        })
        .collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn line_passes_through_risky_point() {
    let returns = [0.01, -0.02, 0.015, 0.005];
    let cal = CapitalAllocationLine::from_returns("A", &returns, 0.01, 252.0).unwrap();

    assert_abs_diff_eq!(cal.expected_return, 0.0025 * 252.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cal.volatility, 0.0609_f64.sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(
      cal.expected_return_at(cal.volatility),
      cal.expected_return,
      epsilon = 1e-12
    );
  }

  #[test]
  fn points_span_zero_to_max() {
    let cal = CapitalAllocationLine::from_point("A", 0.11, 0.2, 0.01).unwrap();
    let pts = cal.points(5, 0.4);

    assert_eq!(pts.len(), 5);
    assert_eq!(pts[0], (0.0, 0.01));
    assert_abs_diff_eq!(pts[4].0, 0.4);
    assert_abs_diff_eq!(pts[4].1, 0.21, epsilon = 1e-12);
  }

  #[test]
  fn flat_returns_are_degenerate() {
    let err = CapitalAllocationLine::from_returns("F", &[0.0; 5], 0.01, 252.0).unwrap_err();
    assert!(matches!(err, AnalyticsError::DegenerateInput(_)));
  }
}
