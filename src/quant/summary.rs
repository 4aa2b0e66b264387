//! # Summary
//!
//! $$
//! G_1=\frac{n}{(n-1)(n-2)}\sum_t\Big(\frac{r_t-\bar r}{s}\Big)^3
//! $$
//!
//! Descriptive statistics of a log-return series.

use statrs::statistics::Data;
use statrs::statistics::OrderStatistics;
use statrs::statistics::Statistics;

use super::returns::total_return;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Moments and totals of one return series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummaryStatistics {
  pub n_obs: usize,
  pub mean: f64,
  pub min: f64,
  /// First quartile (R-8 estimator, as `statrs` computes it).
  pub lower_quartile: f64,
  pub median: f64,
  /// Third quartile (R-8 estimator).
  pub upper_quartile: f64,
  pub max: f64,
  /// Sample standard deviation (divisor `n - 1`).
  pub std_dev: f64,
  /// Adjusted Fisher-Pearson skewness; needs 3 observations and non-zero spread.
  pub skewness: Option<f64>,
  /// Adjusted excess kurtosis; needs 4 observations and non-zero spread.
  pub excess_kurtosis: Option<f64>,
  /// `exp(sum r) - 1`.
  pub total_return: f64,
}

impl SummaryStatistics {
  pub fn from_returns(returns: &[f64]) -> Result<Self> {
    let n = returns.len();
    if n < 2 {
      return Err(AnalyticsError::InsufficientData {
        required: 2,
        got: n,
      });
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();
    let mut sorted = Data::new(returns.to_vec());
    let median = sorted.median();
    let lower_quartile = sorted.lower_quartile();
    let upper_quartile = sorted.upper_quartile();

    let nf = n as f64;
    let spread = std_dev > 0.0 && std_dev.is_finite();
    let m3: f64 = returns.iter().map(|r| ((r - mean) / std_dev).powi(3)).sum();
    let m4: f64 = returns.iter().map(|r| ((r - mean) / std_dev).powi(4)).sum();

    let skewness = (spread && n >= 3).then(|| nf / ((nf - 1.0) * (nf - 2.0)) * m3);
    let excess_kurtosis = (spread && n >= 4).then(|| {
      nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0)) * m4
        - 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0))
    });

    Ok(Self {
      n_obs: n,
      mean,
      min: Statistics::min(returns),
      lower_quartile,
      median,
      upper_quartile,
      max: Statistics::max(returns),
      std_dev,
      skewness,
      excess_kurtosis,
      total_return: total_return(returns),
    })
  }
}
