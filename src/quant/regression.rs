//! # Regression
//!
//! $$
//! r_{i,t} - r_f = \alpha_i + \beta_i\,(r_{m,t} - r_f) + \varepsilon_{i,t}
//! $$
//!
//! Single-index OLS regression of an instrument's returns on a reference
//! (market) series, in raw or excess-return (CAPM) form.

use impl_new_derive::ImplNew;
use linreg::linear_regression;

use super::returns::align_pair;
use super::returns::ReturnMatrix;
use super::returns::ReturnSeries;
use crate::config::RegressionMode;
use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Intercept, slope and goodness of fit of one regression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegressionResult {
  /// Intercept, in the per-period units of the dependent series.
  pub alpha: f64,
  /// Slope on the reference series.
  pub beta: f64,
  /// Squared Pearson correlation, in `[0, 1]`.
  pub r_squared: f64,
  /// Number of paired observations used.
  pub n_obs: usize,
}

/// Per-period risk-free increment `rf / 252`.
pub fn daily_risk_free(risk_free_rate: f64) -> f64 {
  risk_free_rate / TRADING_DAYS_PER_YEAR as f64
}

/// Subtract the per-period risk-free increment from every return.
pub fn excess_returns(returns: &[f64], risk_free_rate: f64) -> Vec<f64> {
  let rf = daily_risk_free(risk_free_rate);
  returns.iter().map(|r| r - rf).collect()
}

fn mean(xs: &[f64]) -> f64 {
  xs.iter().sum::<f64>() / xs.len() as f64
}

/// Centred sum of squares vanishes up to rounding of the mean.
fn is_flat(centred_ss: f64, xs: &[f64]) -> bool {
  let scale = xs.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
  centred_ss.sqrt() <= f64::EPSILON * scale * xs.len() as f64
}

/// Ordinary least squares fit `y = alpha + beta * x` on paired slices.
pub fn ols(y: &[f64], x: &[f64]) -> Result<RegressionResult> {
  if y.len() != x.len() {
    return Err(AnalyticsError::MisalignedSeries(format!(
      "dependent has {} observations, regressor has {}",
      y.len(),
      x.len()
    )));
  }

  let n = y.len();
  if n < 2 {
    return Err(AnalyticsError::InsufficientData {
      required: 2,
      got: n,
    });
  }

  if y.iter().chain(x.iter()).any(|v| !v.is_finite()) {
    return Err(AnalyticsError::InvalidInput(
      "regression inputs must be finite".to_string(),
    ));
  }

  let mx = mean(x);
  let my = mean(y);

  let sxx: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
  let syy: f64 = y.iter().map(|v| (v - my).powi(2)).sum();

  if is_flat(sxx, x) {
    return Err(AnalyticsError::DegenerateInput(
      "regressor has zero variance, beta is undefined".to_string(),
    ));
  }
  if is_flat(syy, y) {
    return Err(AnalyticsError::DegenerateInput(
      "dependent series has zero variance, r-squared is undefined".to_string(),
    ));
  }

  let (beta, alpha): (f64, f64) = linear_regression(x, y).map_err(|_| {
    AnalyticsError::DegenerateInput("least squares line could not be fitted".to_string())
  })?;
  // beta = Sxy / Sxx, so beta^2 Sxx / Syy is the squared correlation.
  let r_squared = (beta * beta * sxx / syy).clamp(0.0, 1.0);

  Ok(RegressionResult {
    alpha,
    beta,
    r_squared,
    n_obs: n,
  })
}

/// Regression settings shared by every fit of a session.
#[derive(ImplNew, Clone, Copy, Debug)]
pub struct RegressionEngine {
  /// Raw single-index or excess-return (CAPM) fitting.
  pub mode: RegressionMode,
  /// Annualized risk-free rate; only read in excess-return mode.
  pub risk_free_rate: f64,
}

impl RegressionEngine {
  /// Single-index model on raw returns.
  pub fn raw() -> Self {
    Self::new(RegressionMode::Raw, 0.0)
  }

  /// CAPM regression on returns net of `risk_free_rate / 252`.
  pub fn capm(risk_free_rate: f64) -> Self {
    Self::new(RegressionMode::ExcessReturn, risk_free_rate)
  }

  /// Fit on already aligned slices.
  pub fn fit(&self, y: &[f64], x: &[f64]) -> Result<RegressionResult> {
    match self.mode {
      RegressionMode::Raw => ols(y, x),
      RegressionMode::ExcessReturn => ols(
        &excess_returns(y, self.risk_free_rate),
        &excess_returns(x, self.risk_free_rate),
      ),
    }
  }

  /// Inner-join two dated series, then fit.
  pub fn fit_series(&self, y: &ReturnSeries, x: &ReturnSeries) -> Result<RegressionResult> {
    let (ys, xs) = align_pair(y, x);
    self.fit(&ys, &xs)
  }

  /// Regress every instrument of `matrix` except `reference` on the
  /// `reference` column. Failures are kept per instrument.
  pub fn fit_against(
    &self,
    matrix: &ReturnMatrix,
    reference: &str,
  ) -> Result<Vec<(String, Result<RegressionResult>)>> {
    let x = matrix.column(reference).ok_or_else(|| {
      AnalyticsError::InvalidInput(format!("unknown reference instrument {reference}"))
    })?;
    let x = x.to_vec();

    Ok(
      matrix
        .ids()
        .iter()
        .enumerate()
        .filter(|(_, id)| id.as_str() != reference)
        .map(|(i, id)| {
          let y = matrix.data().row(i).to_vec();
          let fit = self.fit(&y, &x);
          if let Err(e) = &fit {
            tracing::warn!(instrument = %id, error = %e, "regression failed");
          }
          (id.clone(), fit)
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;
  use tracing_test::traced_test;

  use super::*;

  const A: [f64; 4] = [0.01, -0.02, 0.015, 0.005];
  const B: [f64; 4] = [0.008, -0.01, 0.012, 0.003];

  #[test]
  fn regression_of_a_on_b_matches_reference_ols() {
    let fit = ols(&A, &B).unwrap();

    assert_abs_diff_eq!(fit.beta, 1.6105550500454957, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.alpha, -0.0027343039126478622, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.r_squared, 0.982993944338113, epsilon = 1e-12);
    assert_eq!(fit.n_obs, 4);
  }

  #[test]
  fn capm_mode_shifts_alpha_but_not_beta() {
    let raw = RegressionEngine::raw().fit(&A, &B).unwrap();
    let capm = RegressionEngine::capm(0.01).fit(&A, &B).unwrap();

    assert_abs_diff_eq!(capm.beta, raw.beta, epsilon = 1e-12);
    assert_abs_diff_eq!(capm.r_squared, raw.r_squared, epsilon = 1e-12);
    assert_abs_diff_eq!(capm.alpha, -0.0027100755376460567, epsilon = 1e-12);
  }

  #[test]
  fn self_regression_is_identity() {
    let fit = ols(&A, &A).unwrap();

    assert_abs_diff_eq!(fit.beta, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.alpha, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
  }

  #[test]
  fn constant_regressor_is_degenerate() {
    let err = ols(&A, &[0.1, 0.1, 0.1, 0.1]).unwrap_err();
    assert!(matches!(err, AnalyticsError::DegenerateInput(_)));
  }

  #[test]
  fn too_few_observations() {
    let err = ols(&[0.1], &[0.2]).unwrap_err();
    assert_eq!(err, AnalyticsError::InsufficientData { required: 2, got: 1 });
  }

  #[test]
  fn length_mismatch_is_misaligned() {
    let err = ols(&A, &B[..3]).unwrap_err();
    assert!(matches!(err, AnalyticsError::MisalignedSeries(_)));
  }

  #[test]
  fn fit_series_joins_on_date() {
    let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
    let y = ReturnSeries::new("AAA", vec![d(1), d(2), d(3), d(6), d(7)], vec![
      A[0], A[1], 0.5, A[2], A[3],
    ])
    .unwrap();
    let x = ReturnSeries::new("MKT", vec![d(1), d(2), d(6), d(7)], B.to_vec()).unwrap();

    let fit = RegressionEngine::raw().fit_series(&y, &x).unwrap();
    assert_eq!(fit.n_obs, 4);
    assert_abs_diff_eq!(fit.beta, 1.6105550500454957, epsilon = 1e-12);
  }

  #[test]
  fn fit_series_pairs_identical_dated_observations() {
    let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
    let dates = vec![d(1), d(2), d(3), d(4)];
    let y = ReturnSeries::new("AAA", dates.clone(), A.to_vec()).unwrap();
    let x = ReturnSeries::new("MKT", dates.clone(), A.to_vec()).unwrap();

    let fit = RegressionEngine::raw().fit_series(&y, &x).unwrap();
    assert_abs_diff_eq!(fit.beta, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.alpha, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-12);

    let mut reversed_dates = dates;
    reversed_dates.reverse();
    let mut reversed_values = A.to_vec();
    reversed_values.reverse();
    let err = ReturnSeries::new("MKT", reversed_dates, reversed_values).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
  }

  #[test]
  fn duplicate_dates_never_reach_a_fit() {
    let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
    let err = ReturnSeries::new("MKT", vec![d(1), d(1), d(2), d(3)], B.to_vec()).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
  }

  #[traced_test]
  #[test]
  fn fit_against_keeps_failures_per_instrument() {
    let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
    let dates = vec![d(1), d(2), d(3), d(6)];
    let matrix = ReturnMatrix::new(vec![
      ReturnSeries::new("AAA", dates.clone(), A.to_vec()).unwrap(),
      ReturnSeries::new("FLAT", dates.clone(), vec![0.0; 4]).unwrap(),
      ReturnSeries::new("MKT", dates, B.to_vec()).unwrap(),
    ])
    .unwrap();

    let fits = RegressionEngine::raw().fit_against(&matrix, "MKT").unwrap();
    assert_eq!(fits.len(), 2);
    assert_eq!(fits[0].0, "AAA");
    assert!(fits[0].1.is_ok());
    assert!(matches!(fits[1].1, Err(AnalyticsError::DegenerateInput(_))));
    assert!(logs_contain("regression failed"));
  }
}
