//! # Config
//!
//! Tunable knobs of an analysis session.

/// Trading days per year used to turn an annual risk-free rate into a daily
/// increment for excess-return regressions. Fixed, not configurable.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Default number of Monte Carlo portfolios drawn by the frontier search.
pub const DEFAULT_N_PORTFOLIOS: usize = 10_000;

/// How a single-index regression treats the risk-free rate.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum RegressionMode {
  /// Regress returns as given (single-index model).
  Raw,
  /// Subtract the daily risk-free increment from both sides (CAPM).
  #[default]
  ExcessReturn,
}

impl RegressionMode {
  /// Parse a mode name, falling back to [`RegressionMode::ExcessReturn`].
  pub fn from_str(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "raw" | "sim" | "single-index" => Self::Raw,
      _ => Self::ExcessReturn,
    }
  }
}

/// Runtime configuration for [`crate::quant::portfolio::AnalysisEngine`].
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
  /// Periods per year used to annualize means, variances and volatilities.
  pub trading_days_per_year: usize,
  /// Number of candidate portfolios drawn by the frontier search.
  pub n_portfolios: usize,
  /// Regression flavour used by [`crate::quant::portfolio::AnalysisEngine::regression_metrics`].
  pub regression_mode: RegressionMode,
  /// Seed for the frontier search; `None` draws from OS entropy.
  pub seed: Option<u64>,
  /// Score candidate portfolios on the rayon pool.
  pub parallel: bool,
  /// Keep every sampled portfolio (needed for frontier plots).
  pub keep_samples: bool,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      trading_days_per_year: TRADING_DAYS_PER_YEAR,
      n_portfolios: DEFAULT_N_PORTFOLIOS,
      regression_mode: RegressionMode::default(),
      seed: None,
      parallel: false,
      keep_samples: false,
    }
  }
}

impl AnalysisConfig {
  /// Annualization factor as a float.
  pub fn periods_per_year(&self) -> f64 {
    self.trading_days_per_year as f64
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_knobs() {
    let cfg = AnalysisConfig::default();
    assert_eq!(cfg.trading_days_per_year, 252);
    assert_eq!(cfg.n_portfolios, 10_000);
    assert_eq!(cfg.regression_mode, RegressionMode::ExcessReturn);
    assert!(cfg.seed.is_none());
  }

  #[test]
  fn regression_mode_parses_aliases() {
    assert_eq!(RegressionMode::from_str("RAW"), RegressionMode::Raw);
    assert_eq!(RegressionMode::from_str("sim"), RegressionMode::Raw);
    assert_eq!(RegressionMode::from_str("capm"), RegressionMode::ExcessReturn);
  }
}
