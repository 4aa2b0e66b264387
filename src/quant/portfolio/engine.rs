//! # Analysis Engine
//!
//! $$
//! P \;\to\; r \;\to\; \{(\alpha,\beta,R^2),\ \Sigma\} \;\to\; \mathbf{w}^\*
//! $$
//!
//! One analysis session: immutable market data plus configuration, with the
//! return matrix derived once and reused by every statistic.

use std::sync::OnceLock;

use ndarray::Array1;
use ndarray::Array2;
use rand::Rng;

use super::sampler::PortfolioSampler;
use super::types::SamplingOutcome;
use crate::config::AnalysisConfig;
use crate::config::RegressionMode;
use crate::data::MarketData;
use crate::data::PriceSeries;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::quant::allocation::CapitalAllocationLine;
use crate::quant::covariance::sample_covariance;
use crate::quant::covariance::CorrelationMatrix;
use crate::quant::covariance::CovarianceMatrix;
use crate::quant::regression::RegressionEngine;
use crate::quant::regression::RegressionResult;
use crate::quant::returns::ReturnMatrix;
use crate::quant::returns::ReturnSeries;
use crate::quant::summary::SummaryStatistics;

/// Per-instrument outcome; one failing instrument does not sink the others.
pub type PerInstrument<T> = Vec<(String, Result<T>)>;

/// Total return of one instrument next to the market over the same window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarketComparison {
  pub instrument_return: f64,
  pub market_return: f64,
}

/// Single entry point for an analysis session.
#[derive(Debug)]
pub struct AnalysisEngine {
  data: MarketData,
  config: AnalysisConfig,
  returns: OnceLock<ReturnMatrix>,
}

impl AnalysisEngine {
  pub fn new(data: MarketData, config: AnalysisConfig) -> Self {
    Self {
      data,
      config,
      returns: OnceLock::new(),
    }
  }

  pub fn config(&self) -> &AnalysisConfig {
    &self.config
  }

  pub fn data(&self) -> &MarketData {
    &self.data
  }

  pub fn risk_free_rate(&self) -> f64 {
    self.data.risk_free_rate
  }

  pub fn tickers(&self) -> Vec<&str> {
    self.data.assets.iter().map(PriceSeries::id).collect()
  }

  /// Log returns of every asset and the market on the inner-joined date
  /// index. Computed on first use, then reused.
  pub fn returns(&self) -> Result<&ReturnMatrix> {
    if let Some(m) = self.returns.get() {
      return Ok(m);
    }

    let market = self.data.market.id();
    if let Some(clash) = self.data.assets.iter().find(|a| a.id() == market) {
      return Err(AnalyticsError::InvalidInput(format!(
        "{} is listed both as an asset and as the market index",
        clash.id()
      )));
    }

    let mut all = self.data.assets.clone();
    all.push(self.data.market.clone());
    let matrix = ReturnMatrix::from_prices(&all)?;
    tracing::info!(
      n_assets = self.data.assets.len(),
      n_obs = matrix.n_obs(),
      "derived return matrix"
    );

    Ok(self.returns.get_or_init(|| matrix))
  }

  /// Asset columns only, in ticker order.
  pub fn asset_returns(&self) -> Result<ReturnMatrix> {
    self.returns()?.select(&self.tickers())
  }

  pub fn market_returns(&self) -> Result<ReturnSeries> {
    let matrix = self.returns()?;
    matrix
      .index_of(self.data.market.id())
      .and_then(|i| matrix.series(i))
      .ok_or_else(|| AnalyticsError::InvalidInput("market column missing".to_string()))
  }

  /// Alpha, beta and R² of every asset against the market.
  pub fn regression_metrics(&self, mode: RegressionMode) -> Result<PerInstrument<RegressionResult>> {
    let engine = RegressionEngine::new(mode, self.data.risk_free_rate);
    engine.fit_against(self.returns()?, self.data.market.id())
  }

  /// Single-index model on raw returns.
  pub fn single_index_metrics(&self) -> Result<PerInstrument<RegressionResult>> {
    self.regression_metrics(RegressionMode::Raw)
  }

  /// CAPM regression on excess returns.
  pub fn capm_metrics(&self) -> Result<PerInstrument<RegressionResult>> {
    self.regression_metrics(RegressionMode::ExcessReturn)
  }

  /// Regression in the configured mode.
  pub fn configured_metrics(&self) -> Result<PerInstrument<RegressionResult>> {
    self.regression_metrics(self.config.regression_mode)
  }

  /// Daily sample covariance of the assets.
  pub fn covariance(&self) -> Result<CovarianceMatrix> {
    sample_covariance(&self.asset_returns()?)
  }

  /// Daily correlation of the assets.
  pub fn correlation(&self) -> Result<CorrelationMatrix> {
    self.covariance()?.to_correlation()
  }

  pub fn summary_statistics(&self) -> Result<PerInstrument<SummaryStatistics>> {
    let assets = self.asset_returns()?;
    Ok(
      (0..assets.n_assets())
        .filter_map(|i| assets.series(i))
        .map(|s| (s.id().to_string(), SummaryStatistics::from_returns(s.values())))
        .collect(),
    )
  }

  /// Capital Allocation Line of each asset on its own.
  pub fn capital_allocation_lines(&self) -> Result<PerInstrument<CapitalAllocationLine>> {
    let assets = self.asset_returns()?;
    let periods = self.config.periods_per_year();
    Ok(
      (0..assets.n_assets())
        .filter_map(|i| assets.series(i))
        .map(|s| {
          let cal = CapitalAllocationLine::from_returns(
            s.id(),
            s.values(),
            self.data.risk_free_rate,
            periods,
          );
          (s.id().to_string(), cal)
        })
        .collect(),
    )
  }

  /// Total return of `ticker` and of the market over the session window.
  pub fn compare_to_market(&self, ticker: &str) -> Result<MarketComparison> {
    let matrix = self.returns()?;
    let asset = matrix
      .index_of(ticker)
      .filter(|_| ticker != self.data.market.id())
      .and_then(|i| matrix.series(i))
      .ok_or_else(|| AnalyticsError::InvalidInput(format!("unknown ticker {ticker}")))?;

    Ok(MarketComparison {
      instrument_return: asset.total_return(),
      market_return: self.market_returns()?.total_return(),
    })
  }

  /// Annualized mean-return vector and covariance matrix of the assets.
  pub fn annualized_inputs(&self) -> Result<(Array1<f64>, Array2<f64>)> {
    let assets = self.asset_returns()?;
    let periods = self.config.periods_per_year();
    let mu = assets.mean_returns()? * periods;
    let cov = sample_covariance(&assets)?.annualize(periods);
    Ok((mu, cov.values().clone()))
  }

  fn sampler(&self) -> PortfolioSampler {
    PortfolioSampler::new(
      self.config.n_portfolios,
      self.data.risk_free_rate,
      self.config.keep_samples,
      self.config.parallel,
    )
  }

  /// Max-Sharpe search seeded from the configuration.
  pub fn efficient_frontier(&self) -> Result<SamplingOutcome> {
    let (mu, cov) = self.annualized_inputs()?;
    self.sampler().sample(&mu, &cov, self.config.seed)
  }

  /// Max-Sharpe search with a caller-supplied generator.
  pub fn efficient_frontier_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SamplingOutcome> {
    let (mu, cov) = self.annualized_inputs()?;
    self.sampler().sample_with_rng(&mu, &cov, rng)
  }
}
