//! # Data
//!
//! $$
//! \{(t_i, P_i)\}_{i=0}^{n-1},\quad t_0<t_1<\dots<t_{n-1},\ P_i>0
//! $$
//!
//! Price series and the data-source boundary. The core only reads what a
//! [`PriceSource`] hands it; gaps and holidays are the source's business.

use std::collections::BTreeSet;
use std::collections::HashMap;

use chrono::NaiveDate;
use impl_new_derive::ImplNew;

use crate::error::AnalyticsError;
use crate::error::Result;

/// Adjusted-close prices of one instrument, strictly increasing by date.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSeries {
  id: String,
  dates: Vec<NaiveDate>,
  prices: Vec<f64>,
}

impl PriceSeries {
  /// Build a validated series. Dates must be strictly increasing and prices
  /// finite and positive.
  pub fn new(id: impl Into<String>, dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self> {
    let id = id.into();

    if dates.len() != prices.len() {
      return Err(AnalyticsError::InvalidInput(format!(
        "{id}: {} dates but {} prices",
        dates.len(),
        prices.len()
      )));
    }

    if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
      return Err(AnalyticsError::InvalidInput(format!(
        "{id}: dates not strictly increasing at {}",
        w[1]
      )));
    }

    if let Some((i, p)) = prices
      .iter()
      .enumerate()
      .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
      return Err(AnalyticsError::InvalidInput(format!(
        "{id}: price {p} at {} is not positive",
        dates[i]
      )));
    }

    Ok(Self { id, dates, prices })
  }

  /// Build from `(date, price)` pairs.
  pub fn from_pairs(id: impl Into<String>, pairs: Vec<(NaiveDate, f64)>) -> Result<Self> {
    let (dates, prices) = pairs.into_iter().unzip();
    Self::new(id, dates, prices)
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn prices(&self) -> &[f64] {
    &self.prices
  }

  pub fn len(&self) -> usize {
    self.prices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.prices.is_empty()
  }

  /// Total simple return `P_last / P_first - 1`.
  pub fn simple_return(&self) -> Result<f64> {
    match (self.prices.first(), self.prices.last()) {
      (Some(first), Some(last)) if self.prices.len() >= 2 => Ok(last / first - 1.0),
      _ => Err(AnalyticsError::InsufficientData {
        required: 2,
        got: self.prices.len(),
      }),
    }
  }

  /// Restrict to the inclusive date window `[start, end]`.
  pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
    let (dates, prices) = self
      .dates
      .iter()
      .zip(self.prices.iter())
      .filter(|(d, _)| **d >= start && **d <= end)
      .map(|(d, p)| (*d, *p))
      .unzip();

    Self {
      id: self.id.clone(),
      dates,
      prices,
    }
  }

  /// Keep only the observations whose date is in `keep`.
  pub(crate) fn restrict_to(&self, keep: &BTreeSet<NaiveDate>) -> Self {
    let (dates, prices) = self
      .dates
      .iter()
      .zip(self.prices.iter())
      .filter(|(d, _)| keep.contains(d))
      .map(|(d, p)| (*d, *p))
      .unzip();

    Self {
      id: self.id.clone(),
      dates,
      prices,
    }
  }
}

/// Everything an analysis session consumes from the data source.
#[derive(ImplNew, Clone, Debug)]
pub struct MarketData {
  /// Instruments under analysis, in display order.
  pub assets: Vec<PriceSeries>,
  /// Market-index proxy used as the regression reference.
  pub market: PriceSeries,
  /// Annualized risk-free rate for the window, as a decimal.
  pub risk_free_rate: f64,
}

/// Data-source abstraction: tickers and a date range in, aligned prices out.
pub trait PriceSource {
  fn fetch(
    &self,
    tickers: &[&str],
    market: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<MarketData>;
}

/// Where an [`InMemoryPriceSource`] takes its risk-free rate from.
#[derive(Clone, Debug)]
pub enum RiskFreeSource {
  /// Fixed annualized rate as a decimal.
  Constant(f64),
  /// Quoted bill yields in percent (e.g. 5.2 for 5.2%), averaged over the window.
  Yields(Vec<(NaiveDate, f64)>),
}

/// A [`PriceSource`] backed by series already held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryPriceSource {
  series: HashMap<String, PriceSeries>,
  risk_free: RiskFreeSource,
}

impl InMemoryPriceSource {
  pub fn new(risk_free: RiskFreeSource) -> Self {
    Self {
      series: HashMap::new(),
      risk_free,
    }
  }

  /// Register a series under its own identifier, replacing any previous one.
  pub fn insert(&mut self, series: PriceSeries) {
    self.series.insert(series.id().to_string(), series);
  }

  fn lookup(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
    self
      .series
      .get(ticker)
      .map(|s| s.window(start, end))
      .ok_or_else(|| AnalyticsError::InvalidInput(format!("unknown ticker {ticker}")))
  }

  fn risk_free_rate(&self, start: NaiveDate, end: NaiveDate) -> Result<f64> {
    match &self.risk_free {
      RiskFreeSource::Constant(rate) => Ok(*rate),
      RiskFreeSource::Yields(quotes) => {
        let in_window: Vec<f64> = quotes
          .iter()
          .filter(|(d, _)| *d >= start && *d <= end)
          .map(|(_, y)| *y)
          .collect();
        if in_window.is_empty() {
          return Err(AnalyticsError::InsufficientData {
            required: 1,
            got: 0,
          });
        }
        Ok(in_window.iter().sum::<f64>() / in_window.len() as f64 / 100.0)
      }
    }
  }
}

impl PriceSource for InMemoryPriceSource {
  fn fetch(
    &self,
    tickers: &[&str],
    market: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<MarketData> {
    let assets = tickers
      .iter()
      .map(|t| self.lookup(t, start, end))
      .collect::<Result<Vec<_>>>()?;
    let market = self.lookup(market, start, end)?;
    let risk_free_rate = self.risk_free_rate(start, end)?;

    tracing::debug!(
      n_assets = assets.len(),
      market = market.id(),
      risk_free_rate,
      "fetched in-memory market data"
    );

    Ok(MarketData::new(assets, market, risk_free_rate))
  }
}
