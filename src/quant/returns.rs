//! # Returns
//!
//! $$
//! r_t = \ln P_t - \ln P_{t-1}
//! $$
//!
//! Log-return construction and the crate-wide alignment policy: every
//! multi-series statistic works on the inner join of the inputs' date indexes.

use std::collections::BTreeSet;
use std::collections::HashSet;

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;

use crate::data::PriceSeries;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Convert close prices to a log-return series of length `n - 1`.
pub fn log_returns_series(closes: &[f64]) -> Result<Vec<f64>> {
  if closes.len() < 2 {
    return Err(AnalyticsError::InvalidInput(format!(
      "need at least 2 prices to form a return, got {}",
      closes.len()
    )));
  }

  if let Some(p) = closes.iter().find(|p| !p.is_finite() || **p <= 0.0) {
    return Err(AnalyticsError::InvalidInput(format!(
      "price {p} is not positive"
    )));
  }

  Ok(closes.windows(2).map(|w| w[1].ln() - w[0].ln()).collect())
}

/// Total simple return over a window of log returns, `exp(sum r) - 1`.
pub fn total_return(returns: &[f64]) -> f64 {
  returns.iter().sum::<f64>().exp() - 1.0
}

/// Dates present in every index.
pub fn common_dates<'a, I>(indexes: I) -> BTreeSet<NaiveDate>
where
  I: IntoIterator<Item = &'a [NaiveDate]>,
{
  let mut iter = indexes.into_iter();
  let Some(first) = iter.next() else {
    return BTreeSet::new();
  };

  let mut common: BTreeSet<NaiveDate> = first.iter().copied().collect();
  for dates in iter {
    let other: HashSet<&NaiveDate> = dates.iter().collect();
    common.retain(|d| other.contains(d));
  }
  common
}

/// Dated log returns of one instrument. Each return carries the date of the
/// later price of its pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnSeries {
  id: String,
  dates: Vec<NaiveDate>,
  values: Vec<f64>,
}

impl ReturnSeries {
  /// Build a dated series. Dates must be strictly increasing, so every date
  /// appears once and pairing by position is pairing by date.
  pub fn new(id: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
    let id = id.into();
    if dates.len() != values.len() {
      return Err(AnalyticsError::InvalidInput(format!(
        "{id}: {} dates but {} returns",
        dates.len(),
        values.len()
      )));
    }
    if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
      return Err(AnalyticsError::InvalidInput(format!(
        "{id}: return dates not strictly increasing at {}",
        w[1]
      )));
    }
    Ok(Self { id, dates, values })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn values(&self) -> &[f64] {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// `exp(sum r) - 1` over the whole series.
  pub fn total_return(&self) -> f64 {
    total_return(&self.values)
  }

  fn restrict_to(&self, keep: &BTreeSet<NaiveDate>) -> Self {
    let (dates, values) = self
      .dates
      .iter()
      .zip(self.values.iter())
      .filter(|(d, _)| keep.contains(d))
      .map(|(d, v)| (*d, *v))
      .unzip();

    Self {
      id: self.id.clone(),
      dates,
      values,
    }
  }
}

/// Log returns of a price series.
pub fn log_returns(prices: &PriceSeries) -> Result<ReturnSeries> {
  let values = log_returns_series(prices.prices()).map_err(|e| match e {
    AnalyticsError::InvalidInput(msg) => {
      AnalyticsError::InvalidInput(format!("{}: {msg}", prices.id()))
    }
    other => other,
  })?;
  let dates = prices.dates()[1..].to_vec();
  ReturnSeries::new(prices.id(), dates, values)
}

/// Inner-join two return series on date, returning the paired values.
pub fn align_pair(a: &ReturnSeries, b: &ReturnSeries) -> (Vec<f64>, Vec<f64>) {
  let keep = common_dates([a.dates(), b.dates()]);
  (
    a.restrict_to(&keep).values,
    b.restrict_to(&keep).values,
  )
}

/// Return series of several instruments on one shared date index.
///
/// Stored instrument-major: row `i` of [`ReturnMatrix::data`] is instrument
/// `i`, column `t` is observation `t`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnMatrix {
  ids: Vec<String>,
  dates: Vec<NaiveDate>,
  data: Array2<f64>,
}

impl ReturnMatrix {
  /// Strict constructor: every column must already share the same dates.
  pub fn new(columns: Vec<ReturnSeries>) -> Result<Self> {
    let Some(first) = columns.first() else {
      return Err(AnalyticsError::InvalidInput(
        "return matrix needs at least one instrument".to_string(),
      ));
    };
    let dates = first.dates.clone();

    let mut seen = HashSet::new();
    for col in &columns {
      if !seen.insert(col.id.as_str()) {
        return Err(AnalyticsError::InvalidInput(format!(
          "duplicate instrument {}",
          col.id
        )));
      }
      if col.dates != dates {
        return Err(AnalyticsError::MisalignedSeries(format!(
          "{} does not share the date index of {}",
          col.id, first.id
        )));
      }
    }

    let n_obs = dates.len();
    let mut data = Array2::<f64>::zeros((columns.len(), n_obs));
    for (i, col) in columns.iter().enumerate() {
      data.row_mut(i).assign(&ArrayView1::from(col.values.as_slice()));
    }

    Ok(Self {
      ids: columns.into_iter().map(|c| c.id).collect(),
      dates,
      data,
    })
  }

  /// Inner-join the columns on date, then build the matrix.
  pub fn aligned(columns: Vec<ReturnSeries>) -> Result<Self> {
    let keep = common_dates(columns.iter().map(|c| c.dates()));
    Self::new(columns.iter().map(|c| c.restrict_to(&keep)).collect())
  }

  /// Inner-join price series on date, then convert each to log returns.
  pub fn from_prices(prices: &[PriceSeries]) -> Result<Self> {
    let keep = common_dates(prices.iter().map(|p| p.dates()));
    if keep.len() < 2 {
      return Err(AnalyticsError::InsufficientData {
        required: 2,
        got: keep.len(),
      });
    }

    let dropped = prices.iter().map(|p| p.len() - keep.len()).max().unwrap_or(0);
    if dropped > 0 {
      tracing::debug!(
        common = keep.len(),
        dropped,
        "inner-joined price series on date"
      );
    }

    let columns = prices
      .iter()
      .map(|p| log_returns(&p.restrict_to(&keep)))
      .collect::<Result<Vec<_>>>()?;
    Self::new(columns)
  }

  pub fn ids(&self) -> &[String] {
    &self.ids
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// Instrument-major return data.
  pub fn data(&self) -> &Array2<f64> {
    &self.data
  }

  pub fn n_assets(&self) -> usize {
    self.ids.len()
  }

  pub fn n_obs(&self) -> usize {
    self.dates.len()
  }

  pub fn index_of(&self, id: &str) -> Option<usize> {
    self.ids.iter().position(|i| i == id)
  }

  pub fn column(&self, id: &str) -> Option<ArrayView1<'_, f64>> {
    self.index_of(id).map(|i| self.data.row(i))
  }

  /// Owned [`ReturnSeries`] for instrument `i`, if there is one.
  pub fn series(&self, i: usize) -> Option<ReturnSeries> {
    let id = self.ids.get(i)?;
    Some(ReturnSeries {
      id: id.clone(),
      dates: self.dates.clone(),
      values: self.data.row(i).to_vec(),
    })
  }

  /// Sub-matrix with the given instruments, in the given order.
  pub fn select(&self, ids: &[&str]) -> Result<Self> {
    let idx = ids
      .iter()
      .map(|id| {
        self
          .index_of(id)
          .ok_or_else(|| AnalyticsError::InvalidInput(format!("unknown instrument {id}")))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      ids: idx.iter().map(|&i| self.ids[i].clone()).collect(),
      dates: self.dates.clone(),
      data: self.data.select(Axis(0), &idx),
    })
  }

  /// Per-period mean return of every instrument.
  pub fn mean_returns(&self) -> Result<Array1<f64>> {
    self
      .data
      .mean_axis(Axis(1))
      .ok_or(AnalyticsError::InsufficientData {
        required: 1,
        got: 0,
      })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
  }

  fn prices(id: &str, days: &[u32], px: &[f64]) -> PriceSeries {
    PriceSeries::new(id, days.iter().map(|&x| d(x)).collect(), px.to_vec()).unwrap()
  }

  #[test]
  fn returns_are_one_shorter_and_round_trip() {
    let p = prices("AAA", &[1, 4, 5, 6, 7], &[100.0, 101.0, 99.5, 102.0, 103.7]);
    let r = log_returns(&p).unwrap();

    assert_eq!(r.len(), p.len() - 1);
    assert_eq!(r.dates()[0], d(4));
    assert_abs_diff_eq!(r.total_return(), p.simple_return().unwrap(), epsilon = 1e-9);
  }

  #[test]
  fn single_price_is_invalid() {
    let p = prices("AAA", &[1], &[100.0]);
    let err = log_returns(&p).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
  }

  #[test]
  fn non_positive_price_is_invalid() {
    let err = log_returns_series(&[1.0, -2.0, 3.0]).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
  }

  #[test]
  fn strict_matrix_rejects_misaligned_columns() {
    let a = log_returns(&prices("AAA", &[1, 2, 3], &[1.0, 1.1, 1.2])).unwrap();
    let b = log_returns(&prices("BBB", &[1, 2, 4], &[1.0, 1.1, 1.2])).unwrap();

    let err = ReturnMatrix::new(vec![a.clone(), b.clone()]).unwrap_err();
    assert!(matches!(err, AnalyticsError::MisalignedSeries(_)));

    let joined = ReturnMatrix::aligned(vec![a, b]).unwrap();
    assert_eq!(joined.dates(), &[d(2)]);
  }

  #[test]
  fn from_prices_inner_joins_before_differencing() {
    let a = prices("AAA", &[1, 2, 3, 4], &[100.0, 110.0, 121.0, 133.1]);
    let b = prices("BBB", &[1, 3, 4], &[50.0, 55.0, 60.5]);
    let m = ReturnMatrix::from_prices(&[a, b]).unwrap();

    assert_eq!(m.n_assets(), 2);
    assert_eq!(m.dates(), &[d(3), d(4)]);
    // AAA's return from the 1st to the 3rd spans the dropped day.
    assert_abs_diff_eq!(m.data()[[0, 0]], (121.0_f64 / 100.0).ln(), epsilon = 1e-12);
    assert_abs_diff_eq!(m.data()[[1, 1]], (60.5_f64 / 55.0).ln(), epsilon = 1e-12);
  }

  #[test]
  fn from_prices_needs_two_common_dates() {
    let a = prices("AAA", &[1, 2], &[1.0, 1.1]);
    let b = prices("BBB", &[2, 3], &[1.0, 1.1]);
    let err = ReturnMatrix::from_prices(&[a, b]).unwrap_err();
    assert_eq!(err, AnalyticsError::InsufficientData { required: 2, got: 1 });
  }

  #[test]
  fn duplicate_ids_are_rejected() {
    let a = log_returns(&prices("AAA", &[1, 2], &[1.0, 1.1])).unwrap();
    let err = ReturnMatrix::new(vec![a.clone(), a]).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
  }

  #[test]
  fn out_of_order_return_dates_are_rejected() {
    let err = ReturnSeries::new("AAA", vec![d(3), d(2), d(1)], vec![0.01, 0.02, 0.03]).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
  }

  #[test]
  fn repeated_return_dates_are_rejected() {
    let err = ReturnSeries::new("AAA", vec![d(1), d(2), d(2)], vec![0.01, 0.02, 0.03]).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
  }

  #[test]
  fn align_pair_matches_values_by_date() {
    let a = ReturnSeries::new("AAA", vec![d(1), d(2), d(3), d(5)], vec![0.1, 0.2, 0.3, 0.5]).unwrap();
    let b = ReturnSeries::new("BBB", vec![d(2), d(3), d(4), d(5)], vec![2.0, 3.0, 4.0, 5.0]).unwrap();
    let (x, y) = align_pair(&a, &b);

    assert_eq!(x, vec![0.2, 0.3, 0.5]);
    assert_eq!(y, vec![2.0, 3.0, 5.0]);
  }

  #[test]
  fn series_past_the_last_row_is_none() {
    let a = prices("AAA", &[1, 2, 3], &[1.0, 1.1, 1.2]);
    let m = ReturnMatrix::from_prices(&[a]).unwrap();

    assert_eq!(m.series(0).unwrap().id(), "AAA");
    assert!(m.series(1).is_none());
  }

  #[test]
  fn select_reorders_rows() {
    let a = prices("AAA", &[1, 2, 3], &[1.0, 1.1, 1.2]);
    let b = prices("BBB", &[1, 2, 3], &[2.0, 2.2, 2.1]);
    let m = ReturnMatrix::from_prices(&[a, b]).unwrap();
    let s = m.select(&["BBB", "AAA"]).unwrap();

    assert_eq!(s.ids(), &["BBB".to_string(), "AAA".to_string()]);
    assert_eq!(s.data().row(0), m.data().row(1));
  }
}
