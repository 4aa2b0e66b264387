//! # Report
//!
//! Collects every statistic of a session into plain values and renders them
//! as text tables. Per-instrument failures are kept and shown, not fatal.

use std::fmt::Display;

use prettytable::format;
use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;

use crate::error::Result;
use crate::quant::allocation::CapitalAllocationLine;
use crate::quant::covariance::CorrelationMatrix;
use crate::quant::covariance::CovarianceMatrix;
use crate::quant::portfolio::AnalysisEngine;
use crate::quant::portfolio::PerInstrument;
use crate::quant::portfolio::SamplingOutcome;
use crate::quant::regression::RegressionResult;
use crate::quant::summary::SummaryStatistics;

/// Everything the display layer needs from one session.
#[derive(Debug)]
pub struct AnalysisReport {
  pub tickers: Vec<String>,
  pub risk_free_rate: f64,
  pub summary: PerInstrument<SummaryStatistics>,
  pub single_index: PerInstrument<RegressionResult>,
  pub capm: PerInstrument<RegressionResult>,
  pub allocation_lines: PerInstrument<CapitalAllocationLine>,
  pub covariance: Result<CovarianceMatrix>,
  pub correlation: Result<CorrelationMatrix>,
  pub frontier: Result<SamplingOutcome>,
}

impl AnalysisReport {
  /// Run every statistic of `engine`. Fails only if the return matrix
  /// itself cannot be built.
  pub fn build(engine: &AnalysisEngine) -> Result<Self> {
    engine.returns()?;

    let frontier = engine.efficient_frontier();
    if let Err(e) = &frontier {
      tracing::warn!(error = %e, "frontier search failed");
    }

    Ok(Self {
      tickers: engine.tickers().iter().map(|t| t.to_string()).collect(),
      risk_free_rate: engine.risk_free_rate(),
      summary: engine.summary_statistics()?,
      single_index: engine.single_index_metrics()?,
      capm: engine.capm_metrics()?,
      allocation_lines: engine.capital_allocation_lines()?,
      covariance: engine.covariance(),
      correlation: engine.correlation(),
      frontier,
    })
  }

  pub fn render(&self) -> String {
    let mut out = String::new();
    out.push_str(&format!("Risk-free rate: {:.4}\n\n", self.risk_free_rate));

    out.push_str("Summary statistics (daily log returns)\n");
    out.push_str(&self.summary_table().to_string());

    out.push_str("\nSingle-index model\n");
    out.push_str(&regression_table(&self.single_index).to_string());

    out.push_str("\nCAPM (excess returns)\n");
    out.push_str(&regression_table(&self.capm).to_string());

    out.push_str("\nCapital allocation lines (annualized)\n");
    out.push_str(&self.cal_table().to_string());

    out.push_str("\nCorrelation matrix\n");
    match &self.correlation {
      Ok(c) => out.push_str(&matrix_table(c.ids(), |i, j| c.values()[[i, j]]).to_string()),
      Err(e) => out.push_str(&format!("{e}\n")),
    }

    out.push_str("\nCovariance matrix (daily)\n");
    match &self.covariance {
      Ok(c) => out.push_str(&matrix_table(c.ids(), |i, j| c.values()[[i, j]]).to_string()),
      Err(e) => out.push_str(&format!("{e}\n")),
    }

    out.push_str("\nMax-Sharpe portfolio\n");
    match &self.frontier {
      Ok(f) => out.push_str(&self.frontier_table(f).to_string()),
      Err(e) => out.push_str(&format!("{e}\n")),
    }

    out
  }

  fn summary_table(&self) -> Table {
    let mut table = new_table();
    table.set_titles(row![
      "Ticker", "Mean", "Std", "Min", "25%", "Median", "75%", "Max", "Skew", "Kurt", "Total"
    ]);
    for (id, s) in &self.summary {
      match s {
        Ok(s) => table.add_row(row![
          id,
          num(s.mean),
          num(s.std_dev),
          num(s.min),
          num(s.lower_quartile),
          num(s.median),
          num(s.upper_quartile),
          num(s.max),
          opt(s.skewness),
          opt(s.excess_kurtosis),
          num(s.total_return)
        ]),
        Err(e) => table.add_row(error_row(id, e, 10)),
      };
    }
    table
  }

  fn cal_table(&self) -> Table {
    let mut table = new_table();
    table.set_titles(row!["Ticker", "Return", "Volatility", "Sharpe"]);
    for (id, cal) in &self.allocation_lines {
      match cal {
        Ok(c) => table.add_row(row![
          id,
          num(c.expected_return),
          num(c.volatility),
          num(c.sharpe_ratio)
        ]),
        Err(e) => table.add_row(error_row(id, e, 3)),
      };
    }
    table
  }

  fn frontier_table(&self, outcome: &SamplingOutcome) -> Table {
    let best = &outcome.best;
    let mut table = new_table();
    table.set_titles(row!["", "Value"]);
    table.add_row(row!["Expected return", num(best.expected_return)]);
    table.add_row(row!["Volatility", num(best.volatility)]);
    table.add_row(row!["Sharpe ratio", num(best.sharpe_ratio)]);
    for (ticker, w) in self.tickers.iter().zip(best.weights.as_array().iter()) {
      table.add_row(row![format!("w[{ticker}]"), num(*w)]);
    }
    table
  }
}

fn new_table() -> Table {
  let mut table = Table::new();
  table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
  table
}

fn num(v: f64) -> String {
  format!("{v:.4}")
}

fn opt(v: Option<f64>) -> String {
  v.map(num).unwrap_or_else(|| "n/a".to_string())
}

fn error_row(id: &str, e: &impl Display, span: usize) -> Row {
  Row::new(vec![
    Cell::new(id),
    Cell::new(&e.to_string()).with_hspan(span),
  ])
}

fn regression_table(fits: &PerInstrument<RegressionResult>) -> Table {
  let mut table = new_table();
  table.set_titles(row!["Ticker", "Alpha", "Beta", "R2", "N"]);
  for (id, fit) in fits {
    match fit {
      Ok(f) => table.add_row(row![id, num(f.alpha), num(f.beta), num(f.r_squared), f.n_obs]),
      Err(e) => table.add_row(error_row(id, e, 4)),
    };
  }
  table
}

fn matrix_table(ids: &[String], value: impl Fn(usize, usize) -> f64) -> Table {
  let mut table = new_table();
  let mut titles = vec![Cell::new("")];
  titles.extend(ids.iter().map(|id| Cell::new(id)));
  table.set_titles(Row::new(titles));

  for (i, id) in ids.iter().enumerate() {
    let mut cells = vec![Cell::new(id)];
    cells.extend((0..ids.len()).map(|j| Cell::new(&num(value(i, j)))));
    table.add_row(Row::new(cells));
  }
  table
}
