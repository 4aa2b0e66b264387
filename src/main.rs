use std::env;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use frontier_rs::config::AnalysisConfig;
use frontier_rs::config::RegressionMode;
use frontier_rs::data::InMemoryPriceSource;
use frontier_rs::data::MarketData;
use frontier_rs::data::PriceSeries;
use frontier_rs::data::PriceSource;
use frontier_rs::data::RiskFreeSource;
use frontier_rs::quant::portfolio::AnalysisEngine;
use frontier_rs::report::AnalysisReport;
use frontier_rs::visualization::allocation_lines_plot;
use frontier_rs::visualization::frontier_plot;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: frontier <prices.csv> [output-dir]

CSV layout: date,<ticker>...,<market> with ISO dates; the last column is the
market index. Empty cells are treated as missing observations.

Environment:
  FRONTIER_RISK_FREE   annual risk-free rate as a decimal (default 0.0)
  FRONTIER_YIELDS      CSV of date,yield (percent) averaged over the price
                       window; overrides FRONTIER_RISK_FREE
  FRONTIER_PORTFOLIOS  number of sampled portfolios (default 10000)
  FRONTIER_SEED        seed for the frontier search
  FRONTIER_PARALLEL    score portfolios on all cores (1/true)
  FRONTIER_MODE        regression mode: raw | capm (default capm)";

fn main() -> Result<()> {
  let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frontier_rs=info"));
  tracing_subscriber::fmt().with_env_filter(env_filter).init();

  let mut args = env::args().skip(1);
  let Some(path) = args.next() else {
    eprintln!("{USAGE}");
    bail!("missing price file");
  };
  let output_dir = args.next();

  let config = config_from_env(output_dir.is_some())?;
  let data = load_market_data(&path, risk_free_from_env()?)?;
  tracing::info!(
    path = %path,
    n_assets = data.assets.len(),
    market = data.market.id(),
    "loaded prices"
  );

  let engine = AnalysisEngine::new(data, config);
  let report = AnalysisReport::build(&engine).context("analysis failed")?;
  println!("{}", report.render());

  for ticker in engine.tickers() {
    match engine.compare_to_market(ticker) {
      Ok(cmp) => println!(
        "{ticker}: total return {:.2}% vs market {:.2}%",
        cmp.instrument_return * 100.0,
        cmp.market_return * 100.0
      ),
      Err(e) => tracing::warn!(ticker, error = %e, "market comparison failed"),
    }
  }

  if let Some(dir) = output_dir {
    if let Ok(outcome) = &report.frontier {
      let file = format!("{dir}/frontier.html");
      frontier_plot(outcome).write_html(&file);
      tracing::info!(file = %file, "wrote frontier chart");
    }

    let lines: Vec<_> = report
      .allocation_lines
      .iter()
      .filter_map(|(_, cal)| cal.as_ref().ok().cloned())
      .collect();
    let file = format!("{dir}/allocation_lines.html");
    allocation_lines_plot(&lines).write_html(&file);
    tracing::info!(file = %file, "wrote allocation line chart");
  }

  Ok(())
}

fn env_var<T>(name: &str) -> Result<Option<T>>
where
  T: std::str::FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match env::var(name) {
    Ok(v) => Ok(Some(
      v.trim()
        .parse()
        .with_context(|| format!("{name}={v} is not valid"))?,
    )),
    Err(_) => Ok(None),
  }
}

fn config_from_env(keep_samples: bool) -> Result<AnalysisConfig> {
  let mut config = AnalysisConfig {
    keep_samples,
    ..AnalysisConfig::default()
  };

  if let Some(n) = env_var("FRONTIER_PORTFOLIOS")? {
    config.n_portfolios = n;
  }
  config.seed = env_var("FRONTIER_SEED")?;
  if let Ok(v) = env::var("FRONTIER_PARALLEL") {
    config.parallel = matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes");
  }
  if let Ok(v) = env::var("FRONTIER_MODE") {
    config.regression_mode = parse_mode(&v)?;
  }

  Ok(config)
}

fn parse_mode(value: &str) -> Result<RegressionMode> {
  let mode = value.trim().to_lowercase();
  match mode.as_str() {
    "raw" | "sim" | "single-index" | "capm" | "excess" | "excess-return" => {
      Ok(RegressionMode::from_str(&mode))
    }
    _ => bail!("FRONTIER_MODE={value} is not valid, expected raw or capm"),
  }
}

fn risk_free_from_env() -> Result<RiskFreeSource> {
  let rate = env_var::<f64>("FRONTIER_RISK_FREE")?;
  match env::var("FRONTIER_YIELDS") {
    Ok(path) => {
      if rate.is_some() {
        tracing::warn!("FRONTIER_YIELDS is set, ignoring FRONTIER_RISK_FREE");
      }
      Ok(RiskFreeSource::Yields(read_yields(&path)?))
    }
    Err(_) => Ok(RiskFreeSource::Constant(rate.unwrap_or(0.0))),
  }
}

fn read_yields(filename: &str) -> Result<Vec<(NaiveDate, f64)>> {
  let file = File::open(filename).with_context(|| format!("cannot open {filename}"))?;
  let mut quotes = Vec::new();

  for (n, line) in BufReader::new(file).lines().enumerate().skip(1) {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }
    let (date, quote) = line
      .split_once(',')
      .with_context(|| format!("{filename}:{}: expected date,yield", n + 1))?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
      .with_context(|| format!("{filename}:{}: bad date {date:?}", n + 1))?;
    let quote: f64 = quote
      .trim()
      .parse()
      .with_context(|| format!("{filename}:{}: bad yield {quote:?}", n + 1))?;
    quotes.push((date, quote));
  }

  Ok(quotes)
}

/// Load the price file into an in-memory source and fetch the whole window
/// from it; the last column is the market.
fn load_market_data(filename: &str, risk_free: RiskFreeSource) -> Result<MarketData> {
  let series = read_price_series(filename)?;
  let (start, end) = series
    .iter()
    .flat_map(|s| s.dates().iter().copied())
    .fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
      Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
      None => Some((d, d)),
    })
    .with_context(|| format!("{filename} has no price rows"))?;

  let ids: Vec<String> = series.iter().map(|s| s.id().to_string()).collect();
  let Some((market, tickers)) = ids.split_last() else {
    bail!("{filename}: no market column");
  };
  let tickers: Vec<&str> = tickers.iter().map(String::as_str).collect();

  let mut source = InMemoryPriceSource::new(risk_free);
  for s in series {
    source.insert(s);
  }
  Ok(source.fetch(&tickers, market, start, end)?)
}

fn read_price_series(filename: &str) -> Result<Vec<PriceSeries>> {
  let file = File::open(filename).with_context(|| format!("cannot open {filename}"))?;
  let mut lines = BufReader::new(file).lines();

  let header = match lines.next() {
    Some(line) => line?,
    None => bail!("{filename} is empty"),
  };
  let ids: Vec<String> = header
    .split(',')
    .skip(1)
    .map(|s| s.trim().to_string())
    .collect();
  if ids.len() < 2 {
    bail!("{filename}: need at least one ticker and a market column");
  }

  let mut columns: Vec<Vec<(NaiveDate, f64)>> = vec![Vec::new(); ids.len()];
  for (n, line) in lines.enumerate() {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }
    let mut cells = line.split(',');
    let date_cell = cells.next().unwrap_or_default().trim();
    let date = NaiveDate::parse_from_str(date_cell, "%Y-%m-%d")
      .with_context(|| format!("{filename}:{}: bad date {date_cell:?}", n + 2))?;

    for (column, cell) in columns.iter_mut().zip(cells) {
      let cell = cell.trim();
      if cell.is_empty() {
        continue;
      }
      let price: f64 = cell
        .parse()
        .with_context(|| format!("{filename}:{}: bad price {cell:?}", n + 2))?;
      column.push((date, price));
    }
  }

  Ok(
    ids
      .into_iter()
      .zip(columns)
      .map(|(id, pairs)| PriceSeries::from_pairs(id, pairs))
      .collect::<frontier_rs::Result<Vec<_>>>()?,
  )
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  fn csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
  }

  #[test]
  fn last_column_is_the_market() {
    let file = csv(
      "date,AAA,BBB,MKT\n\
       2024-01-02,10.0,20.0,100.0\n\
       2024-01-03,10.5,,101.0\n\
       2024-01-04,10.2,20.4,100.5\n",
    );
    let data =
      load_market_data(file.path().to_str().unwrap(), RiskFreeSource::Constant(0.03)).unwrap();

    assert_eq!(data.market.id(), "MKT");
    assert_eq!(data.assets.len(), 2);
    assert_eq!(data.assets[0].len(), 3);
    assert_eq!(data.assets[1].len(), 2);
    assert_eq!(data.risk_free_rate, 0.03);
  }

  #[test]
  fn bad_price_cell_is_reported() {
    let file = csv("date,AAA,MKT\n2024-01-02,abc,100.0\n");
    let err = read_price_series(file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("bad price"));
  }

  #[test]
  fn single_column_is_rejected() {
    let file = csv("date,MKT\n2024-01-02,100.0\n");
    assert!(read_price_series(file.path().to_str().unwrap()).is_err());
  }

  #[test]
  fn bill_yields_are_averaged_over_the_price_window() {
    let prices = csv(
      "date,AAA,MKT\n\
       2024-01-02,10.0,100.0\n\
       2024-01-03,10.5,101.0\n\
       2024-01-04,10.2,100.5\n",
    );
    let yields = csv(
      "date,yield\n\
       2023-12-29,9.0\n\
       2024-01-02,5.0\n\
       2024-01-04,5.4\n\
       2024-01-08,1.0\n",
    );
    let quotes = read_yields(yields.path().to_str().unwrap()).unwrap();
    assert_eq!(quotes.len(), 4);

    let data = load_market_data(
      prices.path().to_str().unwrap(),
      RiskFreeSource::Yields(quotes),
    )
    .unwrap();
    assert!((data.risk_free_rate - 0.052).abs() < 1e-12);
    assert_eq!(data.assets[0].id(), "AAA");
  }

  #[test]
  fn unknown_regression_mode_is_rejected() {
    assert_eq!(parse_mode("RAW").unwrap(), RegressionMode::Raw);
    assert_eq!(parse_mode(" capm ").unwrap(), RegressionMode::ExcessReturn);
    assert!(parse_mode("rwa").is_err());
  }
}
