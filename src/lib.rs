//! # frontier-rs
//!
//! $$
//! r_t = \ln\frac{P_t}{P_{t-1}},\qquad
//! S = \frac{\mathbb{E}[R_p] - r_f}{\sigma_p}
//! $$
//!
//! Portfolio analytics over daily closing prices: log returns, single-index
//! and CAPM regressions, covariance and correlation, Capital Allocation Lines
//! and a Monte Carlo max-Sharpe search.

#[macro_use]
extern crate prettytable;

pub mod config;
pub mod data;
pub mod error;
pub mod quant;
pub mod report;
pub mod visualization;

pub use config::AnalysisConfig;
pub use config::RegressionMode;
pub use data::MarketData;
pub use data::PriceSeries;
pub use data::PriceSource;
pub use error::AnalyticsError;
pub use error::Result;
pub use quant::portfolio::AnalysisEngine;
pub use report::AnalysisReport;
