//! # Quant
//!
//! $$
//! P \to r \to (\alpha,\beta,R^2),\ \Sigma \to \mathbf{w}^\*
//! $$
//!
//! Numerical core: returns, regression, covariance, allocation lines and the
//! frontier search.

pub mod allocation;
pub mod covariance;
pub mod portfolio;
pub mod regression;
pub mod returns;
pub mod summary;

pub use allocation::CapitalAllocationLine;
pub use covariance::correlation;
pub use covariance::sample_covariance;
pub use covariance::CorrelationMatrix;
pub use covariance::CovarianceMatrix;
pub use regression::ols;
pub use regression::RegressionEngine;
pub use regression::RegressionResult;
pub use returns::log_returns;
pub use returns::log_returns_series;
pub use returns::ReturnMatrix;
pub use returns::ReturnSeries;
pub use summary::SummaryStatistics;
