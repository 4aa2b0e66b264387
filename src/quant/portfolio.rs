//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Max-Sharpe frontier search and the analysis session that feeds it.

pub mod engine;
pub mod sampler;
pub mod types;

pub use engine::AnalysisEngine;
pub use engine::MarketComparison;
pub use engine::PerInstrument;
pub use sampler::draw_weights;
pub use sampler::score;
pub use sampler::PortfolioSampler;
pub use types::PortfolioSample;
pub use types::PortfolioWeights;
pub use types::SamplingOutcome;
