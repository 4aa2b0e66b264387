//! # Portfolio Sampler
//!
//! $$
//! w_i = \frac{u_i}{\sum_j u_j},\quad u_i \overset{iid}{\sim} \mathcal U[0,1)
//! $$
//!
//! Monte Carlo max-Sharpe search over long-only weights.
//!
//! Normalizing i.i.d. uniforms lands every draw on the simplex, but the
//! induced distribution is not uniform over it: mass concentrates towards
//! the barycentre and thins out near the vertices. Good enough for an
//! exploratory frontier, not an unbiased simplex sampler.

use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Uniform;
use rayon::prelude::*;

use super::types::PortfolioSample;
use super::types::PortfolioWeights;
use super::types::SamplingOutcome;
use crate::config::DEFAULT_N_PORTFOLIOS;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Score a weight vector against annualized means and covariance.
pub fn score(
  weights: PortfolioWeights,
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  risk_free: f64,
) -> Result<PortfolioSample> {
  let w = weights.as_array();
  let expected_return = w.dot(mu);
  let variance = w.dot(&cov.dot(w));
  let volatility = variance.sqrt();

  // NaN from a negative variance fails this check too.
  if !(volatility > 0.0) || !volatility.is_finite() {
    return Err(AnalyticsError::DegenerateInput(format!(
      "portfolio variance {variance} gives no positive volatility"
    )));
  }

  Ok(PortfolioSample {
    weights,
    expected_return,
    volatility,
    sharpe_ratio: (expected_return - risk_free) / volatility,
  })
}

/// Draw one weight vector: `k` uniforms normalized by their sum.
pub fn draw_weights<R: Rng + ?Sized>(k: usize, rng: &mut R) -> Result<PortfolioWeights> {
  PortfolioWeights::from_raw(Array1::random_using(k, Uniform::new(0.0, 1.0), rng))
}

fn validate(mu: &Array1<f64>, cov: &Array2<f64>, n_portfolios: usize) -> Result<()> {
  let k = mu.len();
  if k == 0 {
    return Err(AnalyticsError::InvalidInput(
      "need at least one instrument".to_string(),
    ));
  }
  if cov.dim() != (k, k) {
    return Err(AnalyticsError::InvalidInput(format!(
      "covariance is {:?}, expected ({k}, {k})",
      cov.dim()
    )));
  }
  if mu.iter().chain(cov.iter()).any(|v| !v.is_finite()) {
    return Err(AnalyticsError::InvalidInput(
      "means and covariance must be finite".to_string(),
    ));
  }
  if n_portfolios == 0 {
    return Err(AnalyticsError::InvalidInput(
      "sample count must be positive".to_string(),
    ));
  }
  Ok(())
}

/// First candidate with the strictly largest Sharpe ratio.
fn argmax(samples: &[PortfolioSample]) -> usize {
  let mut best = 0;
  for (i, s) in samples.iter().enumerate().skip(1) {
    if s.sharpe_ratio > samples[best].sharpe_ratio {
      best = i;
    }
  }
  best
}

/// Random-sampling frontier search.
#[derive(ImplNew, Clone, Copy, Debug)]
pub struct PortfolioSampler {
  /// Number of candidate portfolios.
  pub n_portfolios: usize,
  /// Annualized risk-free rate used in the Sharpe ratio.
  pub risk_free: f64,
  /// Return every candidate alongside the best one.
  pub keep_samples: bool,
  /// Score candidates on the rayon pool.
  pub parallel: bool,
}

impl Default for PortfolioSampler {
  fn default() -> Self {
    Self::new(DEFAULT_N_PORTFOLIOS, 0.0, false, false)
  }
}

impl PortfolioSampler {
  /// Run the search with a caller-supplied generator.
  ///
  /// Weights are always drawn sequentially from `rng`, so the parallel and
  /// sequential paths see the same candidates and pick the same best sample.
  pub fn sample_with_rng<R: Rng + ?Sized>(
    &self,
    mu: &Array1<f64>,
    cov: &Array2<f64>,
    rng: &mut R,
  ) -> Result<SamplingOutcome> {
    validate(mu, cov, self.n_portfolios)?;
    let k = mu.len();

    tracing::debug!(
      n_portfolios = self.n_portfolios,
      n_assets = k,
      parallel = self.parallel,
      "sampling portfolios"
    );

    let draws = (0..self.n_portfolios)
      .map(|_| draw_weights(k, &mut *rng))
      .collect::<Result<Vec<_>>>()?;

    let samples = if self.parallel {
      draws
        .into_par_iter()
        .map(|w| score(w, mu, cov, self.risk_free))
        .collect::<Result<Vec<_>>>()?
    } else {
      draws
        .into_iter()
        .map(|w| score(w, mu, cov, self.risk_free))
        .collect::<Result<Vec<_>>>()?
    };

    let best = samples[argmax(&samples)].clone();
    tracing::info!(
      sharpe = best.sharpe_ratio,
      expected_return = best.expected_return,
      volatility = best.volatility,
      "max-Sharpe portfolio found"
    );

    Ok(SamplingOutcome {
      best,
      samples: self.keep_samples.then_some(samples),
    })
  }

  /// Run the search with a seeded generator, or OS entropy when `seed` is `None`.
  pub fn sample(
    &self,
    mu: &Array1<f64>,
    cov: &Array2<f64>,
    seed: Option<u64>,
  ) -> Result<SamplingOutcome> {
    let mut rng = match seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };
    self.sample_with_rng(mu, cov, &mut rng)
  }
}
