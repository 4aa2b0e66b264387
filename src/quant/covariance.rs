//! # Covariance
//!
//! $$
//! \Sigma_{ij}=\frac{1}{n-1}\sum_t (r_{i,t}-\bar r_i)(r_{j,t}-\bar r_j),\qquad
//! \rho_{ij}=\frac{\Sigma_{ij}}{\sigma_i\sigma_j}
//! $$
//!
//! Sample covariance and correlation over a [`ReturnMatrix`]. Figures are
//! per period; annualization is a separate, explicit step.

use ndarray::Array1;
use ndarray::Array2;
use ndarray_stats::CorrelationExt;

use super::returns::ReturnMatrix;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Sample covariance matrix (divisor `n - 1`) indexed by instrument.
#[derive(Clone, Debug, PartialEq)]
pub struct CovarianceMatrix {
  ids: Vec<String>,
  values: Array2<f64>,
}

/// Pearson correlation matrix indexed by instrument. Diagonal is exactly 1.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix {
  ids: Vec<String>,
  values: Array2<f64>,
}

fn lookup(ids: &[String], values: &Array2<f64>, a: &str, b: &str) -> Option<f64> {
  let i = ids.iter().position(|id| id == a)?;
  let j = ids.iter().position(|id| id == b)?;
  Some(values[[i, j]])
}

impl CovarianceMatrix {
  pub fn ids(&self) -> &[String] {
    &self.ids
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  /// Entry for an instrument pair.
  pub fn get(&self, a: &str, b: &str) -> Option<f64> {
    lookup(&self.ids, &self.values, a, b)
  }

  /// Per-instrument standard deviations.
  pub fn std_devs(&self) -> Array1<f64> {
    self.values.diag().mapv(|v| v.max(0.0).sqrt())
  }

  /// Scale every entry by `periods_per_year`.
  pub fn annualize(&self, periods_per_year: f64) -> Self {
    Self {
      ids: self.ids.clone(),
      values: &self.values * periods_per_year,
    }
  }

  /// Normalize by the product of standard deviations.
  pub fn to_correlation(&self) -> Result<CorrelationMatrix> {
    let sd = self.std_devs();
    if let Some(i) = sd.iter().position(|s| *s <= 0.0 || !s.is_finite()) {
      return Err(AnalyticsError::DegenerateInput(format!(
        "{} has zero variance, correlation is undefined",
        self.ids[i]
      )));
    }

    let k = self.ids.len();
    let mut corr = Array2::<f64>::eye(k);
    for i in 0..k {
      for j in (i + 1)..k {
        let r = (self.values[[i, j]] / (sd[i] * sd[j])).clamp(-1.0, 1.0);
        corr[[i, j]] = r;
        corr[[j, i]] = r;
      }
    }

    Ok(CorrelationMatrix {
      ids: self.ids.clone(),
      values: corr,
    })
  }
}

impl CorrelationMatrix {
  pub fn ids(&self) -> &[String] {
    &self.ids
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn get(&self, a: &str, b: &str) -> Option<f64> {
    lookup(&self.ids, &self.values, a, b)
  }
}

/// Per-period sample covariance of every instrument pair.
pub fn sample_covariance(returns: &ReturnMatrix) -> Result<CovarianceMatrix> {
  let n = returns.n_obs();
  if n < 2 {
    return Err(AnalyticsError::InsufficientData {
      required: 2,
      got: n,
    });
  }

  let mut values = returns
    .data()
    .cov(1.0)
    .map_err(|_| AnalyticsError::InsufficientData {
      required: 2,
      got: 0,
    })?;

  let k = values.nrows();
  for i in 0..k {
    for j in (i + 1)..k {
      let v = 0.5 * (values[[i, j]] + values[[j, i]]);
      values[[i, j]] = v;
      values[[j, i]] = v;
    }
  }

  Ok(CovarianceMatrix {
    ids: returns.ids().to_vec(),
    values,
  })
}

/// Per-period Pearson correlation of every instrument pair.
pub fn correlation(returns: &ReturnMatrix) -> Result<CorrelationMatrix> {
  sample_covariance(returns)?.to_correlation()
}
