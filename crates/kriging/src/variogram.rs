//! A module for the power variogram model characterizing spatial correlation of samples.
//!
//! The semivariance between two locations at distance `d` is modeled as
//!
//! `gamma(d) = alpha * d^beta`, with `gamma(0) = 0`
//!
//! where the exponent `beta` is given and the amplitude `alpha` is estimated
//! by least squares against the empirical dissimilarities of sample pairs.

use crate::distance::PairDistances;
use crate::errors::{KrigingError, Result};
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Power law variogram model
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct PowerVariogram<F: Float> {
    /// Amplitude
    alpha: F,
    /// Exponent
    beta: F,
}

impl<F: Float> PowerVariogram<F> {
    /// Constructor given amplitude `alpha` and exponent `beta`
    pub fn new(alpha: F, beta: F) -> Self {
        PowerVariogram { alpha, beta }
    }

    /// Fit the amplitude given the pair distances of the samples and their values `y`.
    ///
    /// Minimizing `sum((0.5 * (y_i - y_j)^2 - alpha * d_ij^beta)^2)` over all pairs
    /// gives `alpha = sum(0.5 * (y_i - y_j)^2 * d_ij^beta) / sum(d_ij^(2 * beta))`.
    ///
    /// When `d_ij^beta` overflows or underflows for every pair, alpha is NaN
    /// and so are the estimates of the resulting model.
    pub fn fit(
        pairs: &PairDistances<F>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
        beta: F,
    ) -> Result<Self> {
        if pairs.is_empty() {
            return Err(KrigingError::InsufficientData(pairs.n_obs));
        }
        let half = F::cast(0.5);
        let mut num = F::zero();
        let mut denom = F::zero();
        Zip::from(&pairs.d)
            .and(pairs.d_indices.rows())
            .for_each(|&d, ij| {
                let rb = if d > F::zero() { d.powf(beta) } else { F::zero() };
                let dy = y[ij[0]] - y[ij[1]];
                num += half * dy * dy * rb;
                denom += rb * rb;
            });
        if pairs.d.iter().all(|&d| d == F::zero()) {
            return Err(KrigingError::DegenerateInput(format!(
                "all {} sample pairs are at distance zero, samples are co-located",
                pairs.len()
            )));
        }
        Ok(PowerVariogram {
            alpha: num / denom,
            beta,
        })
    }

    /// Semivariance at distance `d`
    pub fn value(&self, d: F) -> F {
        if d > F::zero() {
            self.alpha * d.powf(self.beta)
        } else {
            F::zero()
        }
    }

    /// Semivariances at distances `d`
    pub fn values(&self, d: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        d.mapv(|v| self.value(v))
    }

    /// Fitted amplitude
    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// Given exponent
    pub fn beta(&self) -> F {
        self.beta
    }
}

impl<F: Float> fmt::Display for PowerVariogram<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Power(alpha={}, beta={})", self.alpha, self.beta)
    }
}
