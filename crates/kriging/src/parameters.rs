use crate::distance::Distance;
use crate::errors::{KrigingError, Result};
use crate::observer::{PipelineObserver, Silent};
use linfa::{Float, ParamGuard};
use ndarray::Array1;
use std::sync::Arc;

/// Default exponent of the power variogram
pub const DEFAULT_BETA: f64 = 0.015;

/// A set of validated Kriging parameters.
#[derive(Clone, Debug)]
pub struct KrigingValidParams<F: Float> {
    /// Exponent of the power variogram
    pub(crate) beta: F,
    /// Distance policy between locations
    pub(crate) distance: Distance,
    /// Optional measurement error of each sample
    pub(crate) measurement_errors: Option<Array1<F>>,
    /// Relative threshold below which a pivot is considered to vanish
    pub(crate) pivot_tolerance: F,
    /// Receiver of pipeline milestones
    pub(crate) observer: Arc<dyn PipelineObserver>,
}

impl<F: Float> Default for KrigingValidParams<F> {
    fn default() -> KrigingValidParams<F> {
        KrigingValidParams {
            beta: F::cast(DEFAULT_BETA),
            distance: Distance::default(),
            measurement_errors: None,
            pivot_tolerance: F::cast(100.0) * F::epsilon(),
            observer: Arc::new(Silent),
        }
    }
}

impl<F: Float> KrigingValidParams<F> {
    /// Get variogram exponent
    pub fn beta(&self) -> F {
        self.beta
    }

    /// Get distance policy
    pub fn distance(&self) -> Distance {
        self.distance
    }

    /// Get measurement errors if any
    pub fn measurement_errors(&self) -> Option<&Array1<F>> {
        self.measurement_errors.as_ref()
    }

    /// Get pivot tolerance
    pub fn pivot_tolerance(&self) -> F {
        self.pivot_tolerance
    }

    /// Get the registered observer
    pub fn observer(&self) -> &dyn PipelineObserver {
        self.observer.as_ref()
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [ordinary Kriging algorithm](crate::OrdinaryKriging).
pub struct KrigingParams<F: Float>(KrigingValidParams<F>);

impl<F: Float> KrigingParams<F> {
    /// A constructor for Kriging parameters given the variogram exponent
    pub fn new(beta: F) -> KrigingParams<F> {
        Self(KrigingValidParams {
            beta,
            ..Default::default()
        })
    }

    /// Set variogram exponent.
    ///
    /// The exponent is not estimated from data, only the amplitude is.
    pub fn beta(mut self, beta: F) -> Self {
        self.0.beta = beta;
        self
    }

    /// Set distance policy.
    pub fn distance(mut self, distance: Distance) -> Self {
        self.0.distance = distance;
        self
    }

    /// Set measurement errors, one per sample.
    ///
    /// Squared errors are removed from the diagonal of the Kriging system,
    /// the model then smoothes the data instead of interpolating it exactly.
    pub fn measurement_errors(mut self, errors: Option<Array1<F>>) -> Self {
        self.0.measurement_errors = errors;
        self
    }

    /// Set pivot tolerance of the LU factorization, relative to the largest matrix entry.
    pub fn pivot_tolerance(mut self, tolerance: F) -> Self {
        self.0.pivot_tolerance = tolerance;
        self
    }

    /// Set the observer notified at each pipeline milestone.
    pub fn observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.0.observer = observer;
        self
    }
}

impl<F: Float> From<KrigingValidParams<F>> for KrigingParams<F> {
    fn from(valid: KrigingValidParams<F>) -> Self {
        KrigingParams(valid)
    }
}

impl<F: Float> ParamGuard for KrigingParams<F> {
    type Checked = KrigingValidParams<F>;
    type Error = KrigingError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let beta = self.0.beta;
        if !(beta > F::zero()) || !beta.is_finite() {
            return Err(KrigingError::InvalidValueError(format!(
                "`beta` should be a positive finite exponent, got {}",
                beta
            )));
        }
        let tol = self.0.pivot_tolerance;
        if !(tol >= F::zero()) || !tol.is_finite() {
            return Err(KrigingError::InvalidValueError(format!(
                "`pivot_tolerance` should be non negative, got {}",
                tol
            )));
        }
        if let Some(errors) = &self.0.measurement_errors {
            if errors.iter().any(|e| !(*e >= F::zero()) || !e.is_finite()) {
                return Err(KrigingError::InvalidValueError(
                    "`measurement_errors` should be non negative finite values".to_string(),
                ));
            }
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
