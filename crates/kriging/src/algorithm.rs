use crate::distance::{Distance, PairDistances};
use crate::errors::{KrigingError, Result};
use crate::linalg::LuDecomposition;
use crate::observer::{PipelineObserver, Stage};
use crate::parameters::{KrigingParams, KrigingValidParams};
use crate::variogram::PowerVariogram;

use linfa::prelude::{DatasetBase, Fit, Float, PredictInplace};
use ndarray::{s, Array1, Array2, ArrayBase, Data, Ix1, Ix2, Zip};

use log::debug;
use std::fmt;
use std::time::Instant;

/// The augmented variogram system of ordinary Kriging and its LU factorization.
///
/// For `n` samples the `(n+1, n+1)` matrix is
///
/// ```text
/// | gamma(d_11) ... gamma(d_1n) 1 |
/// |     ...           ...      ...|
/// | gamma(d_n1) ... gamma(d_nn) 1 |
/// |     1       ...      1      0 |
/// ```
///
/// where the last row and column hold the Lagrange multiplier enforcing
/// that Kriging weights sum to one. The factorization is computed once at
/// construction, each solve then costs O(n^2).
///
/// The variogram block is stored divided by the variogram amplitude
/// (see [`KrigingSystem::scale`]) so that factorization does not depend on
/// the units of the sample values. Weights are unchanged, the Lagrange
/// multiplier and the Kriging variance are given relative to that scale.
#[derive(Debug, Clone)]
pub struct KrigingSystem<F: Float> {
    matrix: Array2<F>,
    lu: LuDecomposition<F>,
    /// Variogram with amplitude divided by `scale`
    unit: PowerVariogram<F>,
    scale: F,
}

impl<F: Float> KrigingSystem<F> {
    /// Build and factorize the system of samples located at `x` (n, 2) given a variogram
    pub fn build(
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        variogram: &PowerVariogram<F>,
        distance: Distance,
    ) -> Result<Self> {
        let pairs = PairDistances::new(x, distance);
        Self::from_pairs(
            &pairs,
            variogram,
            None,
            KrigingValidParams::<F>::default().pivot_tolerance(),
        )
    }

    pub(crate) fn from_pairs(
        pairs: &PairDistances<F>,
        variogram: &PowerVariogram<F>,
        measurement_errors: Option<&Array1<F>>,
        pivot_tolerance: F,
    ) -> Result<Self> {
        let n = pairs.n_obs;
        if n == 0 {
            return Err(KrigingError::InsufficientData(0));
        }

        let alpha = variogram.alpha();
        let scale = if alpha.is_finite() && alpha > F::zero() {
            alpha
        } else {
            F::one()
        };
        let unit = PowerVariogram::new(alpha / scale, variogram.beta());

        let mut matrix = Array2::zeros((n + 1, n + 1));
        Zip::from(&pairs.d)
            .and(pairs.d_indices.rows())
            .for_each(|&d, ij| {
                let g = unit.value(d);
                matrix[[ij[0], ij[1]]] = g;
                matrix[[ij[1], ij[0]]] = g;
            });
        matrix.slice_mut(s![..n, n]).fill(F::one());
        matrix.slice_mut(s![n, ..n]).fill(F::one());
        if let Some(errors) = measurement_errors {
            for (i, &e) in errors.iter().enumerate() {
                matrix[[i, i]] -= e * e / scale;
            }
        }

        let lu = LuDecomposition::new(&matrix, pivot_tolerance)?;
        Ok(KrigingSystem {
            matrix,
            lu,
            unit,
            scale,
        })
    }

    /// The augmented matrix, variogram block divided by [`KrigingSystem::scale`]
    pub fn matrix(&self) -> &Array2<F> {
        &self.matrix
    }

    /// Amplitude the variogram block is divided by: the variogram amplitude
    /// when positive and finite, 1 otherwise
    pub fn scale(&self) -> F {
        self.scale
    }

    /// Number of samples of the system
    pub fn n_samples(&self) -> usize {
        self.matrix.nrows() - 1
    }

    /// Right-hand side of the system for distances `d` from a location to the samples
    pub fn rhs(&self, d: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        let n = self.n_samples();
        let mut b = Array1::ones(n + 1);
        b.slice_mut(s![..n]).assign(&self.unit.values(d));
        b
    }

    /// Solve the system for the right-hand side `b` of length n+1
    pub fn solve(&self, b: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        self.lu.solve(b)
    }
}

/// Ordinary Kriging interpolation of scalar measurements located by
/// `[longitude, latitude]` coordinates.
///
/// The estimate at a location `q` is a weighted sum of the sample values
///
/// `z(q) = sum_i w_i(q) * z_i` with `sum_i w_i(q) = 1`
///
/// where the weights solve the [`KrigingSystem`] built with a [`PowerVariogram`]
/// fitted on the samples. Weights may be negative, so the estimate is not bounded
/// by the sample values in general.
///
/// # Example
///
/// ```
/// use krigrid_kriging::OrdinaryKriging;
/// use linfa::prelude::*;
/// use ndarray::array;
///
/// let xt = array![[0., 0.], [1., 0.], [0., 1.]];
/// let yt = array![10., 20., 15.];
///
/// let kriging = OrdinaryKriging::params(1.0f64)
///     .fit(&Dataset::new(xt, yt))
///     .expect("Kriging fitted");
///
/// let z = kriging.interpolate(&array![0., 0.]);
/// assert!((z - 10.).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct OrdinaryKriging<F: Float> {
    /// Fitted variogram
    variogram: PowerVariogram<F>,
    /// Factorized system
    system: KrigingSystem<F>,
    /// Training dataset (locations, values)
    pub(crate) training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    pub(crate) params: KrigingValidParams<F>,
}

impl<F: Float> fmt::Display for OrdinaryKriging<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "OrdinaryKriging(variogram={}, distance={}, samples={})",
            self.variogram,
            self.params.distance(),
            self.n_samples()
        )
    }
}

impl<F: Float> OrdinaryKriging<F> {
    /// Kriging parameters constructor given the variogram exponent
    pub fn params(beta: F) -> KrigingParams<F> {
        KrigingParams::new(beta)
    }

    /// Right-hand side of the system at location `q`
    fn rhs(&self, q: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        let d = self.params.distance().to_rows(q, &self.training_data.0);
        self.system.rhs(&d)
    }

    /// Kriging weights of the samples at location `q`
    pub fn weights(&self, q: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        let n = self.n_samples();
        let sol = self.system.solve(&self.rhs(q));
        sol.slice(s![..n]).to_owned()
    }

    /// Estimate the value at location `q` given as `[longitude, latitude]`
    pub fn interpolate(&self, q: &ArrayBase<impl Data<Elem = F>, Ix1>) -> F {
        self.weights(q).dot(&self.training_data.1)
    }

    /// Estimate both the value and the Kriging variance at location `q`
    pub fn interpolate_with_variance(&self, q: &ArrayBase<impl Data<Elem = F>, Ix1>) -> (F, F) {
        let n = self.n_samples();
        let b = self.rhs(q);
        let sol = self.system.solve(&b);
        let value = sol.slice(s![..n]).dot(&self.training_data.1);
        let var = self.system.scale() * sol.dot(&b);
        // might be slightly negative depending on machine precision
        let var = if var < F::zero() { F::zero() } else { var };
        (value, var)
    }

    /// Predict values at m locations given as a (m, 2) matrix.
    /// Returns m values as a vector (m,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        let mut y = Array1::zeros(x.nrows());
        Zip::from(&mut y)
            .and(x.rows())
            .par_for_each(|y, q| *y = self.interpolate(&q));
        y
    }

    /// Predict Kriging variances at m locations given as a (m, 2) matrix.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        self.predict_valvar(x).1
    }

    /// Predict both values and Kriging variances at m locations given as a (m, 2) matrix.
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> (Array1<F>, Array1<F>) {
        let mut y = Array1::zeros(x.nrows());
        let mut v = Array1::zeros(x.nrows());
        Zip::from(&mut y)
            .and(&mut v)
            .and(x.rows())
            .par_for_each(|y, v, q| (*y, *v) = self.interpolate_with_variance(&q));
        (y, v)
    }

    /// Fitted variogram
    pub fn variogram(&self) -> &PowerVariogram<F> {
        &self.variogram
    }

    /// Factorized Kriging system
    pub fn system(&self) -> &KrigingSystem<F> {
        &self.system
    }

    /// Number of training samples
    pub fn n_samples(&self) -> usize {
        self.training_data.1.len()
    }

    /// Training dataset (locations, values)
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Parameters used to fit this model
    pub fn params_used(&self) -> &KrigingValidParams<F> {
        &self.params
    }

    /// Observer registered at fit time
    pub fn observer(&self) -> &dyn PipelineObserver {
        self.params.observer()
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, KrigingError>
    for KrigingValidParams<F>
{
    type Object = OrdinaryKriging<F>;

    /// Fit the variogram amplitude then build and factorize the Kriging system
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();

        if x.ncols() != 2 {
            return Err(KrigingError::InvalidValueError(format!(
                "Sample locations should be given as (longitude, latitude) rows, got {} columns",
                x.ncols()
            )));
        }
        let n = x.nrows();
        if n == 0 {
            return Err(KrigingError::InsufficientData(0));
        }
        if let Some(errors) = self.measurement_errors() {
            if errors.len() != n {
                return Err(KrigingError::InvalidValueError(format!(
                    "Expected {} measurement errors (one per sample), got {}",
                    n,
                    errors.len()
                )));
            }
        }

        let observer = self.observer();
        observer.record(
            Stage::VariogramStarted,
            &format!("{} samples, beta={}", n, self.beta()),
        );
        let now = Instant::now();
        let pairs = PairDistances::new(x, self.distance());
        let variogram = PowerVariogram::fit(&pairs, y, self.beta())?;
        debug!("Variogram fitted in {:?}: {}", now.elapsed(), variogram);
        observer.record(Stage::VariogramFitted, &variogram.to_string());

        observer.record(
            Stage::SystemStarted,
            &format!("factorizing ({}, {}) system", n + 1, n + 1),
        );
        let now = Instant::now();
        let system = KrigingSystem::from_pairs(
            &pairs,
            &variogram,
            self.measurement_errors(),
            self.pivot_tolerance(),
        )?;
        debug!("Kriging system ({n} samples) factorized in {:?}", now.elapsed());
        observer.record(Stage::SystemFactorized, &format!("{} samples", n));

        Ok(OrdinaryKriging {
            variogram,
            system,
            training_data: (x.to_owned(), y.to_owned()),
            params: self.clone(),
        })
    }
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>>
    for OrdinaryKriging<F>
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        y.assign(&self.predict(x));
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}
