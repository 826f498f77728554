//! Distances between sample locations given as `[longitude, latitude]` rows.

use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in kilometers (IUGG)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Distance policy used to compare two locations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Distance {
    /// Plane distance, coordinates are used as is (degrees for geographic data)
    #[default]
    Euclidean,
    /// Great-circle distance in kilometers, coordinates are longitude and latitude in degrees
    Haversine,
}

impl Distance {
    /// Distance between locations `a` and `b`
    pub fn between<F: Float>(
        &self,
        a: &ArrayBase<impl Data<Elem = F>, Ix1>,
        b: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> F {
        match self {
            Distance::Euclidean => {
                let dlon = a[0] - b[0];
                let dlat = a[1] - b[1];
                dlon.hypot(dlat)
            }
            Distance::Haversine => {
                let two = F::cast(2.);
                let (lat_a, lat_b) = (a[1].to_radians(), b[1].to_radians());
                let half_dlat = (lat_b - lat_a) / two;
                let half_dlon = (b[0] - a[0]).to_radians() / two;
                let h = half_dlat.sin().powi(2)
                    + lat_a.cos() * lat_b.cos() * half_dlon.sin().powi(2);
                two * F::cast(EARTH_RADIUS_KM) * h.min(F::one()).sqrt().asin()
            }
        }
    }

    /// Distances from location `q` to each row of `x`
    pub fn to_rows<F: Float>(
        &self,
        q: &ArrayBase<impl Data<Elem = F>, Ix1>,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array1<F> {
        x.rows().into_iter().map(|xi| self.between(q, &xi)).collect()
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Distance::Euclidean => write!(f, "Euclidean"),
            Distance::Haversine => write!(f, "Haversine"),
        }
    }
}

/// A structure to retain distances between every unordered pair of samples
/// used both to fit the variogram and to build the Kriging matrix
#[derive(Debug, Clone)]
pub struct PairDistances<F: Float> {
    /// Distances as a (n_obs * (n_obs-1))/2 vector
    pub d: Array1<F>,
    /// Indices (i, j) with i < j of the samples of each pair
    pub d_indices: Array2<usize>,
    /// Number of observations
    pub n_obs: usize,
}

impl<F: Float> PairDistances<F> {
    /// Compute pair distances of locations given as an array (n_obs, 2)
    pub fn new(x: &ArrayBase<impl Data<Elem = F>, Ix2>, distance: Distance) -> PairDistances<F> {
        let n_obs = x.nrows();
        let n_pairs = n_obs * n_obs.saturating_sub(1) / 2;
        let mut d = Array1::zeros(n_pairs);
        let mut d_indices = Array2::<usize>::zeros((n_pairs, 2));
        let mut r = 0;
        for i in 0..n_obs {
            for j in (i + 1)..n_obs {
                d[r] = distance.between(&x.row(i), &x.row(j));
                d_indices[[r, 0]] = i;
                d_indices[[r, 1]] = j;
                r += 1;
            }
        }
        PairDistances {
            d,
            d_indices,
            n_obs,
        }
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.d.len()
    }

    /// Whether there is no pair at all (less than two observations)
    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }
}
