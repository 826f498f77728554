use linfa::{Dataset, Float};
use ndarray::{Array1, Array2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A measurement at a geographic location
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct SamplePoint<F: Float> {
    /// Longitude (x coordinate)
    pub longitude: F,
    /// Latitude (y coordinate)
    pub latitude: F,
    /// Measured value
    pub value: F,
}

impl<F: Float> SamplePoint<F> {
    /// Constructor
    pub fn new(longitude: F, latitude: F, value: F) -> Self {
        SamplePoint {
            longitude,
            latitude,
            value,
        }
    }
}

/// Build the training dataset of a sequence of samples: records are
/// `[longitude, latitude]` rows and targets the values, in sequence order.
pub fn samples_dataset<F: Float>(samples: &[SamplePoint<F>]) -> Dataset<F, F, ndarray::Ix1> {
    let mut x = Array2::zeros((samples.len(), 2));
    let mut y = Array1::zeros(samples.len());
    for (i, s) in samples.iter().enumerate() {
        x[[i, 0]] = s.longitude;
        x[[i, 1]] = s.latitude;
        y[i] = s.value;
    }
    Dataset::new(x, y)
}
