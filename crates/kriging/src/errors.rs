use thiserror::Error;

/// A result type for Kriging interpolation
pub type Result<T> = std::result::Result<T, KrigingError>;

/// An error when fitting an [`OrdinaryKriging`](crate::OrdinaryKriging) model
#[derive(Error, Debug)]
pub enum KrigingError {
    /// When there are not enough samples to interpolate
    #[error("Insufficient data: {0} sample(s) given")]
    InsufficientData(usize),
    /// When the variogram cannot be fitted from the samples
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
    /// When the Kriging system matrix cannot be factorized
    #[error("Singular system: pivot {pivot} vanishes (|pivot| = {value:e})")]
    SingularSystem {
        /// Index of the elimination step which failed
        pivot: usize,
        /// Largest absolute value found in the pivot column
        value: f64,
    },
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}
