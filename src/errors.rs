use krigrid_kriging::KrigingError;
use thiserror::Error;

/// A result type for the interpolation pipeline
pub type Result<T> = std::result::Result<T, KrigridError>;

/// An error when running the interpolation pipeline
#[derive(Error, Debug)]
pub enum KrigridError {
    /// When Kriging fails
    #[error(transparent)]
    KrigingError(#[from] KrigingError),
    /// When reading samples or writing the grid fails
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// When writing a grid row fails
    #[error(transparent)]
    CsvError(#[from] csv::Error),
    /// When saving the grid as npy fails
    #[error(transparent)]
    NpyError(#[from] ndarray_npy::WriteNpyError),
    /// When the sample stream is malformed
    #[error("Format error: {0}")]
    FormatError(String),
    /// When command line options are inconsistent
    #[error("InvalidOption error: {0}")]
    InvalidOptionError(String),
}
