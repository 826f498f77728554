//! This library implements [ordinary Kriging](https://en.wikipedia.org/wiki/Kriging)
//! interpolation of sparse geographic samples driven by a power variogram model.
//!
//! Given n samples `(longitude, latitude, value)`, the pipeline:
//! * fits the amplitude of the power variogram `gamma(d) = alpha * d^beta`
//!   for a given exponent `beta` (see [`PowerVariogram`]),
//! * builds the (n+1, n+1) Kriging system and factorizes it once with a
//!   LU decomposition with partial pivoting (see [`KrigingSystem`]),
//! * estimates values at any location by solving the factorized system,
//!   typically for every cell of a regular [`Grid`].
//!
//! Fitting costs O(n^3), each estimation O(n^2). The fitted model is immutable
//! so grid cells can be estimated in parallel (see [`par_predict_grid`]).
//!
//! Kriging is implemented by [OrdinaryKriging] parameterized by [KrigingParams].
//!
//! ```
//! use krigrid_kriging::{Grid, OrdinaryKriging, predict_grid};
//! use linfa::prelude::*;
//! use ndarray::array;
//!
//! let xt = array![[0., 0.], [1., 0.], [0., 1.], [1., 1.]];
//! let yt = array![10., 20., 15., 18.];
//! let kriging = OrdinaryKriging::params(1.5)
//!     .fit(&Dataset::new(xt, yt))
//!     .expect("Kriging fitted");
//!
//! let grid = Grid::new(0., 1., 0., 1., 0.25).expect("valid grid");
//! let cells = predict_grid(&grid, &kriging);
//! assert_eq!(cells.len(), 25);
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
pub mod distance;
mod errors;
mod grid;
pub mod linalg;
pub mod observer;
mod parameters;
mod sample;
pub mod variogram;

pub use algorithm::*;
pub use distance::Distance;
pub use errors::*;
pub use grid::*;
pub use observer::{PipelineObserver, Silent, Stage};
pub use parameters::*;
pub use sample::*;
pub use variogram::PowerVariogram;
