//! Regular output grid and its traversal.
//!
//! Grid locations are ordered by latitude rows, longitude varying fastest,
//! both axes going from their minimum to their maximum inclusive.
//! The number of steps along an axis is computed once as
//! `floor((max - min) / cell_size) + 1` (with a 1e-9 slack absorbing rounding
//! of ranges which are whole multiples of the cell size) and the k-th
//! coordinate is `min + k * cell_size`, so traversal does not accumulate
//! rounding errors and always yields the same cells.

use crate::algorithm::OrdinaryKriging;
use crate::errors::{KrigingError, Result};
use crate::observer::{PipelineObserver, Silent, Stage};
use linfa::Float;
use ndarray::{aview1, Array2};
use rayon::prelude::*;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slack added to the cell count quotient
const STEP_SLACK: f64 = 1e-9;

/// Bounding box and cell size of the interpolation grid
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Grid<F: Float> {
    min_latitude: F,
    max_latitude: F,
    min_longitude: F,
    max_longitude: F,
    cell_size: F,
    n_latitudes: usize,
    n_longitudes: usize,
}

impl<F: Float> Grid<F> {
    /// Constructor, bounds should be ordered and cell size positive
    pub fn new(
        min_latitude: F,
        max_latitude: F,
        min_longitude: F,
        max_longitude: F,
        cell_size: F,
    ) -> Result<Self> {
        let bounds = [min_latitude, max_latitude, min_longitude, max_longitude];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(KrigingError::InvalidValueError(
                "Grid bounds should be finite".to_string(),
            ));
        }
        if !(cell_size > F::zero()) || !cell_size.is_finite() {
            return Err(KrigingError::InvalidValueError(format!(
                "Grid cell size should be positive, got {}",
                cell_size
            )));
        }
        if min_latitude > max_latitude {
            return Err(KrigingError::InvalidValueError(format!(
                "Minimum latitude {} is greater than maximum latitude {}",
                min_latitude, max_latitude
            )));
        }
        if min_longitude > max_longitude {
            return Err(KrigingError::InvalidValueError(format!(
                "Minimum longitude {} is greater than maximum longitude {}",
                min_longitude, max_longitude
            )));
        }
        let n_latitudes = steps(min_latitude, max_latitude, cell_size)?;
        let n_longitudes = steps(min_longitude, max_longitude, cell_size)?;
        if n_latitudes.checked_mul(n_longitudes).is_none() {
            return Err(KrigingError::InvalidValueError(format!(
                "Grid of {} x {} cells is too large",
                n_latitudes, n_longitudes
            )));
        }
        Ok(Grid {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
            cell_size,
            n_latitudes,
            n_longitudes,
        })
    }

    /// Number of cells along the longitude axis
    pub fn n_longitudes(&self) -> usize {
        self.n_longitudes
    }

    /// Number of cells along the latitude axis
    pub fn n_latitudes(&self) -> usize {
        self.n_latitudes
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.n_latitudes * self.n_longitudes
    }

    /// Always false: a grid built by [`Grid::new`] has at least one cell,
    /// its bounds being included.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Longitude of the k-th column
    pub fn longitude(&self, k: usize) -> F {
        self.min_longitude + F::cast(k) * self.cell_size
    }

    /// Latitude of the k-th row
    pub fn latitude(&self, k: usize) -> F {
        self.min_latitude + F::cast(k) * self.cell_size
    }

    /// Cell size
    pub fn cell_size(&self) -> F {
        self.cell_size
    }

    /// Locations `(longitude, latitude)` of the cells in traversal order
    pub fn iter(&self) -> GridIter<'_, F> {
        GridIter {
            grid: self,
            n_lon: self.n_longitudes(),
            index: 0,
            end: self.len(),
        }
    }

    /// Locations of the cells as a (len, 2) matrix of `[longitude, latitude]` rows
    pub fn locations(&self) -> Array2<F> {
        let mut x = Array2::zeros((self.len(), 2));
        for (mut row, (lon, lat)) in x.rows_mut().into_iter().zip(self.iter()) {
            row[0] = lon;
            row[1] = lat;
        }
        x
    }

    /// Lazily predicted cells in traversal order
    pub fn predictions<'a, P: CellEstimator<F>>(
        &'a self,
        estimator: &'a P,
    ) -> GridPredictions<'a, F, P> {
        GridPredictions {
            cells: self.iter(),
            estimator,
        }
    }
}

/// Number of cells from `min` to `max` inclusive
fn steps<F: Float>(min: F, max: F, cell_size: F) -> Result<usize> {
    ((max - min) / cell_size + F::cast(STEP_SLACK))
        .floor()
        .to_usize()
        .and_then(|q| q.checked_add(1))
        .ok_or_else(|| {
            KrigingError::InvalidValueError(format!(
                "Too many grid cells between {} and {} with cell size {}",
                min, max, cell_size
            ))
        })
}

impl<F: Float> fmt::Display for Grid<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}X{} {}X{}",
            self.min_latitude, self.max_latitude, self.min_longitude, self.max_longitude
        )
    }
}

/// Iterator over grid locations, latitude rows outside, longitude varying fastest
#[derive(Clone, Debug)]
pub struct GridIter<'a, F: Float> {
    grid: &'a Grid<F>,
    n_lon: usize,
    index: usize,
    end: usize,
}

impl<F: Float> Iterator for GridIter<'_, F> {
    type Item = (F, F);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.end {
            return None;
        }
        let (row, col) = (self.index / self.n_lon, self.index % self.n_lon);
        self.index += 1;
        Some((self.grid.longitude(col), self.grid.latitude(row)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.index;
        (remaining, Some(remaining))
    }
}

impl<F: Float> ExactSizeIterator for GridIter<'_, F> {}

/// A predicted grid cell
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct GridCell<F: Float> {
    /// Longitude of the cell
    pub longitude: F,
    /// Latitude of the cell
    pub latitude: F,
    /// Estimated value
    pub value: F,
    /// Kriging variance when requested
    pub variance: Option<F>,
}

/// A trait for models estimating a value at a location, used to fill grids
pub trait CellEstimator<F: Float>: Sync {
    /// Estimate cell at given location
    fn estimate(&self, longitude: F, latitude: F) -> GridCell<F>;

    /// Observer notified when grid traversal starts and ends
    fn observer(&self) -> &dyn PipelineObserver {
        &Silent
    }
}

impl<F: Float> CellEstimator<F> for OrdinaryKriging<F> {
    fn estimate(&self, longitude: F, latitude: F) -> GridCell<F> {
        GridCell {
            longitude,
            latitude,
            value: self.interpolate(&aview1(&[longitude, latitude])),
            variance: None,
        }
    }

    fn observer(&self) -> &dyn PipelineObserver {
        OrdinaryKriging::observer(self)
    }
}

/// Ordinary Kriging estimator reporting Kriging variance along with the value
#[derive(Clone, Copy, Debug)]
pub struct WithVariance<'a, F: Float>(pub &'a OrdinaryKriging<F>);

impl<F: Float> CellEstimator<F> for WithVariance<'_, F> {
    fn estimate(&self, longitude: F, latitude: F) -> GridCell<F> {
        let (value, variance) = self
            .0
            .interpolate_with_variance(&aview1(&[longitude, latitude]));
        GridCell {
            longitude,
            latitude,
            value,
            variance: Some(variance),
        }
    }

    fn observer(&self) -> &dyn PipelineObserver {
        self.0.observer()
    }
}

/// Lazy sequence of predicted cells, see [`Grid::predictions`]
pub struct GridPredictions<'a, F: Float, P: CellEstimator<F>> {
    cells: GridIter<'a, F>,
    estimator: &'a P,
}

impl<F: Float, P: CellEstimator<F>> Clone for GridPredictions<'_, F, P> {
    fn clone(&self) -> Self {
        GridPredictions {
            cells: self.cells.clone(),
            estimator: self.estimator,
        }
    }
}

impl<F: Float, P: CellEstimator<F>> Iterator for GridPredictions<'_, F, P> {
    type Item = GridCell<F>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cells
            .next()
            .map(|(lon, lat)| self.estimator.estimate(lon, lat))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cells.size_hint()
    }
}

impl<F: Float, P: CellEstimator<F>> ExactSizeIterator for GridPredictions<'_, F, P> {}

fn record_start<F: Float>(observer: &dyn PipelineObserver, grid: &Grid<F>) {
    observer.record(
        Stage::GridStarted,
        &format!("{} cells ({})", grid.len(), grid),
    );
}

fn record_end<F: Float>(observer: &dyn PipelineObserver, grid: &Grid<F>) {
    observer.record(Stage::GridFinished, &format!("{} cells", grid.len()));
}

/// Estimate every cell of the grid in traversal order and hand it to `emit`.
///
/// Traversal stops at the first error returned by `emit`, which is propagated.
pub fn for_each_cell<F, P, E, Err>(
    grid: &Grid<F>,
    estimator: &P,
    mut emit: E,
) -> std::result::Result<(), Err>
where
    F: Float,
    P: CellEstimator<F>,
    E: FnMut(GridCell<F>) -> std::result::Result<(), Err>,
{
    record_start(estimator.observer(), grid);
    for cell in grid.predictions(estimator) {
        emit(cell)?;
    }
    record_end(estimator.observer(), grid);
    Ok(())
}

/// Estimate every cell of the grid in traversal order
pub fn predict_grid<F: Float, P: CellEstimator<F>>(
    grid: &Grid<F>,
    estimator: &P,
) -> Vec<GridCell<F>> {
    record_start(estimator.observer(), grid);
    let cells = grid.predictions(estimator).collect();
    record_end(estimator.observer(), grid);
    cells
}

/// Estimate every cell of the grid, latitude rows being processed in parallel.
///
/// Cells are returned in the same order as [`predict_grid`].
pub fn par_predict_grid<F: Float, P: CellEstimator<F>>(
    grid: &Grid<F>,
    estimator: &P,
) -> Vec<GridCell<F>> {
    record_start(estimator.observer(), grid);
    let n_lon = grid.n_longitudes();
    let rows: Vec<Vec<GridCell<F>>> = (0..grid.n_latitudes())
        .into_par_iter()
        .map(|i| {
            let lat = grid.latitude(i);
            (0..n_lon)
                .map(|j| estimator.estimate(grid.longitude(j), lat))
                .collect()
        })
        .collect();
    record_end(estimator.observer(), grid);
    rows.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{samples_dataset, SamplePoint};
    use approx::assert_abs_diff_eq;
    use linfa::prelude::Fit;
    use ndarray::array;

    fn kriging() -> OrdinaryKriging<f64> {
        let ds = samples_dataset(&[
            SamplePoint::new(0., 0., 10.),
            SamplePoint::new(1., 0., 20.),
            SamplePoint::new(0., 1., 15.),
            SamplePoint::new(0.8, 0.9, 12.),
        ]);
        OrdinaryKriging::params(1.0).fit(&ds).expect("Kriging fitted")
    }

    #[test]
    fn test_traversal_order() {
        let grid = Grid::new(0., 1., 0., 1., 0.5).expect("valid grid");
        let cells: Vec<_> = grid.iter().collect();
        assert_eq!(
            cells,
            vec![
                (0., 0.),
                (0.5, 0.),
                (1., 0.),
                (0., 0.5),
                (0.5, 0.5),
                (1., 0.5),
                (0., 1.),
                (0.5, 1.),
                (1., 1.)
            ]
        );
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.iter().len(), 9);
    }

    #[test]
    fn test_restartable() {
        let grid = Grid::new(10., 10.3, -2., -1.9, 0.1).expect("valid grid");
        let first: Vec<_> = grid.iter().collect();
        let second: Vec<_> = grid.iter().collect();
        assert_eq!(first, second);

        let model = kriging();
        let preds = grid.predictions(&model);
        let a: Vec<_> = preds.clone().collect();
        let b: Vec<_> = preds.collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_inclusive_bounds_with_rounding() {
        // 0.3 / 0.1 is slightly below 3 in floating point
        let grid = Grid::new(0., 0.3, 0., 0.7, 0.1).expect("valid grid");
        assert_eq!(grid.n_latitudes(), 4);
        assert_eq!(grid.n_longitudes(), 8);
        let last = grid.iter().last().expect("non empty grid");
        assert_abs_diff_eq!(last.0, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(last.1, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_last_cell_excluded() {
        let grid = Grid::new(0., 1., 0., 1., 0.3).expect("valid grid");
        assert_eq!(grid.n_longitudes(), 4);
        assert!(grid.iter().all(|(lon, lat)| lon <= 1. && lat <= 1.));
    }

    #[test]
    fn test_single_cell() {
        let grid = Grid::new(2., 2., 3., 3., 0.001).expect("valid grid");
        assert_eq!(grid.iter().collect::<Vec<_>>(), vec![(3., 2.)]);
    }

    #[test]
    fn test_invalid_grids() {
        assert!(Grid::new(1., 0., 0., 1., 0.1).is_err());
        assert!(Grid::new(0., 1., 1., 0., 0.1).is_err());
        assert!(Grid::new(0., 1., 0., 1., 0.).is_err());
        assert!(Grid::new(0., 1., 0., 1., -0.1).is_err());
        assert!(Grid::new(0., f64::NAN, 0., 1., 0.1).is_err());
    }

    #[test]
    fn test_too_many_cells() {
        // cell count does not fit in usize
        assert!(matches!(
            Grid::new(0., 1e300, 0., 1., 1e-300),
            Err(KrigingError::InvalidValueError(_))
        ));
        // cell counts fit but not their product
        let side = 2f64.powi(40);
        assert!(matches!(
            Grid::new(0., side, 0., side, 1.),
            Err(KrigingError::InvalidValueError(_))
        ));
    }

    #[test]
    fn test_locations() {
        let grid = Grid::new(0., 1., 0., 1., 0.5).expect("valid grid");
        let x = grid.locations();
        assert_eq!(x.dim(), (9, 2));
        assert_eq!(x.row(5), array![1., 0.5]);
    }

    #[test]
    fn test_for_each_cell_matches_interpolate() {
        let model = kriging();
        let grid = Grid::new(-0.5, 1.5, -0.5, 1.5, 0.25).expect("valid grid");
        let mut count = 0;
        for_each_cell(&grid, &model, |cell| {
            let z = model.interpolate(&array![cell.longitude, cell.latitude]);
            assert_eq!(cell.value, z);
            assert!(cell.variance.is_none());
            count += 1;
            Ok::<(), ()>(())
        })
        .expect("traversal");
        assert_eq!(count, grid.len());
    }

    #[test]
    fn test_for_each_cell_stops_on_error() {
        let model = kriging();
        let grid = Grid::new(0., 1., 0., 1., 0.1).expect("valid grid");
        let mut count = 0;
        let res = for_each_cell(&grid, &model, |_| {
            count += 1;
            if count == 5 {
                Err("sink closed")
            } else {
                Ok(())
            }
        });
        assert_eq!(res, Err("sink closed"));
        assert_eq!(count, 5);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = kriging();
        let grid = Grid::new(-1., 2., -1., 2., 0.1).expect("valid grid");
        let seq = predict_grid(&grid, &model);
        let par = par_predict_grid(&grid, &model);
        assert_eq!(seq.len(), grid.len());
        assert_eq!(seq, par);
        let locations: Vec<_> = seq.iter().map(|c| (c.longitude, c.latitude)).collect();
        assert_eq!(locations, grid.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_with_variance() {
        let model = kriging();
        let grid = Grid::new(0., 1., 0., 1., 0.5).expect("valid grid");
        let cells = par_predict_grid(&grid, &WithVariance(&model));
        assert_abs_diff_eq!(cells[0].value, 10., epsilon = 1e-9);
        assert_abs_diff_eq!(cells[0].variance.expect("variance"), 0., epsilon = 1e-9);
        assert!(cells.iter().all(|c| c.variance.is_some_and(|v| v >= 0.)));
    }
}
