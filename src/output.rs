//! Grid output writers.
//!
//! Cells are written one per row in traversal order, either as delimited text
//! `longitude latitude estimate [variance]` or as a `(cells, 3|4)` npy array.

use crate::errors::Result;
use krigrid_kriging::GridCell;
use ndarray::Array2;
use ndarray_npy::write_npy;
use std::io;
use std::path::Path;

/// Delimited text writer of grid cells, without header
pub struct GridWriter<W: io::Write> {
    writer: csv::Writer<W>,
    with_variance: bool,
}

impl<W: io::Write> GridWriter<W> {
    /// Constructor, variance column is written when `with_variance` is set
    pub fn new(writer: W, delimiter: u8, with_variance: bool) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(writer);
        GridWriter {
            writer,
            with_variance,
        }
    }

    /// Append a cell row
    pub fn write_cell(&mut self, cell: &GridCell<f64>) -> Result<()> {
        match cell.variance.filter(|_| self.with_variance) {
            Some(variance) => self.writer.serialize((
                cell.longitude,
                cell.latitude,
                cell.value,
                variance,
            ))?,
            None => self
                .writer
                .serialize((cell.longitude, cell.latitude, cell.value))?,
        }
        Ok(())
    }

    /// Flush pending rows
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Gather cells as rows of a matrix
pub fn cells_array(cells: &[GridCell<f64>], with_variance: bool) -> Array2<f64> {
    let ncols = if with_variance { 4 } else { 3 };
    let mut array = Array2::zeros((cells.len(), ncols));
    for (mut row, cell) in array.rows_mut().into_iter().zip(cells) {
        row[0] = cell.longitude;
        row[1] = cell.latitude;
        row[2] = cell.value;
        if with_variance {
            row[3] = cell.variance.unwrap_or(f64::NAN);
        }
    }
    array
}

/// Save cells in npy format
pub fn write_cells_npy<P: AsRef<Path>>(
    path: P,
    cells: &[GridCell<f64>],
    with_variance: bool,
) -> Result<()> {
    write_npy(path, &cells_array(cells, with_variance))?;
    Ok(())
}

/// Whether the path asks for npy output
pub fn is_npy(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "npy")
}
