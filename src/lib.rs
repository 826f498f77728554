//! `krigrid` interpolates sparse geographic measurements onto a regular
//! latitude/longitude grid using ordinary Kriging (see [`krigrid_kriging`]).
//!
//! The command line reads a sample stream, fits a power variogram, factorizes
//! the Kriging system once and writes one `longitude latitude estimate` row
//! per grid cell while appending milestones to a [`Journal`] file.
#![warn(missing_docs)]
mod data;
mod errors;
mod journal;
mod options;
mod output;

pub use data::*;
pub use errors::*;
pub use journal::*;
pub use options::*;
pub use output::*;

use krigrid_kriging::{
    for_each_cell, par_predict_grid, predict_grid, samples_dataset, Grid, GridCell,
    OrdinaryKriging, WithVariance,
};
use linfa::traits::Fit;
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::sync::Arc;

/// Estimate every grid cell, with Kriging variance when requested
pub fn estimate_grid(
    grid: &Grid<f64>,
    kriging: &OrdinaryKriging<f64>,
    with_variance: bool,
    parallel: bool,
) -> Vec<GridCell<f64>> {
    match (with_variance, parallel) {
        (true, true) => par_predict_grid(grid, &WithVariance(kriging)),
        (true, false) => predict_grid(grid, &WithVariance(kriging)),
        (false, true) => par_predict_grid(grid, kriging),
        (false, false) => predict_grid(grid, kriging),
    }
}

/// Write the grid as delimited text. Cells are streamed to the writer
/// as they are estimated unless rows are estimated in parallel.
pub fn write_grid<W: Write>(
    writer: W,
    grid: &Grid<f64>,
    kriging: &OrdinaryKriging<f64>,
    args: &Args,
) -> Result<()> {
    let mut writer = GridWriter::new(writer, args.delimiter, args.with_variance);
    if args.parallel {
        for cell in estimate_grid(grid, kriging, args.with_variance, true) {
            writer.write_cell(&cell)?;
        }
    } else if args.with_variance {
        for_each_cell(grid, &WithVariance(kriging), |cell| writer.write_cell(&cell))?;
    } else {
        for_each_cell(grid, kriging, |cell| writer.write_cell(&cell))?;
    }
    writer.finish()
}

/// Run the interpolation described by the command line arguments
pub fn run(args: &Args) -> Result<()> {
    let grid = args.grid()?;
    let params = args.kriging_params()?;

    let samples = match &args.input {
        Some(path) => read_samples(BufReader::new(File::open(path)?))?,
        None => read_samples(io::stdin().lock())?,
    };
    info!("read {} data points", samples.len());

    let journal = Arc::new(Journal::new(&args.log_file));
    journal.interpolation_started(samples.len(), &grid);
    let kriging = params
        .observer(journal.clone())
        .fit(&samples_dataset(&samples))?;

    match &args.output {
        Some(path) if is_npy(path) => {
            let cells = estimate_grid(&grid, &kriging, args.with_variance, args.parallel);
            write_cells_npy(path, &cells, args.with_variance)?;
        }
        Some(path) => write_grid(BufWriter::new(File::create(path)?), &grid, &kriging, args)?,
        None => write_grid(io::stdout().lock(), &grid, &kriging, args)?,
    }
    journal.interpolation_finished();
    Ok(())
}
