use crate::errors::{KrigridError, Result};
use crate::journal::DEFAULT_LOG_FILE;
use clap::{Parser, ValueEnum};
use krigrid_kriging::{Distance, Grid, KrigingParams, DEFAULT_BETA};
use linfa::ParamGuard;
use std::path::PathBuf;

/// Distance between sample locations
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DistanceArg {
    /// Straight line distance in coordinate units
    Euclidean,
    /// Great circle distance in kilometers
    Haversine,
}

impl From<DistanceArg> for Distance {
    fn from(arg: DistanceArg) -> Distance {
        match arg {
            DistanceArg::Euclidean => Distance::Euclidean,
            DistanceArg::Haversine => Distance::Haversine,
        }
    }
}

/// Perform Kriging interpolation on a set of sparse geographic data.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input file to read, standard input when not specified
    #[arg(long, value_name = "FILENAME")]
    pub input: Option<PathBuf>,
    /// Output file of the interpolated grid (npy format when ending with .npy),
    /// standard output when not specified
    #[arg(long, value_name = "FILENAME")]
    pub output: Option<PathBuf>,
    /// Minimum latitude of the interpolated grid
    #[arg(long, allow_negative_numbers = true)]
    pub min_latitude: f64,
    /// Maximum latitude of the interpolated grid
    #[arg(long, allow_negative_numbers = true)]
    pub max_latitude: f64,
    /// Minimum longitude of the interpolated grid
    #[arg(long, allow_negative_numbers = true)]
    pub min_longitude: f64,
    /// Maximum longitude of the interpolated grid
    #[arg(long, allow_negative_numbers = true)]
    pub max_longitude: f64,
    /// Grid cell size in angles
    #[arg(long, value_name = "D", default_value_t = 0.001)]
    pub grid_cell_size: f64,
    /// Beta parameter used in the variogram
    #[arg(long, value_name = "B", default_value_t = DEFAULT_BETA)]
    pub beta: f64,
    /// Distance between locations
    #[arg(long, value_enum, default_value_t = DistanceArg::Euclidean)]
    pub distance: DistanceArg,
    /// Write Kriging variance as a fourth column
    #[arg(long)]
    pub with_variance: bool,
    /// Column delimiter of the text output, a single ASCII character or "tab"
    #[arg(long, value_name = "CHAR", default_value = "tab", value_parser = parse_delimiter)]
    pub delimiter: u8,
    /// Journal file where interpolation milestones are appended
    #[arg(long, value_name = "FILENAME", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
    /// Estimate grid rows in parallel
    #[arg(long)]
    pub parallel: bool,
    /// Be verbose about the interpolation process
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    match s {
        "tab" | "\\t" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(format!("expected a single ASCII character, got '{s}'")),
    }
}

impl Args {
    /// Output grid
    pub fn grid(&self) -> Result<Grid<f64>> {
        Grid::new(
            self.min_latitude,
            self.max_latitude,
            self.min_longitude,
            self.max_longitude,
            self.grid_cell_size,
        )
        .map_err(|err| KrigridError::InvalidOptionError(err.to_string()))
    }

    /// Kriging parameters, checked
    pub fn kriging_params(&self) -> Result<KrigingParams<f64>> {
        let params = KrigingParams::new(self.beta).distance(self.distance.into());
        params
            .check_ref()
            .map_err(|err| KrigridError::InvalidOptionError(err.to_string()))?;
        Ok(params)
    }
}
