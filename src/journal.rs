//! Interpolation journal: timestamped milestone lines appended to a log file.

use chrono::Local;
use krigrid_kriging::{Grid, PipelineObserver, Stage};
use log::{debug, info, warn};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Journal file used when none is specified
pub const DEFAULT_LOG_FILE: &str = "/tmp/expolis-interpolation.log";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Pipeline observer appending milestones to a journal file.
///
/// The file is opened in append mode for each line, failures to write are
/// reported as warnings and never interrupt the interpolation.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Constructor
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Journal {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Journal file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a timestamped message
    pub fn message(&self, message: &str) {
        if let Err(err) = self.append(message) {
            warn!("Cannot write to journal {}: {}", self.path.display(), err);
        }
    }

    fn append(&self, message: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} {}", Local::now().format(TIME_FORMAT), message)
    }

    /// First line of an interpolation run
    pub fn interpolation_started(&self, n_rows: usize, grid: &Grid<f64>) {
        self.message(&format!(
            "applying interpolation method kriging on {} rows of data, to produce a grid of {}",
            n_rows, grid
        ));
    }

    /// Last line of an interpolation run, once the grid is written
    pub fn interpolation_finished(&self) {
        self.message("interpolation finished");
    }
}

impl PipelineObserver for Journal {
    fn record(&self, stage: Stage, detail: &str) {
        debug!("{}: {}", stage, detail);
        match stage {
            Stage::VariogramStarted => self.message("computing variogram"),
            Stage::VariogramFitted => info!("variogram computed"),
            Stage::SystemStarted => self.message("running kriging algorithm"),
            Stage::SystemFactorized => info!("kriging finished"),
            Stage::GridStarted => self.message("writing interpolation"),
            Stage::GridFinished => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn messages(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| {
                let (stamp, message) = line.split_once(' ').unwrap();
                assert!(chrono::NaiveDateTime::parse_from_str(stamp, TIME_FORMAT).is_ok());
                message.to_string()
            })
            .collect()
    }

    #[test]
    fn test_journal_lines() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("interpolation.log"));
        let grid = Grid::new(38.7, 38.8, -9.3, -9.1, 0.01).unwrap();
        journal.interpolation_started(12, &grid);
        journal.record(Stage::VariogramStarted, "");
        journal.record(Stage::VariogramFitted, "");
        journal.record(Stage::SystemStarted, "");
        journal.record(Stage::SystemFactorized, "");
        journal.record(Stage::GridStarted, "");
        journal.record(Stage::GridFinished, "");
        journal.interpolation_finished();
        assert_eq!(
            messages(journal.path()),
            vec![
                "applying interpolation method kriging on 12 rows of data, to produce a grid of 38.7X38.8 -9.3X-9.1",
                "computing variogram",
                "running kriging algorithm",
                "writing interpolation",
                "interpolation finished",
            ]
        );
    }

    #[test]
    fn test_journal_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interpolation.log");
        fs::write(&path, "2024-01-01T00:00:00 previous run\n").unwrap();
        Journal::new(&path).message("next run");
        assert_eq!(messages(&path), vec!["previous run", "next run"]);
    }

    #[test]
    fn test_unwritable_journal_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("missing").join("interpolation.log"));
        journal.message("lost");
        assert!(!journal.path().exists());
    }
}
