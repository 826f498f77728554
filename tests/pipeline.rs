use approx::assert_abs_diff_eq;
use clap::Parser;
use krigrid::{run, Args, KrigridError};
use krigrid_kriging::KrigingError;
use ndarray::Array2;
use ndarray_npy::read_npy;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SAMPLES: &str = "4\n0 0 10\n1 0 20\n0 1 15\n1 1 18\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(samples: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("samples.txt"), samples).unwrap();
        Workspace { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn args(&self, output: &str, extra: &[&str]) -> Args {
        let input = self.path("samples.txt");
        let output = self.path(output);
        let log_file = self.path("interpolation.log");
        let mut argv = vec![
            "krigrid".to_string(),
            format!("--input={}", input.display()),
            format!("--output={}", output.display()),
            format!("--log-file={}", log_file.display()),
            "--min-latitude=0".to_string(),
            "--max-latitude=1".to_string(),
            "--min-longitude=0".to_string(),
            "--max-longitude=1".to_string(),
            "--grid-cell-size=0.5".to_string(),
            "--beta=1".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }
}

fn read_rows(path: &Path) -> Vec<Vec<f64>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').map(|v| v.parse().unwrap()).collect())
        .collect()
}

#[test]
fn test_grid_in_traversal_order() {
    let ws = Workspace::new(SAMPLES);
    run(&ws.args("grid.tsv", &[])).unwrap();

    let rows = read_rows(&ws.path("grid.tsv"));
    assert_eq!(rows.len(), 9);
    assert!(rows.iter().all(|row| row.len() == 3));
    let locations: Vec<_> = rows.iter().map(|row| (row[0], row[1])).collect();
    assert_eq!(
        locations,
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
    // exact at sample locations
    assert_abs_diff_eq!(rows[0][2], 10., epsilon = 1e-9);
    assert_abs_diff_eq!(rows[2][2], 20., epsilon = 1e-9);
    assert_abs_diff_eq!(rows[6][2], 15., epsilon = 1e-9);
    assert_abs_diff_eq!(rows[8][2], 18., epsilon = 1e-9);
    // bounded by sample values in between
    assert!(rows[4][2] > 10. && rows[4][2] < 20.);
}

#[test]
fn test_parallel_with_variance() {
    let ws = Workspace::new(SAMPLES);
    run(&ws.args("seq.tsv", &["--with-variance"])).unwrap();
    run(&ws.args("par.tsv", &["--with-variance", "--parallel"])).unwrap();

    let seq = read_rows(&ws.path("seq.tsv"));
    let par = read_rows(&ws.path("par.tsv"));
    assert_eq!(seq, par);
    assert!(seq.iter().all(|row| row.len() == 4 && row[3] >= 0.));
    assert_abs_diff_eq!(seq[0][3], 0., epsilon = 1e-9);
    assert!(seq[4][3] > seq[0][3]);
}

#[test]
fn test_delimiter() {
    let ws = Workspace::new(SAMPLES);
    run(&ws.args("grid.csv", &["--delimiter", ","])).unwrap();
    let content = fs::read_to_string(ws.path("grid.csv")).unwrap();
    assert_eq!(content.lines().count(), 9);
    assert!(content.lines().all(|line| line.split(',').count() == 3));
    assert!(content.starts_with("0.0,0.0,"));
}

#[test]
fn test_npy_output() {
    let ws = Workspace::new(SAMPLES);
    run(&ws.args("grid.npy", &["--with-variance"])).unwrap();
    let grid: Array2<f64> = read_npy(ws.path("grid.npy")).unwrap();
    assert_eq!(grid.dim(), (9, 4));
    assert_abs_diff_eq!(grid[[8, 2]], 18., epsilon = 1e-9);
}

#[test]
fn test_haversine_distance() {
    let ws = Workspace::new("3\n-9.14 38.71 20\n-9.13 38.72 25\n-9.15 38.73 30\n");
    let mut args = ws.args("grid.tsv", &["--distance", "haversine"]);
    args.min_latitude = 38.70;
    args.max_latitude = 38.74;
    args.min_longitude = -9.16;
    args.max_longitude = -9.12;
    args.grid_cell_size = 0.01;
    run(&args).unwrap();
    let rows = read_rows(&ws.path("grid.tsv"));
    assert_eq!(rows.len(), 25);
    assert!(rows.iter().all(|row| row[2].is_finite()));
}

#[test]
fn test_journal() {
    let ws = Workspace::new(SAMPLES);
    run(&ws.args("grid.tsv", &[])).unwrap();
    let journal = fs::read_to_string(ws.path("interpolation.log")).unwrap();
    let messages: Vec<_> = journal
        .lines()
        .map(|line| line.split_once(' ').unwrap().1)
        .collect();
    assert_eq!(
        messages,
        vec![
            "applying interpolation method kriging on 4 rows of data, to produce a grid of 0X1 0X1",
            "computing variogram",
            "running kriging algorithm",
            "writing interpolation",
            "interpolation finished",
        ]
    );
}

#[test]
fn test_options_checked_before_reading() {
    let ws = Workspace::new(SAMPLES);
    let mut args = ws.args("grid.tsv", &[]);
    args.input = Some(ws.path("missing.txt"));
    args.min_latitude = 2.;
    assert!(matches!(
        run(&args),
        Err(KrigridError::InvalidOptionError(_))
    ));
    assert!(!ws.path("interpolation.log").exists());

    args.min_latitude = 0.;
    assert!(matches!(run(&args), Err(KrigridError::IoError(_))));
}

#[test]
fn test_single_sample() {
    let ws = Workspace::new("1\n0 0 10\n");
    let res = run(&ws.args("grid.tsv", &[]));
    assert!(matches!(
        res,
        Err(KrigridError::KrigingError(KrigingError::InsufficientData(1)))
    ));
    assert!(!ws.path("grid.tsv").exists());
}

#[test]
fn test_readings_in_thousands() {
    let ws = Workspace::new("4\n0 0 10000\n1 0 20000\n0 1 15000\n1 1 18000\n");
    let mut args = ws.args("grid.tsv", &[]);
    args.beta = 0.015;
    run(&args).unwrap();
    let rows = read_rows(&ws.path("grid.tsv"));
    assert_eq!(rows.len(), 9);
    assert_abs_diff_eq!(rows[0][2], 10000., epsilon = 1e-6);
    assert_abs_diff_eq!(rows[8][2], 18000., epsilon = 1e-6);
}
