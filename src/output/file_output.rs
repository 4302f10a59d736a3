//! Writes the averaged results to CSV files.
//!
//! Two kinds of file are written into the output directory:
//! * `time_series.csv`, one row per step with the temperature, level populations and
//!   per-level mean velocities. Unpopulated levels are left as empty cells.
//! * `snapshot_<percent>.csv`, the position and velocity of every atom at the recorded
//!   step closest to each fraction of [SNAPSHOT_FRACTIONS].

use crate::atom::HyperfineLevel;
use crate::averager::EnsembleAverageResult;
use crate::ensemble::TimeSeries;
use crate::error::{MotError, Result};
use csv::Writer;
use log::info;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Fractions of the run at which the atomic distributions are written.
pub const SNAPSHOT_FRACTIONS: [f64; 5] = [0.0, 0.2, 0.5, 0.8, 1.0];

pub const TIME_SERIES_FILE_NAME: &str = "time_series.csv";

fn output_error(path: &Path, source: csv::Error) -> MotError {
    MotError::Output {
        path: path.to_path_buf(),
        source,
    }
}

fn create_writer(path: &Path) -> Result<Writer<File>> {
    Writer::from_path(path).map_err(|err| output_error(path, err))
}

/// Header of the time series table.
pub fn time_series_header() -> Vec<String> {
    let mut header = vec!["time".to_string(), "temperature".to_string()];
    for level in HyperfineLevel::ALL.iter() {
        header.push(format!("population_{:?}", level));
    }
    for level in HyperfineLevel::ALL.iter() {
        header.push(format!("velocity_{:?}", level));
    }
    header
}

/// Writes the per-step table of `series` to `path`.
pub fn write_time_series(path: &Path, series: &TimeSeries) -> Result<()> {
    let mut writer = create_writer(path)?;
    writer
        .write_record(time_series_header())
        .map_err(|err| output_error(path, err))?;
    for i in 0..series.len() {
        let mut record = vec![
            series.times[i].to_string(),
            series.temperatures[i].to_string(),
        ];
        record.extend(series.level_populations[i].iter().map(|p| p.to_string()));
        record.extend(
            series.level_velocities[i]
                .0
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record).map_err(|err| output_error(path, err))?;
    }
    writer
        .flush()
        .map_err(|err| output_error(path, err.into()))
}

/// Index into the recorded snapshots of the one closest to `fraction` of the run.
pub fn snapshot_for_fraction(series: &TimeSeries, fraction: f64) -> Option<usize> {
    if series.is_empty() {
        return None;
    }
    let target = fraction.max(0.0).min(1.0) * (series.len() - 1) as f64;
    series
        .snapshot_steps
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            let da = (**a as f64 - target).abs();
            let db = (**b as f64 - target).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(index, _)| index)
}

/// Writes the atom positions and velocities of one recorded snapshot to `path`.
pub fn write_snapshot(path: &Path, series: &TimeSeries, snapshot: usize) -> Result<()> {
    let mut writer = create_writer(path)?;
    writer
        .write_record(&["atom", "position", "velocity"])
        .map_err(|err| output_error(path, err))?;
    let positions = &series.positions[snapshot];
    let velocities = &series.velocities[snapshot];
    for (atom, (position, velocity)) in positions.iter().zip(velocities.iter()).enumerate() {
        writer
            .write_record(&[
                atom.to_string(),
                position.to_string(),
                velocity.to_string(),
            ])
            .map_err(|err| output_error(path, err))?;
    }
    writer
        .flush()
        .map_err(|err| output_error(path, err.into()))
}

/// Writes the time series and the distribution snapshots of `result` into `directory`.
///
/// Returns the paths of the files written.
pub fn write_results(directory: &Path, result: &EnsembleAverageResult) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory).map_err(|source| MotError::OutputDirectory {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    let path = directory.join(TIME_SERIES_FILE_NAME);
    write_time_series(&path, &result.series)?;
    written.push(path);

    for fraction in SNAPSHOT_FRACTIONS.iter() {
        if let Some(snapshot) = snapshot_for_fraction(&result.series, *fraction) {
            let percent = (fraction * 100.0).round() as u32;
            let path = directory.join(format!("snapshot_{:03}.csv", percent));
            write_snapshot(&path, &result.series, snapshot)?;
            written.push(path);
        }
    }
    info!("Wrote {} files to {}.", written.len(), directory.display());
    Ok(written)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::observables::LevelVelocities;
    use nalgebra::Vector4;

    fn series() -> TimeSeries {
        let n = 11;
        TimeSeries {
            times: (0..n).map(|i| i as f64 * 0.1).collect(),
            temperatures: vec![1.5; n],
            level_populations: vec![Vector4::new(0.5, 0.5, 0.0, 0.0); n],
            level_velocities: vec![LevelVelocities([Some(0.25), Some(-0.25), None, None]); n],
            snapshot_steps: vec![0, 4, 8],
            positions: vec![vec![1.0, 2.0]; 3],
            velocities: vec![vec![3.0, 4.0]; 3],
        }
    }

    fn temp_directory(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rb87_mot_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_snapshot_for_fraction() {
        let series = series();
        assert_eq!(snapshot_for_fraction(&series, 0.0), Some(0));
        assert_eq!(snapshot_for_fraction(&series, 0.5), Some(1));
        assert_eq!(snapshot_for_fraction(&series, 0.8), Some(2));
        assert_eq!(snapshot_for_fraction(&series, 1.0), Some(2));
        let empty = TimeSeries {
            times: vec![],
            ..series
        };
        assert_eq!(snapshot_for_fraction(&empty, 0.5), None);
    }

    #[test]
    fn test_write_time_series() {
        let directory = temp_directory("time_series");
        fs::create_dir_all(&directory).expect("could not create directory");
        let path = directory.join(TIME_SERIES_FILE_NAME);
        write_time_series(&path, &series()).expect("could not write");

        let mut reader = csv::Reader::from_path(&path).expect("could not read");
        let header = reader.headers().expect("no header").clone();
        assert_eq!(header.len(), 10);
        assert_eq!(&header[0], "time");
        assert_eq!(&header[2], "population_F1");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("bad row")).collect();
        assert_eq!(rows.len(), 11);
        assert_eq!(&rows[0][1], "1.5");
        assert_eq!(&rows[0][6], "0.25");
        assert_eq!(&rows[0][8], "");
        fs::remove_dir_all(&directory).ok();
    }

    #[test]
    fn test_write_results() {
        let directory = temp_directory("results");
        let result = EnsembleAverageResult {
            n_simulations: 2,
            series: series(),
        };
        let written = write_results(&directory, &result).expect("could not write");
        assert_eq!(written.len(), 1 + SNAPSHOT_FRACTIONS.len());
        let mut reader = csv::Reader::from_path(directory.join("snapshot_050.csv"))
            .expect("could not read snapshot");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("bad row")).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "2");
        assert_eq!(&rows[1][2], "4");
        fs::remove_dir_all(&directory).ok();
    }
}
