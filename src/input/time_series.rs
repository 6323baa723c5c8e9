//! Code for reading the annual time series.
use super::*;
use crate::model::VentilationMode;
use crate::time_series::{SeriesKind, TimeSeriesSet};
use indexmap::IndexMap;
use strum::IntoEnumIterator;

const TIME_SERIES_DIR_NAME: &str = "time_series";

/// Read a file with one value per line and no header
fn read_series_file(file_path: &Path) -> Result<Vec<f64>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize::<f64>()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))
}

/// Clamp values which must not be negative at zero
fn clamp_series(kind: SeriesKind, values: &mut [f64]) {
    if kind.allows_negative() {
        return;
    }

    for value in values.iter_mut() {
        *value = value.max(0.0);
    }
}

/// Read the annual time series from the `time_series` subdirectory.
///
/// Series which are not required for the ventilation mode are read only if present.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
/// * `days_per_year` - Number of days the series cover
/// * `ventilation` - The ventilation mode of the scenario
pub fn read_time_series(
    model_dir: &Path,
    days_per_year: usize,
    ventilation: VentilationMode,
) -> Result<TimeSeriesSet> {
    let dir = model_dir.join(TIME_SERIES_DIR_NAME);
    let mut series = IndexMap::new();
    for kind in SeriesKind::iter() {
        let file_path = dir.join(format!("{kind}.csv"));
        if !file_path.is_file() {
            ensure!(
                !kind.is_required(ventilation),
                "Missing time series file {}",
                file_path.display()
            );
            continue;
        }

        let mut values = read_series_file(&file_path)?;
        clamp_series(kind, &mut values);
        series.insert(kind, values);
    }

    TimeSeriesSet::new(days_per_year, series).with_context(|| input_err_msg(&dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_series(dir: &Path, kind: SeriesKind, values: &[f64]) {
        let contents = values.iter().map(|v| format!("{v}\n")).collect::<String>();
        fs::write(dir.join(format!("{kind}.csv")), contents).unwrap();
    }

    #[test]
    fn test_read_time_series() {
        let root = tempdir().unwrap();
        let dir = root.path().join(TIME_SERIES_DIR_NAME);
        fs::create_dir(&dir).unwrap();
        for kind in SeriesKind::iter().filter(|k| *k != SeriesKind::WindSpeed) {
            write_series(&dir, kind, &[-1.0, 2.0, 3.0, 4.0]);
        }

        let set = read_time_series(root.path(), 2, VentilationMode::Simple).unwrap();
        assert_eq!(set.time_steps, 2);
        assert!(set.get(SeriesKind::WindSpeed).is_none());
        assert_eq!(set.get(SeriesKind::Dhw).unwrap()[0], 0.0);
        assert_eq!(set.get(SeriesKind::Temperature).unwrap()[0], -1.0);

        // Wind speed is required for the detailed mode
        assert!(read_time_series(root.path(), 2, VentilationMode::Detailed).is_err());

        // Length must be a multiple of the number of days
        assert!(read_time_series(root.path(), 3, VentilationMode::Simple).is_err());
    }
}
