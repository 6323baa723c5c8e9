//! The module responsible for writing output data to disk.
use crate::clustering::ClusteredData;
use crate::optimisation::{ResultRecord, ScenarioResult};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub mod metadata;
pub use metadata::{SCHEMA_VERSION, read_schema_version, write_metadata};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "buildopt_results";

/// The output file name for the result records
pub const RESULTS_FILE_NAME: &str = "results.csv";

/// The output file name for the representative days
pub const REPRESENTATIVE_DAYS_FILE_NAME: &str = "representative_days.csv";

/// The output file name for the clustered time series
pub const CLUSTERED_SERIES_FILE_NAME: &str = "clustered_series.csv";

/// The output file name for the number of rows in each constraint group
const CONSTRAINT_GROUPS_FILE_NAME: &str = "debug_constraint_groups.csv";

/// The output file name for the assignment of days to representative days
const CLUSTERS_FILE_NAME: &str = "debug_clusters.csv";

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model.
///
/// # Returns
///
/// Whether an existing, non-empty directory is being overwritten, or an error if it exists and
/// `allow_overwrite` is false.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then delete it if allowed
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to overwrite it."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Serialise rows to a CSV file in the output folder.
///
/// The rows are first written to a temporary file which is then moved into place, so a file with
/// this name is only ever complete.
fn write_csv_atomically<I, T>(output_dir: &Path, file_name: &str, rows: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let file_path = output_dir.join(file_name);
    let temp_file = NamedTempFile::new_in(output_dir)
        .with_context(|| format!("Could not create temporary file in {}", output_dir.display()))?;

    let mut writer = csv::Writer::from_writer(temp_file);
    for row in rows {
        writer.serialize(row)?;
    }
    let temp_file = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Could not flush {file_name}: {}", err.error()))?;
    temp_file
        .persist(&file_path)
        .with_context(|| format!("Could not write {}", file_path.display()))?;

    Ok(())
}

/// Write the result records of a scenario to `results.csv`
pub fn write_results(output_dir: &Path, result: &ScenarioResult) -> Result<()> {
    write_csv_atomically(output_dir, RESULTS_FILE_NAME, &result.records)
}

/// Read the result records from an output folder, in file order.
///
/// A folder without a results file has not been computed yet, which is reported as an error.
pub fn read_results(output_dir: &Path) -> Result<Vec<ResultRecord>> {
    let version = read_schema_version(output_dir)?;
    ensure!(
        version == SCHEMA_VERSION,
        "Unsupported results schema version {version} (expected {SCHEMA_VERSION})"
    );

    let file_path = output_dir.join(RESULTS_FILE_NAME);
    let records = csv::Reader::from_path(&file_path)
        .with_context(|| format!("No results found at {}", file_path.display()))?
        .into_deserialize()
        .try_collect()
        .with_context(|| format!("Could not read {}", file_path.display()))?;

    Ok(records)
}

/// A representative day and the number of days it stands for
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct RepresentativeDayRow {
    day: usize,
    medoid: usize,
    weight: f64,
}

/// One value of a clustered time series
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ClusteredSeriesRow {
    series: String,
    day: usize,
    time_step: usize,
    value: f64,
}

/// Write the representative days, their weights and their profiles
pub fn write_clustered_data(output_dir: &Path, clustered: &ClusteredData) -> Result<()> {
    let days = clustered
        .medoids
        .iter()
        .zip(&clustered.weights)
        .enumerate()
        .map(|(day, (&medoid, &weight))| RepresentativeDayRow {
            day,
            medoid,
            weight,
        });
    write_csv_atomically(output_dir, REPRESENTATIVE_DAYS_FILE_NAME, days)?;

    let series = clustered.series.iter().flat_map(|(kind, profile)| {
        profile.iter().enumerate().flat_map(move |(day, values)| {
            values
                .iter()
                .enumerate()
                .map(move |(time_step, &value)| ClusteredSeriesRow {
                    series: kind.to_string(),
                    day,
                    time_step,
                    value,
                })
        })
    });
    write_csv_atomically(output_dir, CLUSTERED_SERIES_FILE_NAME, series)
}

/// Number of rows in a constraint group
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ConstraintGroupRow {
    group: String,
    rows: usize,
}

/// The representative day an original day is assigned to
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ClusterRow {
    day: usize,
    representative: usize,
}

/// Write extra information for debugging the model
pub fn write_debug_info(
    output_dir: &Path,
    constraint_groups: &IndexMap<String, usize>,
    clustered: &ClusteredData,
) -> Result<()> {
    let groups = constraint_groups
        .iter()
        .map(|(group, &rows)| ConstraintGroupRow {
            group: group.clone(),
            rows,
        });
    write_csv_atomically(output_dir, CONSTRAINT_GROUPS_FILE_NAME, groups)?;

    let clusters = clustered
        .assignment
        .iter()
        .enumerate()
        .map(|(day, &representative)| ClusterRow {
            day,
            representative,
        });
    write_csv_atomically(output_dir, CLUSTERS_FILE_NAME, clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::clustered;
    use crate::solver::SolveStatus;
    use itertools::assert_equal;
    use rstest::rstest;
    use std::path::Path;
    use tempfile::tempdir;

    fn scenario_result() -> ScenarioResult {
        let record = |record: &str, key: &str, day, time_step, value| ResultRecord {
            record: record.into(),
            key: key.into(),
            day,
            time_step,
            value,
        };
        ScenarioResult {
            records: vec![
                record("x", "boiler", None, None, 1.0),
                record("heat", "boiler", Some(0), Some(1), 4.5),
                record("soc_init", "tes", Some(1), None, 2.0),
                record("c_total", "", None, None, 1234.5),
            ],
            objective: 1234.5,
            total_cost: 1234.5,
            emission: 3.2,
            runtime: 0.1,
            gap: 0.0,
            status: SolveStatus::Optimal,
            constraint_groups: IndexMap::from([("thermal_balance".to_string(), 8)]),
        }
    }

    #[test]
    fn test_get_output_dir() {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("my_house");
        fs::create_dir(&model_dir).unwrap();
        assert_eq!(
            get_output_dir(&model_dir).unwrap(),
            Path::new("buildopt_results").join("my_house")
        );
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        // New and empty folders are fine
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // A folder with contents needs permission
        fs::write(output_dir.join("results.csv"), "").unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(fs::read_dir(&output_dir).unwrap().next().is_none());
    }

    #[test]
    fn test_write_and_read_results() {
        let dir = tempdir().unwrap();
        let result = scenario_result();
        write_results(dir.path(), &result).unwrap();
        write_metadata(dir.path(), Path::new("scenario"), Some(&result)).unwrap();

        let contents = fs::read_to_string(dir.path().join(RESULTS_FILE_NAME)).unwrap();
        assert!(contents.starts_with("record,key,day,time_step,value\nx,boiler,,,1.0\n"));
        assert_equal(read_results(dir.path()).unwrap(), result.records);

        // No temporary files are left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_read_results_missing() {
        let dir = tempdir().unwrap();
        assert!(read_results(dir.path()).is_err());
    }

    #[test]
    fn test_read_results_unknown_schema() {
        let dir = tempdir().unwrap();
        write_results(dir.path(), &scenario_result()).unwrap();
        fs::write(dir.path().join("metadata.toml"), "schema_version = 99\n").unwrap();
        assert_eq!(
            read_results(dir.path()).unwrap_err().to_string(),
            "Unsupported results schema version 99 (expected 1)"
        );
    }

    #[rstest]
    fn test_write_clustered_data(clustered: ClusteredData) {
        let dir = tempdir().unwrap();
        write_clustered_data(dir.path(), &clustered).unwrap();

        let days: Vec<RepresentativeDayRow> =
            csv::Reader::from_path(dir.path().join(REPRESENTATIVE_DAYS_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_equal(
            days,
            [
                RepresentativeDayRow {
                    day: 0,
                    medoid: 10,
                    weight: 200.0,
                },
                RepresentativeDayRow {
                    day: 1,
                    medoid: 250,
                    weight: 165.0,
                },
            ],
        );

        let series: Vec<ClusteredSeriesRow> =
            csv::Reader::from_path(dir.path().join(CLUSTERED_SERIES_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_eq!(series.len(), clustered.series.len() * 2 * 4);
    }

    #[rstest]
    fn test_write_debug_info(clustered: ClusteredData) {
        let dir = tempdir().unwrap();
        let result = scenario_result();
        write_debug_info(dir.path(), &result.constraint_groups, &clustered).unwrap();

        let groups: Vec<ConstraintGroupRow> =
            csv::Reader::from_path(dir.path().join(CONSTRAINT_GROUPS_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_equal(
            groups,
            [ConstraintGroupRow {
                group: "thermal_balance".into(),
                rows: 8,
            }],
        );

        let clusters: Vec<ClusterRow> = csv::Reader::from_path(dir.path().join(CLUSTERS_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_eq!(clusters.len(), 365);
        assert_eq!(clusters[250].representative, 1);
    }
}
