//! Code for writing metadata to file
use crate::optimisation::ScenarioResult;
use crate::solver::SolveStatus;
use anyhow::{Context, Result};
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Version of the layout of `results.csv`
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct Metadata<'a> {
    schema_version: u32,
    run: RunMetadata<'a>,
    program: ProgramMetadata<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    solver: Option<SolverMetadata>,
    platform: PlatformMetadata,
}

/// Information about the model run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the scenario which was run
    model_path: &'a Path,
    /// The date and time on which the run started
    datetime: String,
}

impl<'a> RunMetadata<'a> {
    fn new(model_path: &'a Path) -> Self {
        let dt = Local::now();
        Self {
            model_path,
            datetime: dt.to_rfc2822(),
        }
    }
}

#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            is_debug: cfg!(debug_assertions),
        }
    }
}

/// Outcome of the solve
#[derive(Serialize)]
struct SolverMetadata {
    /// `optimal` or `timed_out`
    status: &'static str,
    objective: f64,
    /// Solve time (s)
    runtime: f64,
    /// Relative optimality gap
    gap: f64,
}

impl SolverMetadata {
    fn new(result: &ScenarioResult) -> Self {
        Self {
            status: match result.status {
                SolveStatus::Optimal => "optimal",
                SolveStatus::TimedOut { .. } => "timed_out",
            },
            objective: result.objective,
            runtime: result.runtime,
            gap: result.gap,
        }
    }
}

/// Information about the platform on which buildopt is running.
///
/// The fields correspond to different data available from the [`PlatformInfo`] struct.
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl Default for PlatformMetadata {
    fn default() -> Self {
        let info = PlatformInfo::new().expect("Unable to determine platform info");
        Self {
            sysname: info.sysname().to_string_lossy().into(),
            nodename: info.nodename().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        }
    }
}

/// Write metadata to the specified output path in TOML format
pub fn write_metadata(
    output_path: &Path,
    model_path: &Path,
    result: Option<&ScenarioResult>,
) -> Result<()> {
    let metadata = Metadata {
        schema_version: SCHEMA_VERSION,
        run: RunMetadata::new(model_path),
        program: ProgramMetadata::default(),
        solver: result.map(SolverMetadata::new),
        platform: PlatformMetadata::default(),
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}

/// The part of the metadata needed to interpret the results
#[derive(Deserialize)]
struct SchemaMetadata {
    schema_version: u32,
}

/// Read the schema version of the results in an output folder
pub fn read_schema_version(output_path: &Path) -> Result<u32> {
    let file_path = output_path.join(METADATA_FILE_NAME);
    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("No results found at {}", output_path.display()))?;
    let metadata: SchemaMetadata = toml::from_str(&contents)
        .with_context(|| format!("Could not parse {}", file_path.display()))?;

    Ok(metadata.schema_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tempfile::tempdir;

    #[test]
    fn test_write_metadata() {
        let dir = tempdir().unwrap();
        let result = ScenarioResult {
            records: Vec::new(),
            objective: 10.0,
            total_cost: 10.0,
            emission: 1.0,
            runtime: 2.0,
            gap: 0.05,
            status: SolveStatus::TimedOut { gap: 0.05 },
            constraint_groups: IndexMap::new(),
        };
        write_metadata(dir.path(), Path::new("scenario"), Some(&result)).unwrap();

        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        assert!(contents.starts_with("schema_version = 1\n"));
        assert!(contents.contains("status = \"timed_out\""));
        assert_eq!(read_schema_version(dir.path()).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_write_metadata_without_solve() {
        let dir = tempdir().unwrap();
        write_metadata(dir.path(), Path::new("scenario"), None).unwrap();
        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        assert!(!contents.contains("[solver]"));
    }
}
