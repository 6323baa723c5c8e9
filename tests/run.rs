//! Integration tests for the `run` command.
use buildopt::cli::{RunOpts, handle_run_command};
use buildopt::output::{RESULTS_FILE_NAME, SCHEMA_VERSION, read_results, read_schema_version};
use buildopt::settings::Settings;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the demo scenario.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("BUILDOPT_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
        debug_model: true,
    };
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

    assert!(output_dir.join(RESULTS_FILE_NAME).is_file());
    assert!(output_dir.join("debug_constraint_groups.csv").is_file());
    assert_eq!(read_schema_version(&output_dir).unwrap(), SCHEMA_VERSION);

    let records = read_results(&output_dir).unwrap();
    assert_eq!(records.first().unwrap().record, "x");
    let c_total = records.iter().find(|r| r.record == "c_total").unwrap();
    let objective = records.iter().find(|r| r.record == "ObjVal").unwrap();
    assert!(c_total.value > 0.0);
    assert!((c_total.value - objective.value).abs() <= 1e-6 * c_total.value.abs().max(1.0));

    // Second time will fail because the logging is already initialised
    let opts = RunOpts {
        output_dir: Some(tempdir.path().join("again")),
        ..RunOpts::default()
    };
    assert_eq!(
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        "Failed to initialise logging."
    );
}
