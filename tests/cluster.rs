//! Integration tests for the `cluster` command.
use buildopt::cli::handle_cluster_command;
use buildopt::output::{
    CLUSTERED_SERIES_FILE_NAME, REPRESENTATIVE_DAYS_FILE_NAME, RESULTS_FILE_NAME,
};
use buildopt::settings::Settings;
use std::path::Path;
use tempfile::tempdir;

/// An integration test for the `cluster` command.
#[test]
fn test_handle_cluster_command() {
    unsafe { std::env::set_var("BUILDOPT_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("days");
    handle_cluster_command(
        Path::new("demos/simple"),
        Some(&output_dir),
        Some(Settings::default()),
    )
    .unwrap();

    assert!(output_dir.join(CLUSTERED_SERIES_FILE_NAME).is_file());
    assert!(!output_dir.join(RESULTS_FILE_NAME).exists());

    let mut reader =
        csv::Reader::from_path(output_dir.join(REPRESENTATIVE_DAYS_FILE_NAME)).unwrap();
    let weights: Vec<f64> = reader
        .records()
        .map(|row| row.unwrap()[2].parse().unwrap())
        .collect();
    assert_eq!(weights.len(), 6);
    assert!((weights.iter().sum::<f64>() - 365.0).abs() < 1e-9);
}
