//! Integration tests for the `example run` command.
use buildopt::cli::RunOpts;
use buildopt::cli::example::handle_example_run_command;
use buildopt::output::read_results;
use buildopt::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("BUILDOPT_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        ..RunOpts::default()
    };
    handle_example_run_command("detailed_ventilation", &opts, Some(Settings::default())).unwrap();

    let records = read_results(tempdir.path()).unwrap();
    assert!(records.iter().any(|r| r.record == "x_vent"));
    assert!(records.iter().any(|r| r.record == "Q_vent_loss"));
}
