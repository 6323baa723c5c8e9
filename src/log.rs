//! Program logging.
//!
//! Messages go to the terminal, in colour when it is one. Warnings and errors go to stderr and
//! everything else to stdout. When a run has an output folder, the messages are also written to
//! `buildopt_info.log` and `buildopt_error.log` there. Every line carries the wall-clock time and
//! the time elapsed since the logger started, as solves can take a while.
use anyhow::{Context, Result, bail, ensure};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

/// Set once the logger is installed; holds the start time of the log
static LOGGER_START: OnceLock<Instant> = OnceLock::new();

/// The environment variable used to override the log level
pub const LOG_LEVEL_ENV_VAR: &str = "BUILDOPT_LOG_LEVEL";

/// The log level used when neither `BUILDOPT_LOG_LEVEL` nor the settings file give one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Messages up to `info`
const LOG_INFO_FILE_NAME: &str = "buildopt_info.log";

/// Warnings and errors
const LOG_ERROR_FILE_NAME: &str = "buildopt_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_START.get().is_some()
}

/// Parse a log level string into a [`LevelFilter`]
fn parse_level(log_level: &str) -> Result<LevelFilter> {
    Ok(match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

/// Pick the log level: the environment variable wins over the settings file
fn resolve_level(from_env: Option<&str>, from_settings: Option<&str>) -> Result<LevelFilter> {
    parse_level(from_env.or(from_settings).unwrap_or(DEFAULT_LOG_LEVEL))
}

/// Create (or truncate) a log file in the output folder
fn create_log_file(output_dir: &Path, file_name: &str) -> Result<File> {
    let path = output_dir.join(file_name);
    File::create(&path).with_context(|| format!("Could not create log file {}", path.display()))
}

/// Initialise the program logger.
///
/// # Arguments
///
/// * `log_level_from_settings` - The log level from `settings.toml`, if any
/// * `output_dir` - Folder for the log files. No files are written if `None`.
pub fn init(log_level_from_settings: Option<&str>, output_dir: Option<&Path>) -> Result<()> {
    ensure!(!is_logger_initialised(), "Logger already initialised");

    let from_env = env::var(LOG_LEVEL_ENV_VAR).ok();
    let log_level = resolve_level(from_env.as_deref(), log_level_from_settings)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);
    let stdout_colour = std::io::stdout().is_terminal().then_some(colours);
    let stderr_colour = std::io::stderr().is_terminal().then_some(colours);

    let start = Instant::now();
    let mut dispatch = Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log(out, message, record, start, stdout_colour.as_ref());
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log(out, message, record, start, stderr_colour.as_ref());
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(output_dir) = output_dir {
        // The files always get at least the info and warning messages, whatever the terminal shows
        dispatch = dispatch
            .chain(
                Dispatch::new()
                    .filter(|metadata| metadata.level() > LevelFilter::Warn)
                    .format(move |out, message, record| {
                        write_log(out, message, record, start, None);
                    })
                    .level(log_level.max(LevelFilter::Info))
                    .chain(create_log_file(output_dir, LOG_INFO_FILE_NAME)?),
            )
            .chain(
                Dispatch::new()
                    .format(move |out, message, record| {
                        write_log(out, message, record, start, None);
                    })
                    .level(LevelFilter::Warn)
                    .chain(create_log_file(output_dir, LOG_ERROR_FILE_NAME)?),
            );
    }

    dispatch.apply()?;
    let _ = LOGGER_START.set(start);

    Ok(())
}

/// Format one log line, e.g. `[14:02:11 +35.2s INFO buildopt::clustering] ...`
fn write_log(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    start: Instant,
    colours: Option<&ColoredLevelConfig>,
) {
    match colours {
        Some(colours) => finish(out, message, record, start, &colours.color(record.level())),
        None => finish(out, message, record, start, &record.level()),
    }
}

fn finish(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    start: Instant,
    level: &dyn Display,
) {
    out.finish(format_args!(
        "[{} +{:.1}s {level} {}] {message}",
        Local::now().format("%H:%M:%S"),
        start.elapsed().as_secs_f64(),
        record.target()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("off", LevelFilter::Off)]
    #[case("WARN", LevelFilter::Warn)]
    #[case("info", LevelFilter::Info)]
    #[case("Trace", LevelFilter::Trace)]
    fn test_parse_level(#[case] level: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_level(level).unwrap(), expected);
    }

    #[test]
    fn test_parse_level_unknown() {
        assert_eq!(
            parse_level("verbose").unwrap_err().to_string(),
            "Unknown log level: verbose"
        );
    }

    #[rstest]
    #[case(Some("debug"), Some("warn"), LevelFilter::Debug)]
    #[case(None, Some("warn"), LevelFilter::Warn)]
    #[case(None, None, LevelFilter::Info)]
    fn test_resolve_level(
        #[case] from_env: Option<&str>,
        #[case] from_settings: Option<&str>,
        #[case] expected: LevelFilter,
    ) {
        assert_eq!(resolve_level(from_env, from_settings).unwrap(), expected);
    }
}
