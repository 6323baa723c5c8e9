//! Program settings, read from `settings.toml` in the user's config directory.
//!
//! Every setting is optional. Command-line flags take precedence over the file, and the
//! `BUILDOPT_LOG_LEVEL` environment variable takes precedence over `log_level`.
use crate::get_buildopt_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use crate::pareto::DEFAULT_POINTS;
use anyhow::{Context, Result, ensure};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    get_buildopt_config_dir().join(SETTINGS_FILE_NAME)
}

/// Program settings from config file
#[derive(Debug, Clone, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// The default program log level (off, error, warn, info, debug or trace)
    pub log_level: String,
    /// Whether to replace the contents of an existing output folder
    pub overwrite: bool,
    /// Whether to write the constraint group sizes and the cluster assignment of each day
    pub debug_model: bool,
    /// Number of points between the two ends of the cost-emission front
    pub pareto_points: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.into(),
            overwrite: false,
            debug_model: false,
            pareto_points: DEFAULT_POINTS,
        }
    }
}

impl Settings {
    /// Read the program settings file, using defaults if there is none
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", file_path.display()))?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.pareto_points > 0, "pareto_points must be at least 1");
        Ok(())
    }

    /// A settings file with every setting commented out and explained
    pub fn default_file_contents() -> String {
        let defaults = toml::Table::try_from(Settings::default())
            .expect("Could not convert settings to TOML");

        let mut out = String::from(
            "# buildopt program settings\n# Remove the leading '#' from a setting to change it.\n",
        );
        for (field, value) in &defaults {
            let docs = Settings::get_field_docs(field).expect("Missing doc comment for field");
            out.push('\n');
            for line in docs.lines() {
                out.push_str(&format!("# # {}\n", line.trim()));
            }
            out.push_str(&format!("# {field} = {value}\n"));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_without_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "log_level = \"warn\"\npareto_points = 3\n").unwrap();

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".into(),
                pareto_points: 3,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_load_invalid_points() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "pareto_points = 0\n").unwrap();
        let err = Settings::load_from_path(&file_path).unwrap_err();
        assert_eq!(err.root_cause().to_string(), "pareto_points must be at least 1");
    }

    #[test]
    fn test_default_file_contents_round_trip() {
        let contents = Settings::default_file_contents();
        assert!(contents.contains("# log_level = \"info\"\n"));
        assert!(contents.contains("# # Number of points between the two ends"));

        // Uncommenting every setting gives the defaults back
        let uncommented: String = contents
            .lines()
            .filter_map(|line| line.strip_prefix("# "))
            .filter(|line| line.contains(" = "))
            .map(|line| format!("{line}\n"))
            .collect();
        let settings: Settings = toml::from_str(&uncommented).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
