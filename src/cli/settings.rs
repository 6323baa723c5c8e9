//! The `settings` subcommands.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// Subcommands for managing the program settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the settings file in a text editor, creating it first if needed
    Edit,
    /// Print the path of the settings file
    Path,
    /// Print a settings file with every setting at its default value
    DumpDefault,
    /// Print the settings currently in effect
    Show,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Edit => {
                let file_path = get_settings_file_path();
                if create_settings_file(&file_path)? {
                    println!("Created settings file: {}", file_path.display());
                }
                edit::edit_file(&file_path).with_context(|| {
                    format!("Could not open {} in an editor", file_path.display())
                })?;
            }
            Self::Path => println!("{}", get_settings_file_path().display()),
            Self::DumpDefault => print!("{}", Settings::default_file_contents()),
            Self::Show => {
                let settings = Settings::load().context("Failed to load settings.")?;
                print!("{}", toml::to_string(&settings)?);
            }
        }

        Ok(())
    }
}

/// Write the commented default settings to `file_path`, unless the file exists.
///
/// Returns whether a new file was written.
fn create_settings_file(file_path: &Path) -> Result<bool> {
    if file_path.is_file() {
        return Ok(false);
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }
    fs::write(file_path, Settings::default_file_contents())
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_settings_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config").join("settings.toml");

        assert!(create_settings_file(&file_path).unwrap());
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            Settings::default_file_contents()
        );

        // An existing file is left alone
        fs::write(&file_path, "overwrite = true\n").unwrap();
        assert!(!create_settings_file(&file_path).unwrap());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "overwrite = true\n");
    }
}
