//! Common routines for handling input data.
use crate::model::{Model, ScenarioOptions};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

pub mod building;
pub mod concepts;
pub mod devices;
pub mod economics;
pub mod subsidies;
pub mod tariffs;
pub mod time_series;
pub mod ventilation;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec.into_iter())
}

fn read_csv_internal<'a, T: DeserializeOwned + 'a>(file_path: &'a Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(value)
}

/// Read an f64, checking that it is greater than 0 and at most 1
pub fn deserialise_proportion_nonzero<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialise_proportion(deserialiser)?;
    if value == 0.0 {
        Err(serde::de::Error::custom("Value cannot be zero"))?;
    }

    Ok(value)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check that a value is finite and non-negative
pub fn check_non_negative(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite number >= 0 (got {value})"
    );

    Ok(())
}

/// Check that a value is finite and strictly positive
pub fn check_positive(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{name} must be a finite number > 0 (got {value})"
    );

    Ok(())
}

/// Check that a lower bound does not exceed the corresponding upper bound
pub fn check_bounds(min: f64, max: f64, name: &str) -> Result<()> {
    check_non_negative(min, &format!("{name} minimum"))?;
    check_non_negative(max, &format!("{name} maximum"))?;
    ensure!(
        min <= max,
        "{name}: minimum ({min}) must not exceed maximum ({max})"
    );

    Ok(())
}

/// Check that a set of shares sums to one (within a small tolerance)
pub fn check_values_sum_to_one<I>(values: I, name: &str) -> Result<()>
where
    I: IntoIterator<Item = f64>,
{
    let sum: f64 = values.into_iter().sum();
    ensure!(
        (sum - 1.0).abs() < 1e-6,
        "{name} must sum to one (got {sum})"
    );

    Ok(())
}

/// Check whether the slice is sorted and contains no duplicates
pub fn is_sorted_and_unique<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

/// Read a scenario from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
///
/// # Returns
///
/// The static scenario data or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    ensure!(
        model_dir.is_dir(),
        "Scenario directory {} does not exist",
        model_dir.display()
    );

    let options = ScenarioOptions::from_path(model_dir)?;
    let building = building::read_building(model_dir)?;
    let devices = devices::read_devices(model_dir)?;
    let economics = economics::read_economics(model_dir)?;
    let gas_tariffs = tariffs::read_gas_tariffs(model_dir)?;
    let electricity_tariffs = tariffs::read_electricity_tariffs(model_dir)?;
    let subsidies = subsidies::read_subsidies(model_dir)?;
    let heating_concepts = concepts::read_heating_concepts(model_dir)?;
    let ventilation = ventilation::read_ventilation_data(model_dir, &options)?;
    let time_series = time_series::read_time_series(
        model_dir,
        options.clustering.days_per_year,
        options.ventilation,
    )?;

    Ok(Model {
        model_dir: model_dir.to_path_buf(),
        options,
        building,
        devices,
        economics,
        gas_tariffs,
        electricity_tariffs,
        subsidies,
        heating_concepts,
        ventilation,
        time_series,
    })
}
