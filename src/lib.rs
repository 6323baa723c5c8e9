//! Cost- and emission-optimal retrofit and heating system design for residential buildings.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod building;
pub mod cli;
pub mod clustering;
pub mod device;
pub mod economics;
pub mod error;
pub mod finance;
pub mod heating_concept;
pub mod input;
pub mod log;
pub mod model;
pub mod optimisation;
pub mod output;
pub mod pareto;
pub mod reference_building;
pub mod settings;
pub mod solver;
pub mod subsidy;
pub mod tariff;
pub mod time_series;
pub mod units;
pub mod ventilation;

#[cfg(test)]
mod fixture;

/// Get the directory in which the program settings are stored
pub fn get_buildopt_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        panic!("Could not get path to config dir");
    };
    config_dir.push("buildopt");
    config_dir
}
