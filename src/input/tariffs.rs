//! Code for reading gas and electricity tariffs from CSV files.
use super::*;
use crate::tariff::{Tariff, TariffMap, TariffTier};
use indexmap::IndexMap;
use serde::Deserialize;

const GAS_TARIFFS_FILE_NAME: &str = "gas_tariffs.csv";
const ELECTRICITY_TARIFFS_FILE_NAME: &str = "electricity_tariffs.csv";

/// One row of a tariff file
#[derive(Debug, Deserialize, PartialEq)]
struct TariffRaw {
    tariff: String,
    tier: u32,
    lower: f64,
    upper: f64,
    price: f64,
    fixed: f64,
    emission: f64,
    #[serde(default)]
    heat_pump: u8,
}

/// Group tier rows into tariffs, checking each row
fn read_tariffs_from_iter<I>(iter: I, allow_heat_pump: bool) -> Result<TariffMap>
where
    I: Iterator<Item = TariffRaw>,
{
    let mut tariffs = TariffMap::new();
    let mut last_tier: IndexMap<String, u32> = IndexMap::new();
    for raw in iter {
        let name = raw.tariff.as_str();
        ensure!(!name.is_empty(), "Tariff name cannot be empty");
        check_bounds(raw.lower, raw.upper, &format!("{name} tier {}", raw.tier))?;
        check_non_negative(raw.price, &format!("{name}.price"))?;
        check_non_negative(raw.fixed, &format!("{name}.fixed"))?;
        check_non_negative(raw.emission, &format!("{name}.emission"))?;
        ensure!(
            raw.heat_pump <= 1,
            "{name}: heat_pump must be 0 or 1"
        );
        let heat_pump = raw.heat_pump == 1;
        ensure!(
            allow_heat_pump || !heat_pump,
            "{name}: heat pump tariffs are only allowed for electricity"
        );

        if let Some(&tier) = last_tier.get(name) {
            ensure!(
                raw.tier > tier,
                "{name}: tiers must be given in increasing order"
            );
        }
        last_tier.insert(name.to_string(), raw.tier);

        let tier = TariffTier {
            lower: raw.lower,
            upper: raw.upper,
            price: raw.price,
            fixed: raw.fixed,
        };
        match tariffs.get_mut(name) {
            Some(tariff) => {
                ensure!(
                    tariff.heat_pump == heat_pump,
                    "{name}: heat_pump flag must be the same for every tier"
                );
                ensure!(
                    tariff.emission == raw.emission,
                    "{name}: emission must be the same for every tier"
                );
                tariff.tiers.push(tier);
            }
            None => {
                tariffs.insert(
                    raw.tariff,
                    Tariff {
                        heat_pump,
                        emission: raw.emission,
                        tiers: vec![tier],
                    },
                );
            }
        }
    }

    Ok(tariffs)
}

/// Read gas tariffs from `gas_tariffs.csv`.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
pub fn read_gas_tariffs(model_dir: &Path) -> Result<TariffMap> {
    let file_path = model_dir.join(GAS_TARIFFS_FILE_NAME);
    let tariffs = read_csv(&file_path)?;
    read_tariffs_from_iter(tariffs, false).with_context(|| input_err_msg(&file_path))
}

/// Read electricity tariffs from `electricity_tariffs.csv`.
///
/// There must be at least one tariff which is not reserved for heat pumps.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
pub fn read_electricity_tariffs(model_dir: &Path) -> Result<TariffMap> {
    let file_path = model_dir.join(ELECTRICITY_TARIFFS_FILE_NAME);
    let tariffs = read_csv(&file_path)?;
    let tariffs =
        read_tariffs_from_iter(tariffs, true).with_context(|| input_err_msg(&file_path))?;
    ensure!(
        tariffs.values().any(|t| !t.heat_pump),
        "{}: at least one tariff must be available to the household",
        file_path.display()
    );

    Ok(tariffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs;
    use tempfile::tempdir;

    fn raw(tariff: &str, tier: u32, lower: f64, upper: f64, heat_pump: u8) -> TariffRaw {
        TariffRaw {
            tariff: tariff.into(),
            tier,
            lower,
            upper,
            price: 0.3,
            fixed: 100.0,
            emission: 0.5,
            heat_pump,
        }
    }

    #[test]
    fn test_read_tariffs_from_iter() {
        let tariffs = read_tariffs_from_iter(
            [
                raw("standard", 0, 0.0, 5.0, 0),
                raw("standard", 1, 5.0, 100.0, 0),
                raw("hp", 0, 0.0, 100.0, 1),
            ]
            .into_iter(),
            true,
        )
        .unwrap();
        assert_eq!(tariffs.len(), 2);
        assert_eq!(tariffs["standard"].tiers.len(), 2);
        assert!(tariffs["hp"].heat_pump);
    }

    #[test]
    fn test_read_tariffs_from_iter_invalid() {
        assert_error!(
            read_tariffs_from_iter([raw("gas", 0, 0.0, 5.0, 1)].into_iter(), false),
            "gas: heat pump tariffs are only allowed for electricity"
        );
        assert_error!(
            read_tariffs_from_iter(
                [raw("gas", 1, 0.0, 5.0, 0), raw("gas", 0, 5.0, 10.0, 0)].into_iter(),
                false
            ),
            "gas: tiers must be given in increasing order"
        );
        assert_error!(
            read_tariffs_from_iter([raw("gas", 0, 10.0, 5.0, 0)].into_iter(), false),
            "gas tier 0: minimum (10) must not exceed maximum (5)"
        );
    }

    #[test]
    fn test_read_electricity_tariffs_household_required() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(ELECTRICITY_TARIFFS_FILE_NAME),
            "tariff,tier,lower,upper,price,fixed,emission,heat_pump\nhp,0,0,100,0.2,50,0.5,1\n",
        )
        .unwrap();
        assert!(read_electricity_tariffs(dir.path()).is_err());
    }
}
