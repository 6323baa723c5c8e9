//! Code for reading the building description.
use super::*;
use crate::building::{Building, Component, RetrofitScenario};
use strum::IntoEnumIterator;

const BUILDING_FILE_NAME: &str = "building.toml";

/// Check the geometry and shell data of a building
fn validate_building(building: &Building) -> Result<()> {
    check_positive(building.area, "area")?;
    check_positive(building.volume_factor, "volume_factor")?;
    ensure!(
        (0.0..=1.0).contains(&building.usable_roof),
        "usable_roof must be between 0 and 1"
    );
    ensure!(building.apartments > 0, "apartments cannot be zero");

    for component in Component::iter() {
        check_non_negative(
            building.fractions.get(component),
            &format!("fractions.{component}"),
        )?;

        let data = building.components.get(component);
        check_non_negative(data.cost_constant, &format!("{component}.cost_constant"))?;
        ensure!(
            data.cost_variable.is_finite(),
            "{component}.cost_variable must be finite"
        );
        ensure!(data.lifetime > 0, "{component}: lifetime cannot be zero");

        for scenario in RetrofitScenario::iter() {
            let props = data.scenario(scenario);
            let name = format!("{component}.{scenario}");
            check_positive(props.u_value, &format!("{name}.u_value"))?;
            check_non_negative(props.thickness, &format!("{name}.thickness"))?;
            // Window costs usually fall with the U-value, so only the resulting cost is checked
            check_non_negative(
                data.specific_cost(component, scenario),
                &format!("{name} specific cost"),
            )?;
            if component == Component::Window {
                ensure!(
                    (0.0..=1.0).contains(&props.g_value),
                    "{name}.g_value must be between 0 and 1"
                );
            }
        }
    }

    let o = &building.window_orientation;
    let shares = [o.south, o.east, o.west, o.north];
    for share in shares {
        check_non_negative(share, "window_orientation")?;
    }
    check_values_sum_to_one(shares, "window_orientation")?;

    Ok(())
}

/// Read the building from `building.toml`.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
pub fn read_building(model_dir: &Path) -> Result<Building> {
    let file_path = model_dir.join(BUILDING_FILE_NAME);
    let building: Building = read_toml(&file_path)?;
    validate_building(&building).with_context(|| input_err_msg(&file_path))?;

    Ok(building)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, building};
    use rstest::rstest;

    #[rstest]
    fn test_validate_building(building: Building) {
        assert!(validate_building(&building).is_ok());
    }

    #[rstest]
    fn test_validate_building_orientation(mut building: Building) {
        building.window_orientation.north = 0.5;
        assert!(validate_building(&building).is_err());
    }

    #[rstest]
    fn test_validate_building_u_value(mut building: Building) {
        building.components.rooftop.adv_retr.u_value = 0.0;
        assert_error!(
            validate_building(&building),
            "rooftop.adv_retr.u_value must be a finite number > 0 (got 0)"
        );
    }

    #[rstest]
    fn test_validate_building_roof(mut building: Building) {
        building.usable_roof = 1.5;
        assert_error!(
            validate_building(&building),
            "usable_roof must be between 0 and 1"
        );
    }
}
