//! Code for reading device parameters.
use super::*;
use crate::device::{CopPoint, Device, DeviceCatalog, DeviceCosts, HeatPumpParams};
use strum::IntoEnumIterator;

const DEVICES_FILE_NAME: &str = "devices.toml";

/// Check that an efficiency is in (0, 1]
fn check_efficiency(value: f64, name: &str) -> Result<()> {
    ensure!(
        value > 0.0 && value <= 1.0,
        "{name} must be greater than 0 and at most 1 (got {value})"
    );

    Ok(())
}

fn check_costs(costs: &DeviceCosts, device: Device) -> Result<()> {
    check_non_negative(costs.c_inv_fix, &format!("{device}.c_inv_fix"))?;
    check_non_negative(costs.c_inv_var, &format!("{device}.c_inv_var"))?;
    check_non_negative(costs.c_om_rel, &format!("{device}.c_om_rel"))?;
    check_non_negative(costs.inst_costs_sfh, &format!("{device}.inst_costs_sfh"))?;
    check_non_negative(costs.inst_costs_mfh, &format!("{device}.inst_costs_mfh"))?;
    ensure!(costs.lifetime > 0, "{device}: lifetime cannot be zero");

    Ok(())
}

fn check_cop_curve(points: &[CopPoint], name: &str) -> Result<()> {
    ensure!(!points.is_empty(), "{name} must contain at least one point");
    let temperatures: Vec<f64> = points.iter().map(|p| p.temperature).collect();
    ensure!(
        is_sorted_and_unique(&temperatures),
        "{name} must be sorted by temperature without duplicates"
    );
    for point in points {
        check_positive(point.cop, name)?;
    }

    Ok(())
}

fn check_heat_pump(hp: &HeatPumpParams, device: Device) -> Result<()> {
    check_cop_curve(&hp.cop_w35, &format!("{device}.cop_w35"))?;
    check_cop_curve(&hp.cop_w55, &format!("{device}.cop_w55"))?;
    check_positive(hp.cop_a2w35, &format!("{device}.cop_a2w35"))?;
    check_positive(hp.cop_a2w55, &format!("{device}.cop_a2w55"))?;
    check_positive(hp.dt_max, &format!("{device}.dt_max"))?;
    if device == Device::HpGeo {
        ensure!(
            hp.source_temperature.is_some_and(f64::is_finite),
            "hp_geo requires a source_temperature"
        );
    }

    Ok(())
}

/// Check the technical parameters of every device
fn validate_devices(devices: &DeviceCatalog) -> Result<()> {
    for device in Device::iter() {
        check_costs(devices.costs(device), device)?;
        if let Some(limits) = devices.heater_limits(device) {
            check_bounds(limits.cap_min, limits.cap_max, &format!("{device} capacity"))?;
            ensure!(
                (0.0..=1.0).contains(&limits.mod_lvl),
                "{device}.mod_lvl must be between 0 and 1"
            );
        }
    }

    check_efficiency(devices.boiler.eta, "boiler.eta")?;
    check_efficiency(devices.pellet.heater.eta, "pellet.eta")?;
    check_efficiency(devices.eh.eta, "eh.eta")?;

    let chp = &devices.chp;
    check_positive(chp.sigma, "chp.sigma")?;
    check_efficiency(chp.omega, "chp.omega")?;

    for device in Device::HEAT_PUMPS {
        check_heat_pump(devices.heat_pump(device), device)?;
    }

    let pv = &devices.pv;
    check_positive(pv.p_nom, "pv.p_nom")?;
    check_positive(pv.area_mean, "pv.area_mean")?;
    check_non_negative(pv.area_min, "pv.area_min")?;
    check_efficiency(pv.eta_nom, "pv.eta_nom")?;
    check_non_negative(pv.temperature_coefficient, "pv.temperature_coefficient")?;

    let stc = &devices.stc;
    check_non_negative(stc.area_min, "stc.area_min")?;
    check_efficiency(stc.eta0, "stc.eta0")?;
    check_non_negative(stc.a1, "stc.a1")?;
    check_non_negative(stc.a2, "stc.a2")?;
    check_positive(stc.dt_max, "stc.dt_max")?;

    let tes = &devices.tes;
    check_bounds(tes.volume_min, tes.volume_max, "tes volume")?;
    check_positive(tes.volume_max, "tes.volume_max")?;
    check_positive(tes.dt_max, "tes.dt_max")?;
    ensure!(
        (0.0..1.0).contains(&tes.k_loss),
        "tes.k_loss must be in [0, 1)"
    );
    check_efficiency(tes.eta_ch, "tes.eta_ch")?;
    check_efficiency(tes.eta_dch, "tes.eta_dch")?;
    for device in [Device::HpAir, Device::HpGeo, Device::Stc] {
        if let Some(dt) = devices.storage_temperature_limit(device) {
            ensure!(
                dt <= tes.dt_max,
                "{device}.dt_max ({dt}) cannot exceed tes.dt_max ({})",
                tes.dt_max
            );
        }
    }

    let bat = &devices.bat;
    check_bounds(bat.cap_min, bat.cap_max, "bat capacity")?;
    check_efficiency(bat.eta, "bat.eta")?;
    ensure!(
        (0.0..1.0).contains(&bat.k_loss),
        "bat.k_loss must be in [0, 1)"
    );
    for (value, name) in [
        (bat.p_ch_fix, "bat.p_ch_fix"),
        (bat.p_ch_var, "bat.p_ch_var"),
        (bat.p_dch_fix, "bat.p_dch_fix"),
        (bat.p_dch_var, "bat.p_dch_var"),
    ] {
        check_non_negative(value, name)?;
    }

    let vent = &devices.vent;
    check_non_negative(vent.air_flow, "vent.air_flow")?;
    ensure!(
        (0.0..=1.0).contains(&vent.heat_recovery),
        "vent.heat_recovery must be between 0 and 1"
    );
    check_non_negative(vent.fan_power, "vent.fan_power")?;

    Ok(())
}

/// Read device parameters from `devices.toml`.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
pub fn read_devices(model_dir: &Path) -> Result<DeviceCatalog> {
    let file_path = model_dir.join(DEVICES_FILE_NAME);
    let devices: DeviceCatalog = read_toml(&file_path)?;
    validate_devices(&devices).with_context(|| input_err_msg(&file_path))?;

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, devices};
    use rstest::rstest;

    #[rstest]
    fn test_validate_devices(devices: DeviceCatalog) {
        assert!(validate_devices(&devices).is_ok());
    }

    #[rstest]
    fn test_validate_devices_bounds(mut devices: DeviceCatalog) {
        devices.boiler.cap_min = 100.0;
        devices.boiler.cap_max = 50.0;
        assert_error!(
            validate_devices(&devices),
            "boiler capacity: minimum (100) must not exceed maximum (50)"
        );
    }

    #[rstest]
    fn test_validate_devices_efficiency(mut devices: DeviceCatalog) {
        devices.tes.eta_ch = 1.2;
        assert_error!(
            validate_devices(&devices),
            "tes.eta_ch must be greater than 0 and at most 1 (got 1.2)"
        );
    }

    #[rstest]
    fn test_validate_devices_geo_source(mut devices: DeviceCatalog) {
        devices.hp_geo.source_temperature = None;
        assert_error!(
            validate_devices(&devices),
            "hp_geo requires a source_temperature"
        );
    }

    #[rstest]
    fn test_validate_devices_cop_order(mut devices: DeviceCatalog) {
        devices.hp_air.cop_w35.reverse();
        assert_error!(
            validate_devices(&devices),
            "hp_air.cop_w35 must be sorted by temperature without duplicates"
        );
    }
}
