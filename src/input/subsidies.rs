//! Code for reading subsidy program parameters.
use super::*;
use crate::building::Component;
use crate::device::Device;
use crate::subsidy::{KfwTier, Subsidies};
use strum::IntoEnumIterator;

const SUBSIDIES_FILE_NAME: &str = "subsidies.toml";

fn validate_subsidies(subsidies: &Subsidies) -> Result<()> {
    let eeg = &subsidies.eeg;
    ensure!(!eeg.steps.is_empty(), "eeg.steps cannot be empty");
    let peaks: Vec<f64> = eeg.steps.iter().map(|s| s.peak_power).collect();
    ensure!(
        is_sorted_and_unique(&peaks),
        "eeg.steps must be sorted by peak_power without duplicates"
    );
    for step in &eeg.steps {
        check_positive(step.peak_power, "eeg.steps.peak_power")?;
        check_non_negative(step.tariff, "eeg.steps.tariff")?;
    }
    check_non_negative(eeg.price_factor, "eeg.price_factor")?;

    let bat = &subsidies.kfw_battery;
    check_non_negative(bat.share_max, "kfw_battery.share_max")?;
    check_non_negative(bat.sub_bat_max, "kfw_battery.sub_bat_max")?;
    check_non_negative(bat.sub_bat, "kfw_battery.sub_bat")?;

    let kwkg = &subsidies.kwkg;
    ensure!(!kwkg.classes.is_empty(), "kwkg.classes cannot be empty");
    for class in &kwkg.classes {
        check_positive(class.full_load_hours, "kwkg.classes.full_load_hours")?;
        check_non_negative(class.present_value_factor, "kwkg.classes.present_value_factor")?;
    }

    for step in subsidies.bafa_chp.steps {
        check_non_negative(step, "bafa_chp.steps")?;
    }

    let stc = &subsidies.bafa_stc;
    check_positive(stc.basic_area_min, "bafa_stc.basic_area_min")?;
    check_positive(stc.inno_area_min, "bafa_stc.inno_area_min")?;

    for device in Device::HEAT_PUMPS {
        let hp = subsidies.bafa_hp(device);
        check_positive(hp.basic_scop, &format!("bafa_hp.{device}.basic_scop"))?;
        check_positive(hp.inno_scop, &format!("bafa_hp.{device}.inno_scop"))?;
        check_non_negative(hp.max_cap, &format!("bafa_hp.{device}.max_cap"))?;
    }

    check_positive(subsidies.bafa_pellet.min_cap, "bafa_pellet.min_cap")?;

    let individual = &subsidies.kfw_individual;
    for component in Component::iter() {
        check_positive(
            individual.u_value.get(component),
            &format!("kfw_individual.u_value.{component}"),
        )?;
    }

    for tier in KfwTier::iter() {
        let params = subsidies
            .kfw_efficiency
            .get(&tier)
            .with_context(|| format!("Missing parameters for {tier}"))?;
        check_positive(params.factor_h, &format!("{tier}.factor_h"))?;
        check_positive(params.factor_q, &format!("{tier}.factor_q"))?;
        check_non_negative(params.grant, &format!("{tier}.grant"))?;
    }

    Ok(())
}

/// Read subsidy program parameters from `subsidies.toml`.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
pub fn read_subsidies(model_dir: &Path) -> Result<Subsidies> {
    let file_path = model_dir.join(SUBSIDIES_FILE_NAME);
    let subsidies: Subsidies = read_toml(&file_path)?;
    validate_subsidies(&subsidies).with_context(|| input_err_msg(&file_path))?;

    Ok(subsidies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, subsidies};
    use rstest::rstest;

    #[rstest]
    fn test_validate_subsidies(subsidies: Subsidies) {
        assert!(validate_subsidies(&subsidies).is_ok());
    }

    #[rstest]
    fn test_validate_subsidies_missing_tier(mut subsidies: Subsidies) {
        subsidies.kfw_efficiency.shift_remove(&KfwTier::Eff70);
        assert_error!(
            validate_subsidies(&subsidies),
            "Missing parameters for kfw_eff_70"
        );
    }

    #[rstest]
    fn test_validate_subsidies_eeg_order(mut subsidies: Subsidies) {
        subsidies.eeg.steps.reverse();
        assert_error!(
            validate_subsidies(&subsidies),
            "eeg.steps must be sorted by peak_power without duplicates"
        );
    }
}
