//! Code for reading economic parameters.
use super::*;
use crate::economics::Economics;

const ECONOMICS_FILE_NAME: &str = "economics.toml";

fn validate_economics(economics: &Economics) -> Result<()> {
    ensure!(
        economics.interest_rate.is_finite() && economics.interest_rate > -1.0,
        "interest_rate must be greater than -1"
    );
    ensure!(
        economics.observation_period > 0,
        "observation_period cannot be zero"
    );

    let change = &economics.price_change;
    for (value, name) in [
        (change.el, "el"),
        (change.gas, "gas"),
        (change.pellet, "pellet"),
        (change.eex, "eex"),
        (change.inflation, "inflation"),
    ] {
        ensure!(
            value.is_finite() && value > -1.0,
            "price_change.{name} must be greater than -1"
        );
    }

    check_non_negative(economics.price_sell_el, "price_sell_el")?;
    check_non_negative(economics.energy_tax, "energy_tax")?;
    check_non_negative(economics.pellet_price, "pellet_price")?;
    check_non_negative(economics.pellet_emission, "pellet_emission")?;
    check_non_negative(economics.feed_in_emission, "feed_in_emission")?;
    check_positive(economics.rho_w, "rho_w")?;
    check_positive(economics.c_w, "c_w")?;

    Ok(())
}

/// Read economic parameters from `economics.toml`.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
pub fn read_economics(model_dir: &Path) -> Result<Economics> {
    let file_path = model_dir.join(ECONOMICS_FILE_NAME);
    let economics: Economics = read_toml(&file_path)?;
    validate_economics(&economics).with_context(|| input_err_msg(&file_path))?;

    Ok(economics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, economics};
    use rstest::rstest;

    #[rstest]
    fn test_validate_economics(economics: Economics) {
        assert!(validate_economics(&economics).is_ok());
    }

    #[rstest]
    fn test_validate_economics_invalid(mut economics: Economics) {
        economics.observation_period = 0;
        assert_error!(
            validate_economics(&economics),
            "observation_period cannot be zero"
        );
    }
}
