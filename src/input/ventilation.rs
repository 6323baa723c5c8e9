//! Code for reading the data of the detailed ventilation mode.
use super::*;
use crate::model::{ScenarioOptions, VentilationMode};
use crate::ventilation::{
    InfiltrationClass, NUM_BUCKETS, ScenarioFlags, VentilationData, VentilationParameters,
    WindowOpening,
};
use indexmap::IndexMap;
use serde::Deserialize;

const VENTILATION_FILE_NAME: &str = "ventilation.toml";
const WINDOW_OPENING_FILE_NAME: &str = "window_opening.csv";

/// The infiltration class file for single- or multi-family houses
fn infiltration_file_name(multi_family: bool) -> &'static str {
    if multi_family {
        "infiltration_classes_mfh.csv"
    } else {
        "infiltration_classes_sfh.csv"
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct InfiltrationClassRaw {
    class: String,
    n50: f64,
    window_standard: u8,
    window_retrofit: u8,
    window_adv_retr: u8,
    rooftop_standard: u8,
    rooftop_retrofit: u8,
    rooftop_adv_retr: u8,
    vent: u8,
}

fn flags(standard: u8, retrofit: u8, adv_retr: u8) -> Result<ScenarioFlags> {
    ensure!(
        standard <= 1 && retrofit <= 1 && adv_retr <= 1,
        "Scenario flags must be 0 or 1"
    );

    Ok(ScenarioFlags {
        standard: standard == 1,
        retrofit: retrofit == 1,
        adv_retr: adv_retr == 1,
    })
}

fn read_infiltration_classes_from_iter<I>(iter: I) -> Result<IndexMap<String, InfiltrationClass>>
where
    I: Iterator<Item = InfiltrationClassRaw>,
{
    let mut classes = IndexMap::new();
    for raw in iter {
        check_non_negative(raw.n50, &format!("{}.n50", raw.class))?;
        ensure!(raw.vent <= 1, "{}: vent must be 0 or 1", raw.class);
        let class = InfiltrationClass {
            n50: raw.n50,
            window: flags(raw.window_standard, raw.window_retrofit, raw.window_adv_retr)
                .with_context(|| format!("Invalid window flags for class {}", raw.class))?,
            rooftop: flags(raw.rooftop_standard, raw.rooftop_retrofit, raw.rooftop_adv_retr)
                .with_context(|| format!("Invalid rooftop flags for class {}", raw.class))?,
            vent: raw.vent == 1,
        };
        ensure!(
            classes.insert(raw.class.clone(), class).is_none(),
            "Duplicate infiltration class: {}",
            raw.class
        );
    }

    Ok(classes)
}

fn read_window_opening_from_iter<I>(iter: I) -> Result<WindowOpening>
where
    I: Iterator<Item = Vec<f64>>,
{
    let mut shares = Vec::new();
    for (i, row) in iter.enumerate() {
        ensure!(
            row.len() == NUM_BUCKETS + 1,
            "Row {i}: expected an hour and {NUM_BUCKETS} shares, got {} values",
            row.len()
        );
        ensure!(row[0] == i as f64, "Hours must be given in order from 0 to 23");

        let mut values = [0.0; NUM_BUCKETS];
        for (value, &share) in values.iter_mut().zip(&row[1..]) {
            ensure!(
                (0.0..=1.0).contains(&share),
                "Row {i}: window opening shares must be between 0 and 1"
            );
            *value = share;
        }
        shares.push(values);
    }
    ensure!(
        shares.len() == 24,
        "Expected 24 hours, got {}",
        shares.len()
    );

    Ok(WindowOpening::new(shares))
}

fn validate_parameters(params: &VentilationParameters) -> Result<()> {
    for (value, name) in [
        (params.window_height, "window_height"),
        (params.rho_a_ref, "rho_a_ref"),
        (params.heat_capacity_air, "heat_capacity_air"),
    ] {
        check_positive(value, name)?;
    }
    for (value, name) in [
        (params.window_area_total, "window_area_total"),
        (params.shielding, "shielding"),
        (params.c_wnd, "c_wnd"),
        (params.c_st, "c_st"),
        (params.wind_height_factor, "wind_height_factor"),
    ] {
        check_non_negative(value, name)?;
    }

    Ok(())
}

/// Read the detailed ventilation data, if the scenario uses the detailed mode.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
/// * `options` - The scenario options
pub fn read_ventilation_data(
    model_dir: &Path,
    options: &ScenarioOptions,
) -> Result<Option<VentilationData>> {
    if options.ventilation != VentilationMode::Detailed {
        return Ok(None);
    }

    let file_path = model_dir.join(VENTILATION_FILE_NAME);
    let parameters: VentilationParameters = read_toml(&file_path)?;
    validate_parameters(&parameters).with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(infiltration_file_name(options.multi_family));
    let classes = read_infiltration_classes_from_iter(read_csv(&file_path)?)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(WINDOW_OPENING_FILE_NAME);
    let window_opening = read_window_opening_from_iter(read_csv(&file_path)?)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(Some(VentilationData {
        parameters,
        classes,
        window_opening,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use tempfile::tempdir;

    fn opening_rows() -> Vec<Vec<f64>> {
        (0..24)
            .map(|h| {
                let mut row = vec![h as f64];
                row.extend([0.1; NUM_BUCKETS]);
                row
            })
            .collect()
    }

    #[test]
    fn test_read_window_opening_from_iter() {
        let opening = read_window_opening_from_iter(opening_rows().into_iter()).unwrap();
        assert_eq!(opening.share(5, 10.0), 0.1);

        let mut rows = opening_rows();
        rows.pop();
        assert_error!(
            read_window_opening_from_iter(rows.into_iter()),
            "Expected 24 hours, got 23"
        );

        let mut rows = opening_rows();
        rows[3][2] = 1.5;
        assert_error!(
            read_window_opening_from_iter(rows.into_iter()),
            "Row 3: window opening shares must be between 0 and 1"
        );
    }

    #[test]
    fn test_read_infiltration_classes_from_iter() {
        let raw = |class: &str, vent| InfiltrationClassRaw {
            class: class.into(),
            n50: 4.0,
            window_standard: 1,
            window_retrofit: 0,
            window_adv_retr: 0,
            rooftop_standard: 1,
            rooftop_retrofit: 1,
            rooftop_adv_retr: 1,
            vent,
        };
        let classes =
            read_infiltration_classes_from_iter([raw("a", 0), raw("b", 1)].into_iter()).unwrap();
        assert!(classes["b"].vent);
        assert!(classes["a"].rooftop.adv_retr);
        assert!(!classes["a"].window.retrofit);

        assert_error!(
            read_infiltration_classes_from_iter([raw("a", 0), raw("a", 1)].into_iter()),
            "Duplicate infiltration class: a"
        );
    }

    #[test]
    fn test_read_ventilation_data_simple() {
        let dir = tempdir().unwrap();
        let options = ScenarioOptions::default();
        assert!(read_ventilation_data(dir.path(), &options).unwrap().is_none());
    }
}
