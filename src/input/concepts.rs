//! Code for reading the heating concept table.
use super::*;
use crate::heating_concept::{HeatingConcept, HeatingConceptMap};
use serde::Deserialize;

const HEATING_CONCEPTS_FILE_NAME: &str = "heating_concepts.csv";

#[derive(Debug, Deserialize, PartialEq)]
struct HeatingConceptRaw {
    concept: String,
    boiler: u8,
    chp: u8,
    eh: u8,
    hp_air: u8,
    hp_geo: u8,
    pellet: u8,
    stc: u8,
    tvl35: u8,
    ep: f64,
}

fn read_heating_concepts_from_iter<I>(iter: I) -> Result<HeatingConceptMap>
where
    I: Iterator<Item = HeatingConceptRaw>,
{
    let mut concepts = HeatingConceptMap::new();
    for raw in iter {
        let flags = [
            raw.boiler, raw.chp, raw.eh, raw.hp_air, raw.hp_geo, raw.pellet, raw.stc, raw.tvl35,
        ];
        ensure!(
            flags.iter().all(|&f| f <= 1),
            "{}: device flags must be 0 or 1",
            raw.concept
        );
        check_positive(raw.ep, &format!("{}.ep", raw.concept))?;

        let concept = HeatingConcept {
            devices: [
                raw.boiler == 1,
                raw.chp == 1,
                raw.eh == 1,
                raw.hp_air == 1,
                raw.hp_geo == 1,
                raw.pellet == 1,
                raw.stc == 1,
            ],
            tvl35: raw.tvl35 == 1,
            ep: raw.ep,
        };

        ensure!(
            !concepts.values().any(|c: &HeatingConcept| {
                c.devices == concept.devices && c.tvl35 == concept.tvl35
            }),
            "{}: duplicate combination of devices and supply temperature",
            raw.concept
        );
        ensure!(
            concepts.insert(raw.concept.clone(), concept).is_none(),
            "Duplicate heating concept: {}",
            raw.concept
        );
    }

    Ok(concepts)
}

/// Read heating concepts from `heating_concepts.csv`.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the scenario files
pub fn read_heating_concepts(model_dir: &Path) -> Result<HeatingConceptMap> {
    let file_path = model_dir.join(HEATING_CONCEPTS_FILE_NAME);
    let concepts = read_csv(&file_path)?;
    read_heating_concepts_from_iter(concepts).with_context(|| input_err_msg(&file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::fixture::assert_error;

    fn raw(name: &str, boiler: u8, stc: u8) -> HeatingConceptRaw {
        HeatingConceptRaw {
            concept: name.into(),
            boiler,
            chp: 0,
            eh: 0,
            hp_air: 0,
            hp_geo: 0,
            pellet: 0,
            stc,
            tvl35: 0,
            ep: 1.3,
        }
    }

    #[test]
    fn test_read_heating_concepts_from_iter() {
        let concepts = read_heating_concepts_from_iter(
            [raw("boiler", 1, 0), raw("boiler_stc", 1, 1)].into_iter(),
        )
        .unwrap();
        assert_eq!(concepts.len(), 2);
        assert!(concepts["boiler_stc"].includes(Device::Stc));
        assert!(!concepts["boiler"].includes(Device::Stc));
        assert!(!concepts["boiler"].includes(Device::Pv));
    }

    #[test]
    fn test_read_heating_concepts_duplicate() {
        assert_error!(
            read_heating_concepts_from_iter([raw("a", 1, 0), raw("a", 0, 1)].into_iter()),
            "Duplicate heating concept: a"
        );
        assert_error!(
            read_heating_concepts_from_iter([raw("a", 1, 0), raw("b", 1, 0)].into_iter()),
            "b: duplicate combination of devices and supply temperature"
        );
    }
}
