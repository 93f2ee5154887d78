//! Property tests: generated studies survive TOML and JSON encoding and
//! validation, and repeated stress levels never pass validation.

use alt_common::TestType;
use alt_config::validate::{validate_catalog, validate_study, ValidationError};
use alt_config::{Catalog, StudyConfig, TestTypeConfig};
use proptest::prelude::*;

fn arb_levels(lo: f64, hi: f64) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(lo..hi, 1..4).prop_map(|mut levels| {
        levels.sort_by(f64::total_cmp);
        levels.dedup();
        levels
    })
}

fn arb_entry(test_type: TestType) -> impl Strategy<Value = TestTypeConfig> {
    (
        arb_levels(-60.0, 250.0),
        arb_levels(0.0, 10.0),
        1.0f64..1e5,
        0.2f64..6.0,
    )
        .prop_map(move |(temperatures_c, voltages_v, test_end_hours, shape)| TestTypeConfig {
            test_type,
            temperatures_c,
            voltages_v,
            test_end_hours,
            shape,
        })
}

fn arb_catalog() -> impl Strategy<Value = Catalog> {
    prop::sample::subsequence(vec![TestType::Htol, TestType::Thb, TestType::Tc], 1..=3)
        .prop_flat_map(|types| types.into_iter().map(arb_entry).collect::<Vec<_>>())
        .prop_map(Catalog::new)
}

fn arb_study() -> impl Strategy<Value = StudyConfig> {
    // TOML integers are signed 64-bit
    (arb_catalog(), 0..=i64::MAX as u64, 1usize..500).prop_map(|(catalog, seed, n)| {
        let first = &catalog.entries()[0];
        let mut study = StudyConfig {
            arrhenius_test_type: first.test_type,
            probability_plot_cell: catalog.cells()[0],
            catalog,
            ..StudyConfig::default()
        };
        study.generator.seed = seed;
        study.generator.n_per_group = n;
        study
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn generated_study_round_trips_through_toml(study in arb_study()) {
        prop_assert!(validate_study(&study).is_ok());
        let text = study.to_toml_string().unwrap();
        let back = StudyConfig::from_toml_str(&text).unwrap();
        prop_assert_eq!(&back, &study);
        prop_assert!(validate_study(&back).is_ok());
    }

    #[test]
    fn generated_study_round_trips_through_json(study in arb_study()) {
        let json = serde_json::to_string(&study).unwrap();
        let back = StudyConfig::from_json_str(&json).unwrap();
        prop_assert_eq!(&back, &study);
    }

    #[test]
    fn repeated_level_is_rejected(catalog in arb_catalog(), pick in any::<prop::sample::Index>(), on_voltage in any::<bool>()) {
        let mut entries = catalog.entries().to_vec();
        let entry = &mut entries[pick.index(catalog.len())];
        let (levels, axis) = if on_voltage {
            (&mut entry.voltages_v, "voltages_v")
        } else {
            (&mut entry.temperatures_c, "temperatures_c")
        };
        let repeated = levels[pick.index(levels.len())];
        levels.push(repeated);
        let expected = format!("catalog.{}.{}", entry.test_type, axis);

        match validate_catalog(&Catalog::new(entries)) {
            Err(ValidationError::InvalidValue { field, .. }) => {
                prop_assert_eq!(field, expected);
            }
            other => {
                prop_assert!(false, "expected InvalidValue, got {:?}", other);
            }
        }
    }
}
