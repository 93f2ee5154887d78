//! Property tests for the synthetic generator and the acceleration model.

use alt_common::{StressCell, TestType};
use alt_config::{Catalog, GeneratorConfig, TestTypeConfig};
use alt_core::model::{synthesize, StressModel, SyntheticGenerator};
use proptest::prelude::*;

fn config(seed: u64, n: usize) -> GeneratorConfig {
    GeneratorConfig {
        seed,
        n_per_group: n,
        ..GeneratorConfig::default()
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn same_seed_same_records() {
    let a = synthesize(&config(2025, 80), &Catalog::default()).unwrap();
    let b = synthesize(&config(2025, 80), &Catalog::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn seed_changes_draws_not_layout() {
    let a = synthesize(&config(1, 30), &Catalog::default()).unwrap();
    let b = synthesize(&config(2, 30), &Catalog::default()).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.device_id, y.device_id);
        assert_eq!(x.cell(), y.cell());
    }
    assert!(a.iter().zip(&b).any(|(x, y)| x.observed_hours != y.observed_hours));
}

// ============================================================================
// Monotonicity of the acceleration model
// ============================================================================

#[test]
fn higher_voltage_shorter_life() {
    let model = StressModel::new(0.6, 398.15, 1200.0);
    let voltages = [0.0, 1.8, 3.3, 4.5, 5.0, 6.0, 12.0];
    let scales: Vec<f64> = voltages
        .iter()
        .map(|&v| model.cell_scale(&StressCell::new(TestType::Htol, 125.0, v)).unwrap())
        .collect();
    assert!(scales.windows(2).all(|w| w[1] < w[0]), "{scales:?}");
}

#[test]
fn hotter_cells_shorter_life() {
    let model = StressModel::new(0.6, 398.15, 1200.0);
    let temps = [-40.0, 25.0, 85.0, 125.0, 150.0, 175.0];
    let scales: Vec<f64> = temps
        .iter()
        .map(|&t| model.cell_scale(&StressCell::new(TestType::Htol, t, 3.3)).unwrap())
        .collect();
    assert!(scales.windows(2).all(|w| w[1] < w[0]), "{scales:?}");
    // reference temperature, reference voltage
    assert!((scales[3] - 1200.0).abs() < 1e-9);
}

// ============================================================================
// Generated record invariants
// ============================================================================

fn arb_catalog() -> impl Strategy<Value = Catalog> {
    (
        prop::collection::vec(-40.0f64..200.0, 1..3),
        prop::collection::vec(0.0f64..8.0, 1..3),
        10.0f64..5000.0,
        0.5f64..4.0,
    )
        .prop_map(|(mut temperatures_c, mut voltages_v, test_end_hours, shape)| {
            for levels in [&mut temperatures_c, &mut voltages_v] {
                levels.sort_by(f64::total_cmp);
                levels.dedup();
            }
            Catalog::new(vec![TestTypeConfig {
                test_type: TestType::Htol,
                temperatures_c,
                voltages_v,
                test_end_hours,
                shape,
            }])
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn censoring_invariant_holds(seed in any::<u64>(), catalog in arb_catalog(), n in 1usize..40) {
        let end = catalog.entries()[0].test_end_hours;
        let records = synthesize(&config(seed, n), &catalog).unwrap();
        prop_assert_eq!(records.len(), catalog.cells().len() * n);
        for r in &records {
            prop_assert!(r.observed_hours > 0.0);
            if r.censored {
                prop_assert_eq!(r.observed_hours, end);
            } else {
                prop_assert!(r.observed_hours < end);
            }
        }
    }

    #[test]
    fn device_ids_are_sequential(seed in any::<u64>(), n in 1usize..25) {
        let records = synthesize(&config(seed, n), &Catalog::default()).unwrap();
        for (i, r) in records.iter().enumerate() {
            prop_assert_eq!(r.device_id.0 as usize, i + 1);
        }
    }

    #[test]
    fn batches_come_from_config(seed in any::<u64>()) {
        let cfg = config(seed, 10);
        let records = synthesize(&cfg, &Catalog::default()).unwrap();
        for r in &records {
            prop_assert!(cfg.batches.contains(&r.batch_id));
        }
    }

    #[test]
    fn record_count_matches_plan(n in 1usize..50) {
        let generator = SyntheticGenerator::new(config(9, n), Catalog::default()).unwrap();
        prop_assert_eq!(generator.record_count(), 7 * n);
        prop_assert_eq!(generator.generate().unwrap().len(), 7 * n);
    }
}
