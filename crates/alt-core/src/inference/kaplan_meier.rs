//! Kaplan–Meier product-limit survival curves.
//!
//! One curve per (test type, temperature), pooling voltages. At a tied time
//! the failures are counted against the full risk set before the survivors
//! leave it.

use alt_common::{LifetimeRecord, TestType};
use serde::Serialize;

/// One distinct observation time on a curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KmStep {
    pub time_hours: f64,
    /// Devices still under test just before this time.
    pub at_risk: usize,
    pub events: usize,
    pub censored: usize,
    /// `S(t)` just after this time.
    pub survival: f64,
}

/// Survival curve for one (test type, temperature) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KmCurve {
    pub test_type: TestType,
    pub temperature_c: f64,
    pub n_total: usize,
    pub steps: Vec<KmStep>,
}

impl KmCurve {
    /// Legend label, e.g. `HTOL-150°C`.
    pub fn label(&self) -> String {
        format!("{}-{}°C", self.test_type, self.temperature_c)
    }

    /// `S(t)` as a right-continuous step function; 1.0 before the first event.
    pub fn survival_at(&self, t: f64) -> f64 {
        self.steps
            .iter()
            .take_while(|s| s.time_hours <= t)
            .last()
            .map_or(1.0, |s| s.survival)
    }

    /// First time at which survival drops to 0.5 or below.
    pub fn median_survival(&self) -> Option<f64> {
        self.steps
            .iter()
            .find(|s| s.survival <= 0.5)
            .map(|s| s.time_hours)
    }
}

/// Product-limit estimate over `(time, censored)` observations.
pub fn kaplan_meier(observations: &[(f64, bool)]) -> Vec<KmStep> {
    let mut sorted = observations.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut steps = Vec::new();
    let mut at_risk = sorted.len();
    let mut survival = 1.0;
    for tied in sorted.chunk_by(|a, b| a.0 == b.0) {
        let censored = tied.iter().filter(|(_, c)| *c).count();
        let events = tied.len() - censored;
        if events > 0 {
            survival *= 1.0 - events as f64 / at_risk as f64;
        }
        steps.push(KmStep {
            time_hours: tied[0].0,
            at_risk,
            events,
            censored,
            survival,
        });
        at_risk -= tied.len();
    }
    steps
}

/// Curves for every (test type, temperature) group, sorted by test type then
/// temperature.
pub fn kaplan_meier_by_group(records: &[LifetimeRecord]) -> Vec<KmCurve> {
    let mut sorted: Vec<&LifetimeRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.test_type
            .cmp(&b.test_type)
            .then(a.stress_temperature_c.total_cmp(&b.stress_temperature_c))
    });

    sorted
        .chunk_by(|a, b| {
            a.test_type == b.test_type && a.stress_temperature_c == b.stress_temperature_c
        })
        .map(|group| {
            let observations: Vec<(f64, bool)> =
                group.iter().map(|r| (r.observed_hours, r.censored)).collect();
            KmCurve {
                test_type: group[0].test_type,
                temperature_c: group[0].stress_temperature_c,
                n_total: group.len(),
                steps: kaplan_meier(&observations),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alt_common::{BatchId, DeviceId};

    #[test]
    fn textbook_example() {
        // 6 units: failures at 3, 6, 10; censored at 6, 8, 12
        let obs = [
            (3.0, false),
            (6.0, false),
            (6.0, true),
            (8.0, true),
            (10.0, false),
            (12.0, true),
        ];
        let steps = kaplan_meier(&obs);
        assert_eq!(steps.len(), 5);

        assert_eq!(steps[0].at_risk, 6);
        assert!((steps[0].survival - 5.0 / 6.0).abs() < 1e-12);

        // tied failure and survivor at 6: failure sees the full risk set
        assert_eq!(steps[1].at_risk, 5);
        assert_eq!(steps[1].events, 1);
        assert_eq!(steps[1].censored, 1);
        assert!((steps[1].survival - 5.0 / 6.0 * 4.0 / 5.0).abs() < 1e-12);

        assert_eq!(steps[2].events, 0);
        assert_eq!(steps[2].survival, steps[1].survival);

        assert_eq!(steps[3].at_risk, 2);
        assert!((steps[3].survival - 4.0 / 6.0 * 0.5).abs() < 1e-12);
        assert_eq!(steps[4].at_risk, 1);
    }

    #[test]
    fn no_censoring_reaches_zero() {
        let steps = kaplan_meier(&[(1.0, false), (2.0, false), (3.0, false), (4.0, false)]);
        let s: Vec<f64> = steps.iter().map(|s| s.survival).collect();
        assert_eq!(s, vec![0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn empty_input() {
        assert!(kaplan_meier(&[]).is_empty());
        assert!(kaplan_meier_by_group(&[]).is_empty());
    }

    fn record(test_type: TestType, temperature_c: f64, voltage_v: f64, t: f64, c: bool) -> LifetimeRecord {
        LifetimeRecord {
            device_id: DeviceId(1),
            test_type,
            stress_temperature_c: temperature_c,
            stress_voltage_v: voltage_v,
            observed_hours: t,
            censored: c,
            batch_id: BatchId::from("B1"),
        }
    }

    #[test]
    fn groups_pool_voltages() {
        let records = vec![
            record(TestType::Tc, 125.0, 0.0, 300.0, false),
            record(TestType::Htol, 150.0, 5.0, 100.0, false),
            record(TestType::Htol, 125.0, 4.5, 400.0, false),
            record(TestType::Htol, 150.0, 4.5, 2000.0, true),
            record(TestType::Htol, 125.0, 5.0, 2000.0, true),
            record(TestType::Tc, -40.0, 0.0, 1200.0, true),
        ];
        let curves = kaplan_meier_by_group(&records);
        let labels: Vec<String> = curves.iter().map(KmCurve::label).collect();
        assert_eq!(
            labels,
            vec!["HTOL-125°C", "HTOL-150°C", "TC--40°C", "TC-125°C"]
        );
        assert_eq!(curves[1].n_total, 2);
        assert_eq!(curves[1].survival_at(50.0), 1.0);
        assert_eq!(curves[1].survival_at(100.0), 0.5);
        assert_eq!(curves[1].median_survival(), Some(100.0));
        assert_eq!(curves[2].median_survival(), None);
    }
}
