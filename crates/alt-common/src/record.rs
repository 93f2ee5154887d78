//! Test types, stress cells and lifetime records.

use crate::id::{BatchId, DeviceId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Accelerated life test type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    /// High-Temperature Operating Life: elevated temperature and voltage.
    #[serde(rename = "HTOL")]
    Htol,
    /// Temperature-Humidity-Bias: lower temperature, humidity, bias voltage.
    #[serde(rename = "THB")]
    Thb,
    /// Temperature Cycling: low/high extremes, no bias.
    #[serde(rename = "TC")]
    Tc,
}

impl TestType {
    /// All test types, in default catalog order.
    pub const ALL: &'static [TestType] = &[TestType::Htol, TestType::Thb, TestType::Tc];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Htol => "HTOL",
            TestType::Thb => "THB",
            TestType::Tc => "TC",
        }
    }

    /// Parse a test type name, case-insensitively.
    pub fn parse(s: &str) -> Option<TestType> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HTOL" => Some(TestType::Htol),
            "THB" | "H3TRB" => Some(TestType::Thb),
            "TC" | "TMCL" => Some(TestType::Tc),
            _ => None,
        }
    }

    /// Short description for human output.
    pub fn description(&self) -> &'static str {
        match self {
            TestType::Htol => "High-Temperature Operating Life",
            TestType::Thb => "Temperature-Humidity-Bias",
            TestType::Tc => "Temperature Cycling",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestType::parse(s).ok_or_else(|| {
            format!(
                "unknown test type '{}' (expected one of: {})",
                s,
                TestType::ALL
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}

// Ordered by canonical name so fit tables sort HTOL, TC, THB.
impl Ord for TestType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for TestType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A homogeneous experimental condition: (test type, temperature, voltage).
///
/// Equality and hashing are exact on the bit patterns of the float fields,
/// ordering uses `f64::total_cmp`, so the key is usable in both `HashMap`
/// and `BTreeMap`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StressCell {
    pub test_type: TestType,
    pub temperature_c: f64,
    pub voltage_v: f64,
}

impl StressCell {
    pub fn new(test_type: TestType, temperature_c: f64, voltage_v: f64) -> Self {
        StressCell {
            test_type,
            temperature_c,
            voltage_v,
        }
    }

    /// Absolute stress temperature in kelvin.
    pub fn temperature_k(&self) -> f64 {
        crate::physics::celsius_to_kelvin(self.temperature_c)
    }

    /// Compact key used in file names and log fields, e.g. `HTOL_150C_5V`.
    pub fn slug(&self) -> String {
        format!(
            "{}_{}C_{}V",
            self.test_type.as_str(),
            self.temperature_c,
            self.voltage_v
        )
    }
}

impl PartialEq for StressCell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StressCell {}

impl Hash for StressCell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.test_type.hash(state);
        self.temperature_c.to_bits().hash(state);
        self.voltage_v.to_bits().hash(state);
    }
}

impl Ord for StressCell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.test_type
            .cmp(&other.test_type)
            .then_with(|| self.temperature_c.total_cmp(&other.temperature_c))
            .then_with(|| self.voltage_v.total_cmp(&other.voltage_v))
    }
}

impl PartialOrd for StressCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StressCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}°C @ {}V",
            self.test_type, self.temperature_c, self.voltage_v
        )
    }
}

/// One simulated or observed device outcome.
///
/// Censored records carry the test-end time as their observed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeRecord {
    pub device_id: DeviceId,
    pub test_type: TestType,
    pub stress_temperature_c: f64,
    pub stress_voltage_v: f64,
    pub observed_hours: f64,
    /// True when the device survived to test end without failing.
    pub censored: bool,
    pub batch_id: BatchId,
}

impl LifetimeRecord {
    /// The stress cell this record belongs to.
    pub fn cell(&self) -> StressCell {
        StressCell::new(
            self.test_type,
            self.stress_temperature_c,
            self.stress_voltage_v,
        )
    }

    /// True when a failure was observed during the test.
    pub fn is_failure(&self) -> bool {
        !self.censored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    fn record(censored: bool) -> LifetimeRecord {
        LifetimeRecord {
            device_id: DeviceId(1),
            test_type: TestType::Htol,
            stress_temperature_c: 150.0,
            stress_voltage_v: 5.0,
            observed_hours: 812.5,
            censored,
            batch_id: BatchId::new("B2"),
        }
    }

    #[test]
    fn test_type_parse_and_display() {
        assert_eq!("htol".parse::<TestType>().unwrap(), TestType::Htol);
        assert_eq!(TestType::parse(" thb "), Some(TestType::Thb));
        assert_eq!(TestType::parse("TC"), Some(TestType::Tc));
        assert!("XYZ".parse::<TestType>().is_err());
        assert_eq!(TestType::Tc.to_string(), "TC");
    }

    #[test]
    fn test_type_orders_by_name() {
        let mut types = vec![TestType::Htol, TestType::Thb, TestType::Tc];
        types.sort();
        assert_eq!(types, vec![TestType::Htol, TestType::Tc, TestType::Thb]);
    }

    #[test]
    fn test_type_serde_names() {
        assert_eq!(serde_json::to_string(&TestType::Htol).unwrap(), "\"HTOL\"");
        let parsed: TestType = serde_json::from_str("\"TC\"").unwrap();
        assert_eq!(parsed, TestType::Tc);
    }

    #[test]
    fn stress_cell_ordering() {
        let a = StressCell::new(TestType::Htol, 125.0, 5.0);
        let b = StressCell::new(TestType::Htol, 150.0, 4.5);
        let c = StressCell::new(TestType::Tc, -40.0, 0.0);
        let d = StressCell::new(TestType::Htol, 125.0, 4.5);
        let set: BTreeSet<_> = [c, b, a, d].into_iter().collect();
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(ordered, vec![d, a, b, c]);
    }

    #[test]
    fn stress_cell_equality_is_exact() {
        let a = StressCell::new(TestType::Thb, 85.0, 3.3);
        let b = StressCell::new(TestType::Thb, 85.0, 3.3 + 1e-12);
        assert_ne!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn stress_cell_display_and_slug() {
        let cell = StressCell::new(TestType::Htol, 150.0, 5.0);
        assert_eq!(cell.to_string(), "HTOL 150°C @ 5V");
        assert_eq!(cell.slug(), "HTOL_150C_5V");
        assert!((cell.temperature_k() - 423.15).abs() < 1e-12);
    }

    #[test]
    fn record_cell_and_failure_flag() {
        let r = record(false);
        assert!(r.is_failure());
        assert_eq!(r.cell(), StressCell::new(TestType::Htol, 150.0, 5.0));
        assert!(!record(true).is_failure());
    }

    #[test]
    fn record_json_round_trip() {
        let r = record(true);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"test_type\":\"HTOL\""));
        let back: LifetimeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
