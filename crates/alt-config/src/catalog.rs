//! Test-type catalog: stress levels, test duration and Weibull shape per test type.

use alt_common::{StressCell, TestType};
use serde::{Deserialize, Serialize};

/// Stress plan for one test type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTypeConfig {
    pub test_type: TestType,

    /// Stress temperatures in °C.
    pub temperatures_c: Vec<f64>,

    /// Stress voltages in V.
    pub voltages_v: Vec<f64>,

    /// Test duration; devices still alive at this time are censored.
    /// Must be finite so the catalog survives JSON export.
    pub test_end_hours: f64,

    /// Weibull shape β used when drawing lifetimes.
    pub shape: f64,
}

impl TestTypeConfig {
    /// Stress cells of this entry, temperatures outer and voltages inner.
    pub fn cells(&self) -> impl Iterator<Item = StressCell> + '_ {
        self.temperatures_c.iter().flat_map(move |&t| {
            self.voltages_v
                .iter()
                .map(move |&v| StressCell::new(self.test_type, t, v))
        })
    }

    /// Number of stress cells in this entry.
    pub fn cell_count(&self) -> usize {
        self.temperatures_c.len() * self.voltages_v.len()
    }
}

/// Ordered list of test-type entries. Generation walks it front to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<TestTypeConfig>,
}

impl Catalog {
    pub fn new(entries: Vec<TestTypeConfig>) -> Self {
        Catalog { entries }
    }

    pub fn entries(&self) -> &[TestTypeConfig] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entry for a test type, if present.
    pub fn get(&self, test_type: TestType) -> Option<&TestTypeConfig> {
        self.entries.iter().find(|e| e.test_type == test_type)
    }

    /// All stress cells, in generation order.
    pub fn cells(&self) -> Vec<StressCell> {
        self.entries.iter().flat_map(|e| e.cells()).collect()
    }

    /// Whether the catalog schedules the given cell.
    pub fn contains_cell(&self, cell: &StressCell) -> bool {
        self.get(cell.test_type)
            .map(|e| e.cells().any(|c| c == *cell))
            .unwrap_or(false)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(vec![
            TestTypeConfig {
                test_type: TestType::Htol,
                temperatures_c: vec![125.0, 150.0],
                voltages_v: vec![4.5, 5.0],
                test_end_hours: 2000.0,
                shape: 2.2,
            },
            TestTypeConfig {
                test_type: TestType::Thb,
                temperatures_c: vec![85.0],
                voltages_v: vec![3.3],
                test_end_hours: 1500.0,
                shape: 1.9,
            },
            TestTypeConfig {
                test_type: TestType::Tc,
                temperatures_c: vec![-40.0, 125.0],
                voltages_v: vec![0.0],
                test_end_hours: 1200.0,
                shape: 1.8,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_shape() {
        let catalog = Catalog::default();
        assert_eq!(catalog.len(), 3);
        let types: Vec<_> = catalog.entries().iter().map(|e| e.test_type).collect();
        assert_eq!(types, vec![TestType::Htol, TestType::Thb, TestType::Tc]);
        assert_eq!(catalog.get(TestType::Thb).unwrap().shape, 1.9);
        assert_eq!(catalog.get(TestType::Tc).unwrap().test_end_hours, 1200.0);
    }

    #[test]
    fn cells_follow_catalog_order() {
        let cells = Catalog::default().cells();
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[0], StressCell::new(TestType::Htol, 125.0, 4.5));
        assert_eq!(cells[1], StressCell::new(TestType::Htol, 125.0, 5.0));
        assert_eq!(cells[3], StressCell::new(TestType::Htol, 150.0, 5.0));
        assert_eq!(cells[4], StressCell::new(TestType::Thb, 85.0, 3.3));
        assert_eq!(cells[6], StressCell::new(TestType::Tc, 125.0, 0.0));
    }

    #[test]
    fn contains_cell() {
        let catalog = Catalog::default();
        assert!(catalog.contains_cell(&StressCell::new(TestType::Htol, 150.0, 5.0)));
        assert!(!catalog.contains_cell(&StressCell::new(TestType::Htol, 150.0, 3.3)));
    }

    #[test]
    fn serializes_as_array() {
        let json = serde_json::to_value(Catalog::default()).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["test_type"], "HTOL");
    }
}
