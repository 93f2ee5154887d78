//! Arrow schema definitions for study result tables.
//!
//! Tables defined:
//! - `lifetime_records`: one row per simulated or observed device
//! - `weibull_fits`: one row per fitted stress cell
//! - `skipped_cells`: one row per stress cell the fitter declined

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

/// Table names for result storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    LifetimeRecords,
    WeibullFits,
    SkippedCells,
}

impl TableName {
    pub const ALL: &'static [TableName] = &[
        TableName::LifetimeRecords,
        TableName::WeibullFits,
        TableName::SkippedCells,
    ];

    /// Get the string name used for file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::LifetimeRecords => "lifetime_records",
            TableName::WeibullFits => "weibull_fits",
            TableName::SkippedCells => "skipped_cells",
        }
    }

    /// Get the default maximum rows per row group for this table.
    pub fn row_group_size(&self) -> usize {
        match self {
            TableName::LifetimeRecords => 1024 * 1024,
            TableName::WeibullFits => 64 * 1024,
            TableName::SkippedCells => 64 * 1024,
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Container for all result schemas.
pub struct ResultSchema {
    pub lifetime_records: Arc<Schema>,
    pub weibull_fits: Arc<Schema>,
    pub skipped_cells: Arc<Schema>,
}

impl ResultSchema {
    /// Create all schemas.
    pub fn new() -> Self {
        ResultSchema {
            lifetime_records: Arc::new(lifetime_records_schema()),
            weibull_fits: Arc::new(weibull_fits_schema()),
            skipped_cells: Arc::new(skipped_cells_schema()),
        }
    }

    /// Get schema by table name.
    pub fn get(&self, table: TableName) -> Arc<Schema> {
        match table {
            TableName::LifetimeRecords => self.lifetime_records.clone(),
            TableName::WeibullFits => self.weibull_fits.clone(),
            TableName::SkippedCells => self.skipped_cells.clone(),
        }
    }
}

impl Default for ResultSchema {
    fn default() -> Self {
        Self::new()
    }
}

fn string_field(name: &str, nullable: bool) -> Field {
    Field::new(name, DataType::Utf8, nullable)
}

fn f64_field(name: &str, nullable: bool) -> Field {
    Field::new(name, DataType::Float64, nullable)
}

/// Stress cell key columns shared by the fit and skip tables.
fn cell_fields() -> Vec<Field> {
    vec![
        string_field("test_type", false),
        f64_field("temperature_c", false),
        f64_field("voltage_v", false),
    ]
}

/// Schema for `lifetime_records`.
pub fn lifetime_records_schema() -> Schema {
    Schema::new(vec![
        string_field("device_id", false),
        string_field("test_type", false),
        f64_field("stress_temperature_c", false),
        f64_field("stress_voltage_v", false),
        f64_field("observed_hours", false),
        Field::new("censored", DataType::Boolean, false),
        string_field("batch_id", false),
    ])
}

/// Schema for `weibull_fits`.
pub fn weibull_fits_schema() -> Schema {
    let mut fields = cell_fields();
    fields.extend([
        Field::new("n_total", DataType::Int64, false),
        Field::new("n_failures", DataType::Int64, false),
        Field::new("n_censored", DataType::Int64, false),
        f64_field("shape", false),
        f64_field("scale", false),
        f64_field("mttf_hours", false),
        string_field("hazard", false),
        f64_field("log_likelihood", false),
        Field::new("iterations", DataType::Int32, false),
        // Wald bounds, absent when the information matrix is singular
        f64_field("shape_lower", true),
        f64_field("shape_upper", true),
        f64_field("scale_lower", true),
        f64_field("scale_upper", true),
    ]);
    Schema::new(fields)
}

/// Schema for `skipped_cells`.
pub fn skipped_cells_schema() -> Schema {
    let mut fields = cell_fields();
    fields.extend([
        Field::new("n_total", DataType::Int64, false),
        Field::new("n_failures", DataType::Int64, false),
        string_field("reason", false),
        string_field("detail", false),
    ]);
    Schema::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_records_schema() {
        let schema = lifetime_records_schema();
        assert_eq!(schema.fields().len(), 7);
        assert!(schema.field_with_name("observed_hours").is_ok());
        assert_eq!(
            schema.field_with_name("censored").unwrap().data_type(),
            &DataType::Boolean
        );
    }

    #[test]
    fn test_weibull_fits_schema() {
        let schema = weibull_fits_schema();
        assert!(schema.field_with_name("test_type").is_ok());
        assert!(schema.field_with_name("shape_lower").unwrap().is_nullable());
        assert!(!schema.field_with_name("shape").unwrap().is_nullable());
    }

    #[test]
    fn test_skipped_cells_schema() {
        let schema = skipped_cells_schema();
        assert_eq!(schema.fields().len(), 7);
        assert!(schema.field_with_name("reason").is_ok());
    }

    #[test]
    fn test_table_name_display() {
        assert_eq!(TableName::WeibullFits.to_string(), "weibull_fits");
        assert_eq!(TableName::ALL.len(), 3);
    }

    #[test]
    fn test_result_schema_get() {
        let schemas = ResultSchema::new();
        assert_eq!(
            schemas.get(TableName::SkippedCells).fields().len(),
            skipped_cells_schema().fields().len()
        );
    }
}
