//! Accelerated life test result storage.
//!
//! This crate provides:
//! - Arrow schema definitions for record, fit and skip tables
//! - Conversions between domain types and record batches
//! - Batched Parquet writer with compression and atomic rename
//! - Whole-run table writing and record read-back

pub mod batches;
pub mod schema;
pub mod store;
pub mod writer;

pub use batches::{batch_to_records, fits_to_batch, records_to_batch, skipped_to_batch};
pub use schema::{
    lifetime_records_schema, skipped_cells_schema, weibull_fits_schema, ResultSchema, TableName,
};
pub use store::{read_lifetime_records, write_run_tables, RunTables};
pub use writer::{default_output_dir, BatchedWriter, WriteError, WriterConfig};

/// Schema version for result tables.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default batch size for buffered writes.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
