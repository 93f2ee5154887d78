//! Whole-run persistence: write all result tables for a run, read records back.

use std::fs::File;
use std::path::{Path, PathBuf};

use alt_common::{LifetimeRecord, SkippedCell, WeibullFitResult};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::batches::{batch_to_records, fits_to_batch, records_to_batch, skipped_to_batch};
use crate::schema::{ResultSchema, TableName};
use crate::writer::{BatchedWriter, WriteError, WriterConfig};

/// Paths of the tables written for one run.
#[derive(Debug, Clone)]
pub struct RunTables {
    pub lifetime_records: PathBuf,
    pub weibull_fits: PathBuf,
    pub skipped_cells: PathBuf,
}

/// Write the three result tables of a run under `config.run_dir()`.
///
/// Every table is written even when it has no rows, so readers can rely on
/// the layout.
pub fn write_run_tables(
    config: &WriterConfig,
    records: &[LifetimeRecord],
    fits: &[WeibullFitResult],
    skipped: &[SkippedCell],
) -> Result<RunTables, WriteError> {
    let schemas = ResultSchema::new();

    let write_one = |table: TableName, batch| -> Result<PathBuf, WriteError> {
        let table_config = config
            .clone()
            .with_row_group_size(table.row_group_size().min(config.row_group_size));
        let mut writer = BatchedWriter::new(table, schemas.get(table), table_config);
        writer.write(batch)?;
        writer.close()
    };

    Ok(RunTables {
        lifetime_records: write_one(TableName::LifetimeRecords, records_to_batch(records)?)?,
        weibull_fits: write_one(TableName::WeibullFits, fits_to_batch(fits)?)?,
        skipped_cells: write_one(TableName::SkippedCells, skipped_to_batch(skipped)?)?,
    })
}

/// Read a `lifetime_records` Parquet file.
pub fn read_lifetime_records(path: &Path) -> Result<Vec<LifetimeRecord>, WriteError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        records.extend(batch_to_records(&batch?)?);
    }
    tracing::debug!(path = %path.display(), rows = records.len(), "read lifetime records");
    Ok(records)
}
