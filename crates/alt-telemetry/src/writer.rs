//! Batched Parquet writer for result tables.
//!
//! Rows are buffered as record batches and flushed once `batch_size` rows
//! accumulate. The file is written as `<table>.parquet.tmp` and renamed into
//! place on [`BatchedWriter::close`], so a reader never sees a partial table.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::Schema;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::metadata::KeyValue;
use parquet::file::properties::{WriterProperties, WriterVersion};
use thiserror::Error;

use crate::schema::TableName;

/// Errors from result storage.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A column is missing or has an unexpected type or value on read.
    #[error("column {column}: {message}")]
    Column { column: String, message: String },

    #[error("nothing was written to {table}")]
    EmptyBuffer { table: &'static str },
}

impl From<WriteError> for alt_common::Error {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Io(e) => alt_common::Error::Io(e),
            other => alt_common::Error::Storage(other.to_string()),
        }
    }
}

/// Where and how a run's tables are written.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub base_dir: PathBuf,
    /// Subdirectory of `base_dir`; also stored in every file footer.
    pub run_id: String,
    pub compression: Compression,
    pub row_group_size: usize,
    /// Buffered rows that trigger a flush.
    pub batch_size: usize,
    /// Extra footer entries (seed, schema version).
    pub metadata: Vec<(String, String)>,
}

impl WriterConfig {
    pub fn new(base_dir: PathBuf, run_id: String) -> Self {
        WriterConfig {
            base_dir,
            run_id,
            compression: Compression::ZSTD(ZstdLevel::default()),
            row_group_size: 512 * 1024,
            batch_size: crate::DEFAULT_BATCH_SIZE,
            metadata: Vec::new(),
        }
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// `<base_dir>/<run_id>`
    pub fn run_dir(&self) -> PathBuf {
        self.base_dir.join(&self.run_id)
    }

    /// `<base_dir>/<run_id>/<table>.parquet`
    pub fn table_path(&self, table: TableName) -> PathBuf {
        self.run_dir().join(format!("{}.parquet", table.as_str()))
    }

    fn properties(&self, table: TableName) -> WriterProperties {
        let footer = [
            ("run_id", self.run_id.clone()),
            ("table", table.as_str().to_string()),
            ("created_at", chrono::Utc::now().to_rfc3339()),
        ]
        .into_iter()
        .map(|(k, v)| KeyValue::new(k.to_string(), v))
        .chain(
            self.metadata
                .iter()
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone())),
        )
        .collect();

        WriterProperties::builder()
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            // test type, hazard class and batch id repeat on every row
            .set_dictionary_enabled(true)
            .set_key_value_metadata(Some(footer))
            .build()
    }
}

/// An open `.tmp` file and where it goes on close.
struct OpenFile {
    writer: ArrowWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
}

/// Buffered writer for one result table.
pub struct BatchedWriter {
    table: TableName,
    schema: Arc<Schema>,
    config: WriterConfig,
    pending: Vec<RecordBatch>,
    pending_rows: usize,
    written_rows: usize,
    file: Option<OpenFile>,
}

impl BatchedWriter {
    pub fn new(table: TableName, schema: Arc<Schema>, config: WriterConfig) -> Self {
        BatchedWriter {
            table,
            schema,
            config,
            pending: Vec::new(),
            pending_rows: 0,
            written_rows: 0,
            file: None,
        }
    }

    /// Buffer `batch`, flushing when the buffer reaches the batch size.
    ///
    /// A zero-row batch still counts as a write, so an empty table is
    /// materialized with its schema.
    pub fn write(&mut self, batch: RecordBatch) -> Result<(), WriteError> {
        self.pending_rows += batch.num_rows();
        self.pending.push(batch);
        if self.pending_rows >= self.config.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write buffered batches to the temp file, opening it on first use.
    pub fn flush(&mut self) -> Result<(), WriteError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let opened = match self.file.take() {
            Some(file) => file,
            None => self.open()?,
        };
        let file = self.file.insert(opened);
        for batch in self.pending.drain(..) {
            file.writer.write(&batch)?;
        }

        tracing::debug!(table = self.table.as_str(), rows = self.pending_rows, "flushed result rows");
        self.written_rows += self.pending_rows;
        self.pending_rows = 0;
        Ok(())
    }

    /// Flush, finish the Parquet footer and move the file into place.
    pub fn close(mut self) -> Result<PathBuf, WriteError> {
        self.flush()?;
        let OpenFile {
            writer,
            temp_path,
            final_path,
        } = self.file.take().ok_or(WriteError::EmptyBuffer {
            table: self.table.as_str(),
        })?;
        writer.close()?;
        fs::rename(&temp_path, &final_path)?;

        tracing::info!(
            table = self.table.as_str(),
            rows = self.written_rows,
            path = %final_path.display(),
            "result table written"
        );
        Ok(final_path)
    }

    fn open(&self) -> Result<OpenFile, WriteError> {
        let final_path = self.config.table_path(self.table);
        fs::create_dir_all(self.config.run_dir())?;
        let temp_path = final_path.with_extension("parquet.tmp");
        let writer = ArrowWriter::try_new(
            File::create(&temp_path)?,
            self.schema.clone(),
            Some(self.config.properties(self.table)),
        )?;
        Ok(OpenFile {
            writer,
            temp_path,
            final_path,
        })
    }
}

impl Drop for BatchedWriter {
    fn drop(&mut self) {
        // An unclosed writer discards its temp file
        if let Some(file) = self.file.take() {
            let _ = fs::remove_file(&file.temp_path);
        }
    }
}

/// Default base directory for run outputs: `<XDG data>/alt/runs`.
pub fn default_output_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alt")
        .join("runs")
}
