//! Conversion between domain types and Arrow record batches.

use std::sync::Arc;

use alt_common::{
    BatchId, DeviceId, LifetimeRecord, SkippedCell, StressCell, TestType, WeibullFitResult,
};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray,
};

use crate::schema::{lifetime_records_schema, skipped_cells_schema, weibull_fits_schema};
use crate::writer::WriteError;

fn cell_columns(cells: &[StressCell]) -> Vec<ArrayRef> {
    vec![
        Arc::new(StringArray::from_iter_values(
            cells.iter().map(|c| c.test_type.as_str()),
        )),
        Arc::new(Float64Array::from_iter_values(
            cells.iter().map(|c| c.temperature_c),
        )),
        Arc::new(Float64Array::from_iter_values(cells.iter().map(|c| c.voltage_v))),
    ]
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Build a `lifetime_records` batch.
pub fn records_to_batch(records: &[LifetimeRecord]) -> Result<RecordBatch, WriteError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.device_id.to_string()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.test_type.as_str()),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.stress_temperature_c),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.stress_voltage_v),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.observed_hours),
        )),
        Arc::new(BooleanArray::from(
            records.iter().map(|r| r.censored).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.batch_id.as_str()),
        )),
    ];
    Ok(RecordBatch::try_new(
        Arc::new(lifetime_records_schema()),
        columns,
    )?)
}

/// Build a `weibull_fits` batch.
pub fn fits_to_batch(fits: &[WeibullFitResult]) -> Result<RecordBatch, WriteError> {
    let cells: Vec<StressCell> = fits.iter().map(|f| f.cell).collect();
    let mut columns = cell_columns(&cells);
    let bound = |pick: fn(&alt_common::ConfidenceBounds) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(
            fits.iter()
                .map(|f| f.bounds.as_ref().map(pick))
                .collect::<Vec<_>>(),
        ))
    };
    let stats: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(fits.iter().map(|f| count(f.n_total)))),
        Arc::new(Int64Array::from_iter_values(
            fits.iter().map(|f| count(f.n_failures)),
        )),
        Arc::new(Int64Array::from_iter_values(
            fits.iter().map(|f| count(f.n_censored)),
        )),
        Arc::new(Float64Array::from_iter_values(fits.iter().map(|f| f.shape))),
        Arc::new(Float64Array::from_iter_values(fits.iter().map(|f| f.scale))),
        Arc::new(Float64Array::from_iter_values(fits.iter().map(|f| f.mttf_hours))),
        Arc::new(StringArray::from_iter_values(
            fits.iter().map(|f| f.hazard.to_string()),
        )),
        Arc::new(Float64Array::from_iter_values(
            fits.iter().map(|f| f.log_likelihood),
        )),
        Arc::new(Int32Array::from_iter_values(
            fits.iter()
                .map(|f| i32::try_from(f.iterations).unwrap_or(i32::MAX)),
        )),
        bound(|b| b.shape_lower),
        bound(|b| b.shape_upper),
        bound(|b| b.scale_lower),
        bound(|b| b.scale_upper),
    ];
    columns.extend(stats);
    Ok(RecordBatch::try_new(Arc::new(weibull_fits_schema()), columns)?)
}

/// Build a `skipped_cells` batch.
pub fn skipped_to_batch(skipped: &[SkippedCell]) -> Result<RecordBatch, WriteError> {
    let cells: Vec<StressCell> = skipped.iter().map(|s| s.cell).collect();
    let mut columns = cell_columns(&cells);
    let detail: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            skipped.iter().map(|s| count(s.n_total)),
        )),
        Arc::new(Int64Array::from_iter_values(
            skipped.iter().map(|s| count(s.n_failures)),
        )),
        Arc::new(StringArray::from_iter_values(
            skipped.iter().map(|s| s.reason.tag()),
        )),
        Arc::new(StringArray::from_iter_values(
            skipped.iter().map(|s| s.reason.to_string()),
        )),
    ];
    columns.extend(detail);
    Ok(RecordBatch::try_new(Arc::new(skipped_cells_schema()), columns)?)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T, WriteError> {
    let array = batch.column_by_name(name).ok_or_else(|| WriteError::Column {
        column: name.to_string(),
        message: "missing".to_string(),
    })?;
    if array.null_count() > 0 {
        return Err(WriteError::Column {
            column: name.to_string(),
            message: format!("{} null values", array.null_count()),
        });
    }
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| WriteError::Column {
            column: name.to_string(),
            message: format!("unexpected type {}", array.data_type()),
        })
}

/// Decode a `lifetime_records` batch back into domain records.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<LifetimeRecord>, WriteError> {
    let device_id = column::<StringArray>(batch, "device_id")?;
    let test_type = column::<StringArray>(batch, "test_type")?;
    let temperature = column::<Float64Array>(batch, "stress_temperature_c")?;
    let voltage = column::<Float64Array>(batch, "stress_voltage_v")?;
    let observed = column::<Float64Array>(batch, "observed_hours")?;
    let censored = column::<BooleanArray>(batch, "censored")?;
    let batch_id = column::<StringArray>(batch, "batch_id")?;

    (0..batch.num_rows())
        .map(|i| {
            let id = DeviceId::parse(device_id.value(i)).ok_or_else(|| WriteError::Column {
                column: "device_id".to_string(),
                message: format!("bad device id {:?} at row {}", device_id.value(i), i),
            })?;
            let tt = TestType::parse(test_type.value(i)).ok_or_else(|| WriteError::Column {
                column: "test_type".to_string(),
                message: format!("unknown test type {:?} at row {}", test_type.value(i), i),
            })?;
            Ok(LifetimeRecord {
                device_id: id,
                test_type: tt,
                stress_temperature_c: temperature.value(i),
                stress_voltage_v: voltage.value(i),
                observed_hours: observed.value(i),
                censored: censored.value(i),
                batch_id: BatchId::new(batch_id.value(i)),
            })
        })
        .collect()
}
