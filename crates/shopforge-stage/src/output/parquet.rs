use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Decimal128Array, Float64Array, Int16Array, Int32Array,
    Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use shopforge_core::{CellValue, ColumnKind, ColumnSpec, TableFrame};

use crate::errors::{Result, StageError};
use crate::output::StagedSummary;

fn data_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Bool => DataType::Boolean,
        ColumnKind::Int16 => DataType::Int16,
        ColumnKind::Int32 => DataType::Int32,
        ColumnKind::Int64 => DataType::Int64,
        ColumnKind::Float64 => DataType::Float64,
        ColumnKind::Decimal { precision, scale } => {
            DataType::Decimal128(precision, i8::try_from(scale).unwrap_or(i8::MAX))
        }
        ColumnKind::Text => DataType::Utf8,
        ColumnKind::Date => DataType::Date32,
        ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
    }
}

pub fn arrow_schema(frame: &TableFrame) -> Schema {
    Schema::new(
        frame
            .columns
            .iter()
            .map(|column| Field::new(&column.name, data_type(column.kind), column.nullable))
            .collect::<Vec<_>>(),
    )
}

/// Collect one column, mapping each cell with `convert` and treating `Null`
/// as a missing value. Any other mismatch is an error.
fn collect<T>(
    frame: &TableFrame,
    index: usize,
    column: &ColumnSpec,
    convert: impl Fn(&CellValue) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    frame
        .column(index)
        .map(|cell| match cell {
            CellValue::Null => Ok(None),
            other => convert(other).map(Some).ok_or_else(|| StageError::CellType {
                table: frame.table,
                column: column.name.clone(),
            }),
        })
        .collect()
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

fn column_array(frame: &TableFrame, index: usize, column: &ColumnSpec) -> Result<ArrayRef> {
    let array: ArrayRef = match column.kind {
        ColumnKind::Bool => Arc::new(BooleanArray::from(collect(frame, index, column, |cell| {
            match cell {
                CellValue::Bool(value) => Some(*value),
                _ => None,
            }
        })?)),
        ColumnKind::Int16 => Arc::new(Int16Array::from(collect(frame, index, column, |cell| {
            match cell {
                CellValue::Int(value) => i16::try_from(*value).ok(),
                _ => None,
            }
        })?)),
        ColumnKind::Int32 => Arc::new(Int32Array::from(collect(frame, index, column, |cell| {
            match cell {
                CellValue::Int(value) => i32::try_from(*value).ok(),
                _ => None,
            }
        })?)),
        ColumnKind::Int64 => Arc::new(Int64Array::from(collect(frame, index, column, |cell| {
            match cell {
                CellValue::Int(value) => Some(*value),
                _ => None,
            }
        })?)),
        ColumnKind::Float64 => Arc::new(Float64Array::from(collect(frame, index, column, |cell| {
            match cell {
                CellValue::Float(value) => Some(*value),
                CellValue::Int(value) => Some(*value as f64),
                _ => None,
            }
        })?)),
        ColumnKind::Decimal { precision, scale } => {
            let values = collect(frame, index, column, |cell| match cell {
                CellValue::Decimal(value) => {
                    let mut value = *value;
                    value.rescale(scale);
                    Some(value.mantissa())
                }
                _ => None,
            })?;
            Arc::new(
                Decimal128Array::from(values).with_precision_and_scale(
                    precision,
                    i8::try_from(scale).unwrap_or(i8::MAX),
                )?,
            )
        }
        ColumnKind::Text => Arc::new(StringArray::from(collect(frame, index, column, |cell| {
            match cell {
                CellValue::Text(value) => Some(value.clone()),
                _ => None,
            }
        })?)),
        ColumnKind::Date => Arc::new(Date32Array::from(collect(frame, index, column, |cell| {
            match cell {
                CellValue::Date(value) => Some(days_since_epoch(*value)),
                _ => None,
            }
        })?)),
        ColumnKind::Timestamp => Arc::new(TimestampMicrosecondArray::from(collect(
            frame,
            index,
            column,
            |cell| match cell {
                CellValue::Timestamp(value) => Some(value.and_utc().timestamp_micros()),
                _ => None,
            },
        )?)),
    };
    Ok(array)
}

/// Convert a frame into a single Arrow record batch.
pub fn frame_to_batch(frame: &TableFrame) -> Result<RecordBatch> {
    let schema = Arc::new(arrow_schema(frame));
    let columns = frame
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| column_array(frame, index, column))
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Write a frame as Snappy-compressed Parquet. Returns the file size.
pub fn write_frame_parquet(path: &Path, frame: &TableFrame) -> Result<u64> {
    let batch = frame_to_batch(frame)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(std::fs::metadata(path)?.len())
}

/// Column names, row count and the first `sample` rows of a staged Parquet
/// file, rendered with Arrow's display formatting.
pub fn read_parquet_summary(path: &Path, sample: usize) -> Result<StagedSummary> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    let rows = builder.metadata().file_metadata().num_rows().max(0) as u64;
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect::<Vec<_>>();

    let mut sample_rows: Vec<Vec<String>> = Vec::with_capacity(sample);
    if sample > 0 {
        let reader = builder.with_batch_size(sample).build()?;
        for batch in reader {
            let batch = batch?;
            for row in 0..batch.num_rows() {
                if sample_rows.len() >= sample {
                    break;
                }
                let values = batch
                    .columns()
                    .iter()
                    .map(|array| array_value_to_string(array.as_ref(), row))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                sample_rows.push(values);
            }
            if sample_rows.len() >= sample {
                break;
            }
        }
    }

    Ok(StagedSummary {
        columns,
        rows,
        sample: sample_rows,
    })
}
