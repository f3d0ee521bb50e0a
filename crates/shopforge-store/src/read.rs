//! Full-table reads used by the staging exporter and the validator.

use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;

use shopforge_core::{CellValue, ColumnKind, ColumnSpec, SOURCE_SCHEMA, TableFrame, TableName};

use crate::errors::{Result, StoreError};

/// Scale assumed for `numeric` columns declared without one.
const DEFAULT_NUMERIC_SCALE: u32 = 6;
const MAX_NUMERIC_PRECISION: u8 = 38;

struct RawColumn {
    name: String,
    data_type: String,
    nullable: bool,
    precision: Option<i32>,
    scale: Option<i32>,
}

fn column_kind(table: TableName, raw: &RawColumn) -> Result<ColumnKind> {
    let kind = match raw.data_type.as_str() {
        "boolean" => ColumnKind::Bool,
        "smallint" => ColumnKind::Int16,
        "integer" => ColumnKind::Int32,
        "bigint" => ColumnKind::Int64,
        "real" | "double precision" => ColumnKind::Float64,
        "numeric" => ColumnKind::Decimal {
            precision: raw
                .precision
                .and_then(|value| u8::try_from(value).ok())
                .unwrap_or(MAX_NUMERIC_PRECISION)
                .min(MAX_NUMERIC_PRECISION),
            scale: raw
                .scale
                .and_then(|value| u32::try_from(value).ok())
                .unwrap_or(DEFAULT_NUMERIC_SCALE),
        },
        "character varying" | "character" | "text" => ColumnKind::Text,
        "date" => ColumnKind::Date,
        "timestamp without time zone" => ColumnKind::Timestamp,
        other => {
            return Err(StoreError::UnsupportedType {
                table,
                column: raw.name.clone(),
                data_type: other.to_string(),
            });
        }
    };
    Ok(kind)
}

/// Columns of a table in ordinal order, as declared in the catalog.
pub async fn table_layout(pool: &PgPool, table: TableName) -> Result<Vec<ColumnSpec>> {
    let rows = sqlx::query(
        r#"
        select
          column_name::text as name,
          data_type::text as data_type,
          (is_nullable = 'YES') as nullable,
          numeric_precision::int4 as precision,
          numeric_scale::int4 as scale
        from information_schema.columns
        where table_schema = $1 and table_name = $2
        order by ordinal_position
        "#,
    )
    .bind(SOURCE_SCHEMA)
    .bind(table.as_str())
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Err(StoreError::MissingTable(table));
    }

    rows.into_iter()
        .map(|row| -> Result<ColumnSpec> {
            let raw = RawColumn {
                name: row.try_get("name")?,
                data_type: row.try_get("data_type")?,
                nullable: row.try_get("nullable")?,
                precision: row.try_get("precision")?,
                scale: row.try_get("scale")?,
            };
            let kind = column_kind(table, &raw)?;
            Ok(ColumnSpec::new(raw.name, kind, raw.nullable))
        })
        .collect()
}

fn decode_cell(row: &PgRow, index: usize, kind: ColumnKind) -> Result<CellValue> {
    let cell = match kind {
        ColumnKind::Bool => row.try_get::<Option<bool>, _>(index)?.map(CellValue::Bool),
        ColumnKind::Int16 => row
            .try_get::<Option<i16>, _>(index)?
            .map(|value| CellValue::Int(value.into())),
        ColumnKind::Int32 => row
            .try_get::<Option<i32>, _>(index)?
            .map(|value| CellValue::Int(value.into())),
        ColumnKind::Int64 => row.try_get::<Option<i64>, _>(index)?.map(CellValue::Int),
        ColumnKind::Float64 => row.try_get::<Option<f64>, _>(index)?.map(CellValue::Float),
        ColumnKind::Decimal { .. } => row
            .try_get::<Option<Decimal>, _>(index)?
            .map(CellValue::Decimal),
        ColumnKind::Text => row.try_get::<Option<String>, _>(index)?.map(CellValue::Text),
        ColumnKind::Date => row.try_get::<Option<NaiveDate>, _>(index)?.map(CellValue::Date),
        ColumnKind::Timestamp => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(CellValue::Timestamp),
    };
    Ok(cell.unwrap_or(CellValue::Null))
}

/// Read a whole table ordered by primary key.
pub async fn fetch_frame(pool: &PgPool, table: TableName) -> Result<TableFrame> {
    let start = Instant::now();
    let columns = table_layout(pool, table).await?;
    let select = columns
        .iter()
        .map(|column| format!("\"{}\"", column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let rows = sqlx::query(&format!("select {select} from {} order by 1", table.qualified()))
        .fetch_all(pool)
        .await?;

    let mut frame = TableFrame::new(table, columns);
    frame.rows.reserve(rows.len());
    for row in &rows {
        let cells = frame
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| decode_cell(row, index, column.kind))
            .collect::<Result<Vec<_>>>()?;
        frame.rows.push(cells);
    }

    info!(
        table = %table,
        rows = frame.row_count(),
        duration_ms = start.elapsed().as_millis() as u64,
        "read table"
    );
    Ok(frame)
}

pub async fn row_count(pool: &PgPool, table: TableName) -> Result<u64> {
    let count = sqlx::query_scalar::<_, i64>(&format!("select count(*) from {}", table.qualified()))
        .fetch_one(pool)
        .await?;
    Ok(count.max(0) as u64)
}

/// Row counts of every generated table, parents first.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(TableName, u64)>> {
    let mut counts = Vec::with_capacity(TableName::ALL.len());
    for table in TableName::ALL {
        counts.push((table, row_count(pool, table).await?));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(data_type: &str, precision: Option<i32>, scale: Option<i32>) -> RawColumn {
        RawColumn {
            name: "amount".to_string(),
            data_type: data_type.to_string(),
            nullable: false,
            precision,
            scale,
        }
    }

    #[test]
    fn maps_catalog_types() {
        let table = TableName::Orders;
        assert_eq!(
            column_kind(table, &raw("numeric", Some(15), Some(2))).unwrap(),
            ColumnKind::Decimal {
                precision: 15,
                scale: 2
            }
        );
        assert_eq!(
            column_kind(table, &raw("numeric", None, None)).unwrap(),
            ColumnKind::Decimal {
                precision: 38,
                scale: 6
            }
        );
        assert_eq!(
            column_kind(table, &raw("character varying", None, None)).unwrap(),
            ColumnKind::Text
        );
        assert_eq!(
            column_kind(table, &raw("timestamp without time zone", None, None)).unwrap(),
            ColumnKind::Timestamp
        );
    }

    #[test]
    fn rejects_unknown_types() {
        let err = column_kind(TableName::Orders, &raw("jsonb", None, None)).unwrap_err();
        assert!(err.to_string().contains("jsonb"));
    }
}
