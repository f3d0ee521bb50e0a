//! Column-typed snapshot of a table, as read back for staging.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tables::TableName;

/// Storage type of a column, reduced to what the exporters distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    Bool,
    Int16,
    Int32,
    Int64,
    Float64,
    Decimal { precision: u8, scale: u32 },
    Text,
    Date,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable,
        }
    }
}

/// One cell. Integer columns of every width share `Int`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// Renders the CSV form of a cell; `Null` renders empty.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Decimal(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            CellValue::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

/// A whole table in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFrame {
    pub table: TableName,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<CellValue>>,
}

impl TableFrame {
    pub fn new(table: TableName, columns: Vec<ColumnSpec>) -> Self {
        Self {
            table,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Every cell of column `index`, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&CellValue::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_cells_for_csv() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Timestamp(ts).to_string(), "2024-03-09 14:05:00");
        assert_eq!(CellValue::Decimal(Decimal::new(12_345, 2)).to_string(), "123.45");
        assert_eq!(CellValue::Date(ts.date()).to_string(), "2024-03-09");
    }

    #[test]
    fn short_rows_read_as_null() {
        let mut frame = TableFrame::new(
            TableName::Categories,
            vec![
                ColumnSpec::new("id", ColumnKind::Int32, false),
                ColumnSpec::new("name", ColumnKind::Text, false),
            ],
        );
        frame.rows.push(vec![CellValue::Int(1)]);
        let names: Vec<_> = frame.column(1).collect();
        assert_eq!(names, vec![&CellValue::Null]);
        assert_eq!(frame.column_names(), vec!["id", "name"]);
    }
}
