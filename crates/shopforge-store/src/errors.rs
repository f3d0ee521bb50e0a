use shopforge_core::{CoreError, TableName};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{table} row {row} references missing parent position {position}")]
    DanglingRef {
        table: TableName,
        row: usize,
        position: usize,
    },
    #[error("{table}: insert returned {got} ids for {expected} rows")]
    IdCount {
        table: TableName,
        expected: usize,
        got: usize,
    },
    #[error("{column} = {value} cannot be stored as numeric")]
    Money { column: &'static str, value: f64 },
    #[error("{table}.{column} has unsupported type '{data_type}'")]
    UnsupportedType {
        table: TableName,
        column: String,
        data_type: String,
    },
    #[error("table {0} not found in schema")]
    MissingTable(TableName),
}

pub type Result<T> = std::result::Result<T, StoreError>;
