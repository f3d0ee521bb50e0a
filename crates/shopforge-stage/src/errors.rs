use std::path::PathBuf;

use shopforge_core::TableName;
use shopforge_store::StoreError;
use thiserror::Error;

/// Errors emitted while staging or validating exports.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{table}.{column}: cell does not match the column type")]
    CellType { table: TableName, column: String },
    #[error("no staged file for {table} under {}", dir.display())]
    MissingFile { table: TableName, dir: PathBuf },
    #[error("unsupported output format '{0}'")]
    UnknownFormat(String),
    #[error("export of {table} failed: {message}")]
    TableFailed { table: TableName, message: String },
}

pub type Result<T> = std::result::Result<T, StageError>;
