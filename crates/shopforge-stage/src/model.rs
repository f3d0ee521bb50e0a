use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shopforge_core::{RedactedConnection, SOURCE_SCHEMA, TableName};

use crate::errors::StageError;

pub const PIPELINE_NAME: &str = "source_to_staging";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Csv, OutputFormat::Parquet];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = StageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(StageError::UnknownFormat(other.to_string())),
        }
    }
}

/// Where the exported rows came from, with credentials removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub schema: String,
    pub connection: String,
}

impl SourceDescriptor {
    pub fn from_connection(connection: &RedactedConnection) -> Self {
        Self {
            host: connection.host.clone(),
            port: connection.port,
            database: connection.database.clone(),
            schema: SOURCE_SCHEMA.to_string(),
            connection: connection.redacted.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Success,
    Failed,
}

/// Outcome of exporting one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    pub table: TableName,
    pub status: TableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableResult {
    pub fn success(table: TableName, rows: u64, file: PathBuf, bytes: u64, duration_ms: u64) -> Self {
        Self {
            table,
            status: TableStatus::Success,
            rows: Some(rows),
            file: Some(file),
            bytes: Some(bytes),
            duration_ms: Some(duration_ms),
            error: None,
        }
    }

    pub fn failed(table: TableName, error: String) -> Self {
        Self {
            table,
            status: TableStatus::Failed,
            rows: None,
            file: None,
            bytes: None,
            duration_ms: None,
            error: Some(error),
        }
    }
}

/// Contents of `_metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub pipeline: String,
    pub export_date: NaiveDate,
    pub run_timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub output_format: OutputFormat,
    pub source: SourceDescriptor,
    pub tables: Vec<TableResult>,
}

impl ExportMetadata {
    pub fn rows(&self, table: TableName) -> Option<u64> {
        self.tables
            .iter()
            .find(|result| result.table == table)
            .and_then(|result| result.rows)
    }
}

/// Value returned by an export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub success: bool,
    pub export_date: NaiveDate,
    pub partition: PathBuf,
    pub duration_ms: u64,
    pub tables: Vec<TableResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    pub fn from_bool(passed: bool) -> Self {
        if passed { CheckStatus::Pass } else { CheckStatus::Fail }
    }
}

/// Source vs staged row count for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowCountCheck {
    pub table: TableName,
    pub source_count: u64,
    /// `None` when no staged file exists.
    pub staging_count: Option<u64>,
    pub status: CheckStatus,
}

/// Source vs staged column names for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaCheck {
    pub table: TableName,
    pub missing_columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub status: CheckStatus,
}

/// First rows of a table on both sides, rendered as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleComparison {
    pub table: TableName,
    pub columns: Vec<String>,
    pub source: Vec<Vec<String>>,
    pub staged: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub export_date: NaiveDate,
    pub row_counts: Vec<RowCountCheck>,
    pub schemas: Vec<SchemaCheck>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<SampleComparison>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.row_counts
            .iter()
            .map(|check| check.status)
            .chain(self.schemas.iter().map(|check| check.status))
            .all(|status| status == CheckStatus::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("parquet".parse::<OutputFormat>().unwrap(), OutputFormat::Parquet);
        assert!("json".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn failed_results_omit_success_fields() {
        let result = TableResult::failed(TableName::Orders, "boom".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["table"], "orders");
        assert!(json.get("rows").is_none());
    }

    #[test]
    fn report_fails_on_any_failed_check() {
        let report = ValidationReport {
            export_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            row_counts: vec![
                RowCountCheck {
                    table: TableName::Orders,
                    source_count: 3,
                    staging_count: Some(3),
                    status: CheckStatus::Pass,
                },
                RowCountCheck {
                    table: TableName::Payments,
                    source_count: 3,
                    staging_count: None,
                    status: CheckStatus::Fail,
                },
            ],
            schemas: Vec::new(),
            samples: Vec::new(),
        };
        assert!(!report.passed());
    }
}
