use tracing::{info, warn};

use shopforge_core::TableName;

use crate::errors::{Result, StageError};
use crate::layer::StagingLayer;
use crate::model::{
    CheckStatus, RowCountCheck, SampleComparison, SchemaCheck, ValidationReport,
};
use crate::source::TableSource;

/// Compares a staging partition against the live source.
pub struct DataValidator<'a, S: TableSource> {
    source: &'a S,
    staging: &'a StagingLayer,
}

impl<'a, S: TableSource> DataValidator<'a, S> {
    pub fn new(source: &'a S, staging: &'a StagingLayer) -> Self {
        Self { source, staging }
    }

    pub async fn validate_row_counts(&self, tables: &[TableName]) -> Result<Vec<RowCountCheck>> {
        let mut checks = Vec::with_capacity(tables.len());
        for table in tables {
            let source_count = self.source.row_count(*table).await?;
            let staging_count = match self.staging.read_staged(*table, 0) {
                Ok(summary) => Some(summary.rows),
                Err(StageError::MissingFile { .. }) => None,
                Err(err) => return Err(err),
            };
            let status = CheckStatus::from_bool(staging_count == Some(source_count));
            log_check(*table, status, || {
                format!("source={source_count} staging={staging_count:?}")
            });
            checks.push(RowCountCheck {
                table: *table,
                source_count,
                staging_count,
                status,
            });
        }
        Ok(checks)
    }

    pub async fn validate_schema(&self, tables: &[TableName]) -> Result<Vec<SchemaCheck>> {
        let mut checks = Vec::with_capacity(tables.len());
        for table in tables {
            let expected = self.source.columns(*table).await?;
            let staged = match self.staging.read_staged(*table, 0) {
                Ok(summary) => summary.columns,
                Err(StageError::MissingFile { .. }) => Vec::new(),
                Err(err) => return Err(err),
            };
            let missing_columns: Vec<String> = expected
                .iter()
                .filter(|column| !staged.contains(column))
                .cloned()
                .collect();
            let extra_columns: Vec<String> = staged
                .iter()
                .filter(|column| !expected.contains(column))
                .cloned()
                .collect();
            let status =
                CheckStatus::from_bool(missing_columns.is_empty() && extra_columns.is_empty());
            log_check(*table, status, || {
                format!("missing={missing_columns:?} extra={extra_columns:?}")
            });
            checks.push(SchemaCheck {
                table: *table,
                missing_columns,
                extra_columns,
                status,
            });
        }
        Ok(checks)
    }

    /// First `size` rows on both sides, for eyeballing.
    pub async fn sample(&self, table: TableName, size: usize) -> Result<SampleComparison> {
        let frame = self.source.read_table(table).await?;
        let staged = self.staging.read_staged(table, size)?;
        let source = frame
            .rows
            .iter()
            .take(size)
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        Ok(SampleComparison {
            table,
            columns: frame.column_names().into_iter().map(str::to_string).collect(),
            source,
            staged: staged.sample,
        })
    }

    /// Row counts and schema for `tables`, plus samples when `sample_size > 0`.
    pub async fn validate(
        &self,
        tables: &[TableName],
        sample_size: usize,
    ) -> Result<ValidationReport> {
        let row_counts = self.validate_row_counts(tables).await?;
        let schemas = self.validate_schema(tables).await?;

        let mut samples = Vec::new();
        if sample_size > 0 {
            for check in row_counts.iter().filter(|check| check.staging_count.is_some()) {
                samples.push(self.sample(check.table, sample_size).await?);
            }
        }

        let report = ValidationReport {
            export_date: self.staging.export_date(),
            row_counts,
            schemas,
            samples,
        };
        info!(
            export_date = %report.export_date,
            passed = report.passed(),
            tables = tables.len(),
            "validation finished"
        );
        Ok(report)
    }
}

fn log_check(table: TableName, status: CheckStatus, detail: impl FnOnce() -> String) {
    match status {
        CheckStatus::Pass => info!(table = %table, detail = %detail(), "check passed"),
        CheckStatus::Fail => warn!(table = %table, detail = %detail(), "check failed"),
    }
}
