use std::time::Instant;

use chrono::Utc;
use tracing::{error, info};

use shopforge_core::TableName;

use crate::errors::{Result, StageError};
use crate::layer::StagingLayer;
use crate::model::{ExportMetadata, ExportSummary, OutputFormat, PIPELINE_NAME, TableResult};
use crate::source::TableSource;

/// Exports tables from a [`TableSource`] into one staging partition.
///
/// Tables are exported in order. The first failure is recorded and stops
/// the run; metadata and the `_SUCCESS` marker are only written when every
/// table succeeded.
pub struct IngestPipeline<'a, S: TableSource> {
    source: &'a S,
    staging: StagingLayer,
    tables: Vec<TableName>,
    format: OutputFormat,
}

impl<'a, S: TableSource> IngestPipeline<'a, S> {
    pub fn new(source: &'a S, staging: StagingLayer) -> Self {
        Self {
            source,
            staging,
            tables: TableName::ALL.to_vec(),
            format: OutputFormat::default(),
        }
    }

    /// Restrict the export to `tables`; an empty list keeps every table.
    pub fn with_tables(mut self, tables: Vec<TableName>) -> Self {
        if !tables.is_empty() {
            self.tables = tables;
        }
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn staging(&self) -> &StagingLayer {
        &self.staging
    }

    pub async fn run(&self) -> ExportSummary {
        let start = Instant::now();
        info!(
            pipeline = PIPELINE_NAME,
            export_date = %self.staging.export_date(),
            format = %self.format,
            tables = self.tables.len(),
            "export started"
        );

        let mut results = Vec::with_capacity(self.tables.len());
        let outcome = self.export_all(&mut results, start).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let summary = ExportSummary {
            success: outcome.is_ok(),
            export_date: self.staging.export_date(),
            partition: self.staging.partition().to_path_buf(),
            duration_ms,
            tables: results,
            error: outcome.err().map(|err| err.to_string()),
        };

        if summary.success {
            info!(
                pipeline = PIPELINE_NAME,
                tables = summary.tables.len(),
                duration_ms,
                "export finished"
            );
        } else {
            error!(
                pipeline = PIPELINE_NAME,
                error = summary.error.as_deref().unwrap_or_default(),
                duration_ms,
                "export failed"
            );
        }
        summary
    }

    async fn export_all(&self, results: &mut Vec<TableResult>, start: Instant) -> Result<()> {
        self.staging.setup()?;

        for table in &self.tables {
            match self.export_table(*table).await {
                Ok(result) => results.push(result),
                Err(err) => {
                    error!(table = %table, error = %err, "table export failed");
                    results.push(TableResult::failed(*table, err.to_string()));
                    return Err(StageError::TableFailed {
                        table: *table,
                        message: err.to_string(),
                    });
                }
            }
        }

        let metadata = ExportMetadata {
            pipeline: PIPELINE_NAME.to_string(),
            export_date: self.staging.export_date(),
            run_timestamp: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
            output_format: self.format,
            source: self.source.describe(),
            tables: results.clone(),
        };
        self.staging.write_metadata(&metadata)?;
        self.staging.write_success_marker()?;
        Ok(())
    }

    async fn export_table(&self, table: TableName) -> Result<TableResult> {
        let start = Instant::now();
        let frame = self.source.read_table(table).await?;
        let staged = self.staging.write_table(&frame, self.format)?;
        Ok(TableResult::success(
            table,
            staged.rows,
            staged.path,
            staged.bytes,
            start.elapsed().as_millis() as u64,
        ))
    }
}
