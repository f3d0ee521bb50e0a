use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use shopforge_core::{TableFrame, TableName};

use crate::errors::{Result, StageError};
use crate::model::{ExportMetadata, OutputFormat};
use crate::output::StagedSummary;
use crate::output::csv::{read_csv_summary, render_frame_csv, write_frame_csv};
use crate::output::parquet::{read_parquet_summary, write_frame_parquet};

pub const METADATA_FILE: &str = "_metadata.json";
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// One dated partition of the staging area:
/// `root/export_date=YYYY-MM-DD/`.
#[derive(Debug, Clone)]
pub struct StagingLayer {
    export_date: NaiveDate,
    partition: PathBuf,
}

/// A table file written into the partition.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub rows: u64,
    pub bytes: u64,
}

impl StagingLayer {
    pub fn new(root: impl Into<PathBuf>, export_date: NaiveDate) -> Self {
        let root = root.into();
        let partition = root.join(partition_name(export_date));
        Self {
            export_date,
            partition,
        }
    }

    pub fn export_date(&self) -> NaiveDate {
        self.export_date
    }

    pub fn partition(&self) -> &Path {
        &self.partition
    }

    /// Create the partition directory and drop a marker left by an earlier
    /// run, so the partition is untrusted until this run completes.
    pub fn setup(&self) -> Result<()> {
        fs::create_dir_all(&self.partition)?;
        let marker = self.success_marker_path();
        if marker.exists() {
            fs::remove_file(&marker)?;
        }
        info!(path = %self.partition.display(), "staging partition ready");
        Ok(())
    }

    pub fn table_path(&self, table: TableName, format: OutputFormat) -> PathBuf {
        self.partition
            .join(format!("{}.{}", table.as_str(), format.extension()))
    }

    /// Write a table in `format`, removing a copy staged in the other format.
    pub fn write_table(&self, frame: &TableFrame, format: OutputFormat) -> Result<StagedFile> {
        for other in OutputFormat::ALL.into_iter().filter(|other| *other != format) {
            let stale = self.table_path(frame.table, other);
            if stale.exists() {
                fs::remove_file(&stale)?;
            }
        }
        match format {
            OutputFormat::Csv => self.write_csv(frame),
            OutputFormat::Parquet => self.write_parquet(frame),
        }
    }

    pub fn write_csv(&self, frame: &TableFrame) -> Result<StagedFile> {
        let path = self.table_path(frame.table, OutputFormat::Csv);
        let bytes = write_frame_csv(&path, frame)?;
        info!(
            table = %frame.table,
            rows = frame.row_count(),
            bytes,
            path = %path.display(),
            "staged csv"
        );
        Ok(StagedFile {
            path,
            rows: frame.row_count() as u64,
            bytes,
        })
    }

    /// Writes Snappy Parquet and logs the size saving against the CSV render.
    pub fn write_parquet(&self, frame: &TableFrame) -> Result<StagedFile> {
        let path = self.table_path(frame.table, OutputFormat::Parquet);
        let bytes = write_frame_parquet(&path, frame)?;
        let csv_bytes = render_frame_csv(std::io::sink(), frame)?;
        let saving_pct = if csv_bytes > 0 {
            (1.0 - bytes as f64 / csv_bytes as f64) * 100.0
        } else {
            0.0
        };
        info!(
            table = %frame.table,
            rows = frame.row_count(),
            bytes,
            csv_bytes,
            saving_pct = (saving_pct * 10.0).round() / 10.0,
            path = %path.display(),
            "staged parquet"
        );
        Ok(StagedFile {
            path,
            rows: frame.row_count() as u64,
            bytes,
        })
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.partition.join(METADATA_FILE)
    }

    pub fn write_metadata(&self, metadata: &ExportMetadata) -> Result<PathBuf> {
        let path = self.metadata_path();
        let mut file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(&mut file, metadata)?;
        file.write_all(b"\n")?;
        info!(path = %path.display(), "metadata written");
        Ok(path)
    }

    pub fn read_metadata(&self) -> Result<ExportMetadata> {
        let content = fs::read_to_string(self.metadata_path())?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn success_marker_path(&self) -> PathBuf {
        self.partition.join(SUCCESS_MARKER)
    }

    /// Zero-byte marker; written last so readers can trust the partition.
    pub fn write_success_marker(&self) -> Result<PathBuf> {
        let path = self.success_marker_path();
        fs::File::create(&path)?;
        info!(path = %path.display(), "success marker written");
        Ok(path)
    }

    pub fn is_complete(&self) -> bool {
        self.success_marker_path().is_file()
    }

    /// Locate the staged file of a table, preferring CSV over Parquet.
    pub fn staged_file(&self, table: TableName) -> Option<(PathBuf, OutputFormat)> {
        OutputFormat::ALL
            .into_iter()
            .map(|format| (self.table_path(table, format), format))
            .find(|(path, _)| path.is_file())
    }

    pub fn read_staged(&self, table: TableName, sample: usize) -> Result<StagedSummary> {
        let (path, format) = self.staged_file(table).ok_or_else(|| StageError::MissingFile {
            table,
            dir: self.partition.clone(),
        })?;
        match format {
            OutputFormat::Csv => read_csv_summary(&path, sample),
            OutputFormat::Parquet => read_parquet_summary(&path, sample),
        }
    }
}

pub fn partition_name(date: NaiveDate) -> String {
    format!("export_date={}", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_path_uses_iso_date() {
        let layer = StagingLayer::new(
            "/data/staging",
            NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
        );
        assert_eq!(
            layer.partition(),
            Path::new("/data/staging/export_date=2025-03-07")
        );
        assert_eq!(
            layer.table_path(TableName::OrderItems, OutputFormat::Parquet),
            Path::new("/data/staging/export_date=2025-03-07/order_items.parquet")
        );
        assert_eq!(
            layer.success_marker_path(),
            Path::new("/data/staging/export_date=2025-03-07/_SUCCESS")
        );
    }
}
