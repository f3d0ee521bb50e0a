//! Staging export for shopforge.
//!
//! Reads tables from a [`TableSource`], writes them into a dated partition
//! (`export_date=YYYY-MM-DD/`) as CSV or Parquet, records `_metadata.json`
//! and the `_SUCCESS` marker, and validates a partition against its source.

pub mod errors;
pub mod layer;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod validate;

pub use errors::{Result, StageError};
pub use layer::{METADATA_FILE, SUCCESS_MARKER, StagedFile, StagingLayer, partition_name};
pub use model::{
    CheckStatus, ExportMetadata, ExportSummary, OutputFormat, PIPELINE_NAME, RowCountCheck,
    SampleComparison, SchemaCheck, SourceDescriptor, TableResult, TableStatus, ValidationReport,
};
pub use output::StagedSummary;
pub use pipeline::IngestPipeline;
pub use source::{PgSource, TableSource};
pub use validate::DataValidator;
