pub mod csv;
pub mod parquet;

/// What the validator needs from a staged file.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedSummary {
    pub columns: Vec<String>,
    pub rows: u64,
    pub sample: Vec<Vec<String>>,
}
