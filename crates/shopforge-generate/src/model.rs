use serde::{Deserialize, Serialize};

use shopforge_core::TableName;

/// Summary of one persisted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: TableName,
    pub rows_generated: u64,
    pub rows_written: u64,
    pub duration_ms: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub tables: Vec<TableReport>,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64) -> Self {
        Self {
            run_id,
            seed,
            tables: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn rows_written(&self, table: TableName) -> Option<u64> {
        self.tables
            .iter()
            .find(|report| report.table == table)
            .map(|report| report.rows_written)
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|report| report.rows_written).sum()
    }
}
