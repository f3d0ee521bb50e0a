use shopforge_core::TableName;
use thiserror::Error;

/// Errors emitted by the generators and the generation pipeline.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("missing parent rows: {0}")]
    MissingParents(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to persist {table}: {source}")]
    Sink {
        table: TableName,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
