use thiserror::Error;

/// Core error type shared across shopforge crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A label or table name that is not part of the catalog.
    #[error("unknown {kind}: {value}")]
    Unknown { kind: &'static str, value: String },
    /// Settings that cannot produce a usable connection.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Convenience alias for results returned by shopforge crates.
pub type Result<T> = std::result::Result<T, CoreError>;
