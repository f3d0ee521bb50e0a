//! Synthetic ecommerce data generation for shopforge.
//!
//! Generators produce dimension rows (categories, products, customers) and
//! the dependent fact tables (orders, order items, payments, invoices) from a
//! seeded configuration. The pipeline persists each stage through a
//! [`DatasetSink`] and back-fills the returned identifiers before building
//! the next one.

pub mod config;
pub mod errors;
pub mod generators;
pub mod memory;
pub mod model;
pub mod pipeline;
pub mod sampling;
pub mod sink;

pub use config::{GenerationConfig, Weighted};
pub use errors::GenerationError;
pub use memory::{MemorySink, MemorySinkError};
pub use model::{GenerationReport, TableReport};
pub use pipeline::GenerationPipeline;
pub use sink::DatasetSink;
