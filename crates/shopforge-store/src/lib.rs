//! PostgreSQL persistence for shopforge.
//!
//! Connects to the source database, bootstraps the `ecommerce` schema,
//! bulk-inserts generated tables through [`PgSink`] and reads tables back
//! as [`shopforge_core::TableFrame`]s for staging.

pub mod errors;
pub mod insert;
pub mod pool;
pub mod read;
pub mod schema;

pub use errors::{Result, StoreError};
pub use insert::{DEFAULT_BATCH_SIZE, PgSink};
pub use pool::{connect, server_version};
pub use read::{fetch_frame, row_count, table_counts, table_layout};
pub use schema::{SCHEMA_SQL, ensure_schema, reset};
