use async_trait::async_trait;
use sqlx::PgPool;

use shopforge_core::{TableFrame, TableName, redact_connection_string};

use crate::errors::Result;
use crate::model::SourceDescriptor;

/// Anything the exporter can read whole tables from.
#[async_trait]
pub trait TableSource: Send + Sync {
    fn describe(&self) -> SourceDescriptor;

    async fn read_table(&self, table: TableName) -> Result<TableFrame>;

    /// Column names in declaration order.
    async fn columns(&self, table: TableName) -> Result<Vec<String>>;

    async fn row_count(&self, table: TableName) -> Result<u64>;
}

/// The source database, read through the store helpers.
#[derive(Debug, Clone)]
pub struct PgSource {
    pool: PgPool,
    descriptor: SourceDescriptor,
}

impl PgSource {
    /// `url` is only used to describe the source; it is redacted here.
    pub fn new(pool: PgPool, url: &str) -> Self {
        Self {
            pool,
            descriptor: SourceDescriptor::from_connection(&redact_connection_string(url)),
        }
    }
}

#[async_trait]
impl TableSource for PgSource {
    fn describe(&self) -> SourceDescriptor {
        self.descriptor.clone()
    }

    async fn read_table(&self, table: TableName) -> Result<TableFrame> {
        Ok(shopforge_store::fetch_frame(&self.pool, table).await?)
    }

    async fn columns(&self, table: TableName) -> Result<Vec<String>> {
        let layout = shopforge_store::table_layout(&self.pool, table).await?;
        Ok(layout.into_iter().map(|column| column.name).collect())
    }

    async fn row_count(&self, table: TableName) -> Result<u64> {
        Ok(shopforge_store::row_count(&self.pool, table).await?)
    }
}
