use sqlx::PgPool;
use tracing::info;

use shopforge_core::{SOURCE_SCHEMA, TableName};

use crate::errors::Result;

/// DDL for the `ecommerce` schema; every statement is idempotent.
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

fn statements(script: &str) -> impl Iterator<Item = &str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|sql| !sql.is_empty())
}

/// Create the schema and tables that do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await?;
    for sql in statements(SCHEMA_SQL) {
        sqlx::query(sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    info!(event = "schema_ready", schema = SOURCE_SCHEMA, "schema ensured");
    Ok(())
}

/// Empty every generated table and restart the id sequences, so a new run
/// can reuse the business codes of the previous one.
pub async fn reset(pool: &PgPool) -> Result<()> {
    let tables = TableName::ALL
        .iter()
        .map(|table| table.qualified())
        .collect::<Vec<_>>()
        .join(", ");
    sqlx::query(&format!("TRUNCATE {tables} RESTART IDENTITY CASCADE"))
        .execute(pool)
        .await?;
    info!(event = "schema_reset", schema = SOURCE_SCHEMA, "tables truncated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_defines_every_table() {
        let creates: Vec<&str> = statements(SCHEMA_SQL)
            .filter(|sql| sql.starts_with("CREATE TABLE"))
            .collect();
        assert_eq!(creates.len(), TableName::ALL.len());
        for table in TableName::ALL {
            let needle = format!("IF NOT EXISTS {} (", table.qualified());
            assert!(
                creates.iter().any(|sql| sql.contains(&needle)),
                "missing {table}"
            );
        }
    }
}
