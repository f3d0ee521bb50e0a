use std::env;

use anyhow::{Context, Result};
use shopforge_core::{CellValue, ColumnKind, TableName};
use shopforge_generate::{GenerationConfig, GenerationPipeline};
use shopforge_store::{PgSink, connect, ensure_schema, fetch_frame, reset, table_counts};

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

fn small_config() -> GenerationConfig {
    GenerationConfig {
        num_categories: 5,
        num_products: 30,
        num_customers: 60,
        num_orders: 400,
        insert_batch_size: 128,
        ..GenerationConfig::default()
    }
}

#[tokio::test]
async fn generated_dataset_round_trips() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL");
        return Ok(());
    };
    let pool = connect(&url).await.context("connecting to Postgres")?;
    ensure_schema(&pool).await?;
    reset(&pool).await?;

    let config = small_config();
    let mut sink = PgSink::new(pool.clone()).with_batch_size(config.insert_batch_size);
    let report = GenerationPipeline::new(config)?.run(&mut sink).await?;

    let counts = table_counts(&pool).await?;
    for (table, count) in counts {
        assert_eq!(report.rows_written(table), Some(count), "{table}");
    }

    let orders = fetch_frame(&pool, TableName::Orders).await?;
    assert_eq!(orders.row_count(), 400);
    let total = orders
        .columns
        .iter()
        .position(|column| column.name == "total_amount")
        .context("total_amount column")?;
    assert_eq!(
        orders.columns[total].kind,
        ColumnKind::Decimal {
            precision: 15,
            scale: 2
        }
    );
    assert!(orders.column(total).all(|cell| matches!(cell, CellValue::Decimal(_))));

    // Reset leaves empty tables with restarted sequences.
    reset(&pool).await?;
    let counts = table_counts(&pool).await?;
    assert!(counts.iter().all(|(_, count)| *count == 0));
    let next: i64 = sqlx::query_scalar("select nextval('ecommerce.categories_id_seq')")
        .fetch_one(&pool)
        .await?;
    assert_eq!(next, 1);
    Ok(())
}
