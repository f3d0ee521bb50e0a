use std::time::Instant;

use tracing::info;

use shopforge_core::{ProductRef, TableName};

use crate::config::GenerationConfig;
use crate::errors::GenerationError;
use crate::generators::{
    CategoryGenerator, CustomerGenerator, InvoiceGenerator, OrderGenerator, PaymentGenerator,
    ProductGenerator,
};
use crate::model::{GenerationReport, TableReport};
use crate::sink::DatasetSink;

/// Runs every generator in dependency order, persisting each stage before
/// the stages that need its identifiers.
#[derive(Debug, Clone)]
pub struct GenerationPipeline {
    config: GenerationConfig,
}

impl GenerationPipeline {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub async fn run<S: DatasetSink>(&self, sink: &mut S) -> Result<GenerationReport, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let config = &self.config;
        let mut report = GenerationReport::new(run_id.clone(), config.seed);

        info!(
            run_id = %run_id,
            seed = config.seed,
            orders = config.num_orders,
            "generation started"
        );

        let categories = CategoryGenerator::new(config).generate();
        let table_start = Instant::now();
        let category_ids = sink
            .insert_categories(&categories)
            .await
            .map_err(|err| sink_error(TableName::Categories, err))?;
        record(&mut report, TableName::Categories, categories.len(), category_ids.len(), table_start);

        let products = ProductGenerator::new(config, &category_ids).generate()?;
        let table_start = Instant::now();
        let product_ids = sink
            .insert_products(&products)
            .await
            .map_err(|err| sink_error(TableName::Products, err))?;
        record(&mut report, TableName::Products, products.len(), product_ids.len(), table_start);
        let catalog: Vec<ProductRef> = product_ids
            .iter()
            .zip(&products)
            .map(|(id, product)| ProductRef {
                id: *id,
                unit_price: product.unit_price,
            })
            .collect();

        let customers = CustomerGenerator::new(config).generate()?;
        let table_start = Instant::now();
        let customer_ids = sink
            .insert_customers(&customers)
            .await
            .map_err(|err| sink_error(TableName::Customers, err))?;
        record(&mut report, TableName::Customers, customers.len(), customer_ids.len(), table_start);

        let orders = OrderGenerator::new(config, &customer_ids, &catalog).generate()?;
        let table_start = Instant::now();
        let order_ids = sink
            .insert_orders(&orders.orders)
            .await
            .map_err(|err| sink_error(TableName::Orders, err))?;
        record(&mut report, TableName::Orders, orders.orders.len(), order_ids.len(), table_start);
        ensure_ids(TableName::Orders, orders.orders.len(), order_ids.len())?;

        let table_start = Instant::now();
        let written = sink
            .insert_order_items(&orders.items, &order_ids)
            .await
            .map_err(|err| sink_error(TableName::OrderItems, err))?;
        record(&mut report, TableName::OrderItems, orders.items.len(), written as usize, table_start);

        let payments = PaymentGenerator::new(config, &orders.orders).generate()?;
        let table_start = Instant::now();
        let written = sink
            .insert_payments(&payments, &order_ids)
            .await
            .map_err(|err| sink_error(TableName::Payments, err))?;
        record(&mut report, TableName::Payments, payments.len(), written as usize, table_start);

        let invoices = InvoiceGenerator::new(config, &orders).generate()?;
        let table_start = Instant::now();
        let invoice_ids = sink
            .insert_invoices(&invoices.invoices, &order_ids)
            .await
            .map_err(|err| sink_error(TableName::Invoices, err))?;
        record(&mut report, TableName::Invoices, invoices.invoices.len(), invoice_ids.len(), table_start);
        ensure_ids(TableName::Invoices, invoices.invoices.len(), invoice_ids.len())?;

        let table_start = Instant::now();
        let written = sink
            .insert_invoice_items(&invoices.items, &invoice_ids)
            .await
            .map_err(|err| sink_error(TableName::InvoiceItems, err))?;
        record(&mut report, TableName::InvoiceItems, invoices.items.len(), written as usize, table_start);

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            rows = report.total_rows(),
            duration_ms = report.duration_ms,
            "generation finished"
        );
        Ok(report)
    }
}

fn sink_error<E>(table: TableName, err: E) -> GenerationError
where
    E: std::error::Error + Send + Sync + 'static,
{
    GenerationError::Sink {
        table,
        source: Box::new(err),
    }
}

fn ensure_ids(table: TableName, expected: usize, got: usize) -> Result<(), GenerationError> {
    if expected != got {
        return Err(GenerationError::MissingParents(format!(
            "{table}: sink returned {got} ids for {expected} rows"
        )));
    }
    Ok(())
}

fn record(
    report: &mut GenerationReport,
    table: TableName,
    generated: usize,
    written: usize,
    started: Instant,
) {
    let duration_ms = started.elapsed().as_millis() as u64;
    info!(table = %table, rows = written, duration_ms, "table persisted");
    report.tables.push(TableReport {
        table,
        rows_generated: generated as u64,
        rows_written: written as u64,
        duration_ms,
    });
}
