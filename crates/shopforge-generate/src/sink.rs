use async_trait::async_trait;

use shopforge_core::{
    Category, Customer, Invoice, InvoiceItem, Order, OrderItem, Payment, Product,
};

/// Destination of a generation run.
///
/// Parent inserts return the identifiers assigned to the rows, in input
/// order. Child inserts receive those identifiers to resolve the positional
/// `*_ref` fields of their rows.
#[async_trait]
pub trait DatasetSink: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn insert_categories(&mut self, rows: &[Category]) -> Result<Vec<i32>, Self::Error>;

    async fn insert_products(&mut self, rows: &[Product]) -> Result<Vec<i32>, Self::Error>;

    async fn insert_customers(&mut self, rows: &[Customer]) -> Result<Vec<i32>, Self::Error>;

    async fn insert_orders(&mut self, rows: &[Order]) -> Result<Vec<i32>, Self::Error>;

    async fn insert_order_items(
        &mut self,
        rows: &[OrderItem],
        order_ids: &[i32],
    ) -> Result<u64, Self::Error>;

    async fn insert_payments(
        &mut self,
        rows: &[Payment],
        order_ids: &[i32],
    ) -> Result<u64, Self::Error>;

    async fn insert_invoices(
        &mut self,
        rows: &[Invoice],
        order_ids: &[i32],
    ) -> Result<Vec<i32>, Self::Error>;

    async fn insert_invoice_items(
        &mut self,
        rows: &[InvoiceItem],
        invoice_ids: &[i32],
    ) -> Result<u64, Self::Error>;
}
