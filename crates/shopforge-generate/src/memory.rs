//! In-memory [`DatasetSink`] used for dry runs and tests.

use async_trait::async_trait;
use thiserror::Error;

use shopforge_core::{
    Category, Customer, Invoice, InvoiceItem, Order, OrderItem, Payment, Product, TableName,
};

use crate::sink::DatasetSink;

#[derive(Debug, Error)]
pub enum MemorySinkError {
    #[error("{table} row {row} references missing parent position {position}")]
    DanglingRef {
        table: TableName,
        row: usize,
        position: usize,
    },
}

/// A stored row with the identifier its "table" assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: i32,
    /// Resolved parent id for child tables, `None` for roots.
    pub parent_id: Option<i32>,
    pub row: T,
}

/// Keeps every inserted row and hands out serial ids starting at 1,
/// mimicking freshly created serial columns.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub categories: Vec<Stored<Category>>,
    pub products: Vec<Stored<Product>>,
    pub customers: Vec<Stored<Customer>>,
    pub orders: Vec<Stored<Order>>,
    pub order_items: Vec<Stored<OrderItem>>,
    pub payments: Vec<Stored<Payment>>,
    pub invoices: Vec<Stored<Invoice>>,
    pub invoice_items: Vec<Stored<InvoiceItem>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self, table: TableName) -> u64 {
        let len = match table {
            TableName::Categories => self.categories.len(),
            TableName::Products => self.products.len(),
            TableName::Customers => self.customers.len(),
            TableName::Orders => self.orders.len(),
            TableName::OrderItems => self.order_items.len(),
            TableName::Payments => self.payments.len(),
            TableName::Invoices => self.invoices.len(),
            TableName::InvoiceItems => self.invoice_items.len(),
        };
        len as u64
    }
}

fn store_roots<T: Clone>(target: &mut Vec<Stored<T>>, rows: &[T]) -> Vec<i32> {
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        let id = target.len() as i32 + 1;
        target.push(Stored {
            id,
            parent_id: None,
            row: row.clone(),
        });
        ids.push(id);
    }
    ids
}

fn store_children<T: Clone>(
    table: TableName,
    target: &mut Vec<Stored<T>>,
    rows: &[T],
    parent_ids: &[i32],
    position: impl Fn(&T) -> usize,
) -> Result<Vec<i32>, MemorySinkError> {
    let resolved = rows
        .iter()
        .enumerate()
        .map(|(row, item)| {
            let position = position(item);
            parent_ids
                .get(position)
                .copied()
                .ok_or(MemorySinkError::DanglingRef {
                    table,
                    row,
                    position,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut ids = Vec::with_capacity(rows.len());
    for (row, parent_id) in rows.iter().zip(resolved) {
        let id = target.len() as i32 + 1;
        target.push(Stored {
            id,
            parent_id: Some(parent_id),
            row: row.clone(),
        });
        ids.push(id);
    }
    Ok(ids)
}

#[async_trait]
impl DatasetSink for MemorySink {
    type Error = MemorySinkError;

    async fn insert_categories(&mut self, rows: &[Category]) -> Result<Vec<i32>, Self::Error> {
        Ok(store_roots(&mut self.categories, rows))
    }

    async fn insert_products(&mut self, rows: &[Product]) -> Result<Vec<i32>, Self::Error> {
        Ok(store_roots(&mut self.products, rows))
    }

    async fn insert_customers(&mut self, rows: &[Customer]) -> Result<Vec<i32>, Self::Error> {
        Ok(store_roots(&mut self.customers, rows))
    }

    async fn insert_orders(&mut self, rows: &[Order]) -> Result<Vec<i32>, Self::Error> {
        Ok(store_roots(&mut self.orders, rows))
    }

    async fn insert_order_items(
        &mut self,
        rows: &[OrderItem],
        order_ids: &[i32],
    ) -> Result<u64, Self::Error> {
        let ids = store_children(
            TableName::OrderItems,
            &mut self.order_items,
            rows,
            order_ids,
            |item| item.order_ref,
        )?;
        Ok(ids.len() as u64)
    }

    async fn insert_payments(
        &mut self,
        rows: &[Payment],
        order_ids: &[i32],
    ) -> Result<u64, Self::Error> {
        let ids = store_children(
            TableName::Payments,
            &mut self.payments,
            rows,
            order_ids,
            |payment| payment.order_ref,
        )?;
        Ok(ids.len() as u64)
    }

    async fn insert_invoices(
        &mut self,
        rows: &[Invoice],
        order_ids: &[i32],
    ) -> Result<Vec<i32>, Self::Error> {
        store_children(
            TableName::Invoices,
            &mut self.invoices,
            rows,
            order_ids,
            |invoice| invoice.order_ref,
        )
    }

    async fn insert_invoice_items(
        &mut self,
        rows: &[InvoiceItem],
        invoice_ids: &[i32],
    ) -> Result<u64, Self::Error> {
        let ids = store_children(
            TableName::InvoiceItems,
            &mut self.invoice_items,
            rows,
            invoice_ids,
            |item| item.invoice_ref,
        )?;
        Ok(ids.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn item(order_ref: usize) -> OrderItem {
        OrderItem {
            order_ref,
            product_id: 1,
            quantity: 1,
            unit_price: 10.0,
            discount_percent: 0.0,
            line_total: 10.0,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn children_resolve_parent_positions() {
        let mut sink = MemorySink::new();
        let written = sink
            .insert_order_items(&[item(1), item(0)], &[10, 20])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(sink.order_items[0].parent_id, Some(20));
        assert_eq!(sink.order_items[1].parent_id, Some(10));
        assert_eq!(sink.row_count(TableName::OrderItems), 2);
    }

    #[tokio::test]
    async fn dangling_positions_are_rejected() {
        let mut sink = MemorySink::new();
        let err = sink
            .insert_order_items(&[item(0), item(5)], &[10])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MemorySinkError::DanglingRef { row: 1, position: 5, .. }
        ));
        assert!(sink.order_items.is_empty());
    }
}
