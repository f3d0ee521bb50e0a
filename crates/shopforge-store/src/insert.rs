//! Bulk inserts of generated rows.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use shopforge_core::{
    Category, Customer, Invoice, InvoiceItem, Order, OrderItem, Payment, Product, TableName,
};
use shopforge_generate::DatasetSink;

use crate::errors::{Result, StoreError};

pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Bind parameters PostgreSQL accepts in one statement.
const MAX_BIND_PARAMS: usize = 65_535;

/// Rows per statement: the configured batch size, capped so the statement
/// stays within the bind parameter limit.
fn chunk_rows(batch_size: usize, columns: usize) -> usize {
    let cap = MAX_BIND_PARAMS / columns.max(1);
    batch_size.clamp(1, cap.max(1))
}

/// A bind parameter borrowed from a generated row.
#[derive(Debug, Clone, PartialEq)]
enum SqlValue<'a> {
    Int(Option<i32>),
    Bool(bool),
    Text(Option<&'a str>),
    Money(Decimal),
    Date(NaiveDate),
    Timestamp(Option<NaiveDateTime>),
}

fn text(value: &str) -> SqlValue<'_> {
    SqlValue::Text(Some(value))
}

fn money(column: &'static str, value: f64) -> Result<SqlValue<'static>> {
    Decimal::from_f64(value)
        .map(|amount| SqlValue::Money(amount.round_dp(2)))
        .ok_or(StoreError::Money { column, value })
}

fn bind_value<'args>(row: &mut Separated<'_, 'args, Postgres, &'static str>, value: SqlValue<'args>) {
    match value {
        SqlValue::Int(value) => row.push_bind(value),
        SqlValue::Bool(value) => row.push_bind(value),
        SqlValue::Text(value) => row.push_bind(value),
        SqlValue::Money(value) => row.push_bind(value),
        SqlValue::Date(value) => row.push_bind(value),
        SqlValue::Timestamp(value) => row.push_bind(value),
    };
}

fn resolve(
    table: TableName,
    row: usize,
    position: usize,
    parent_ids: &[i32],
) -> Result<i32> {
    parent_ids
        .get(position)
        .copied()
        .ok_or(StoreError::DanglingRef {
            table,
            row,
            position,
        })
}

const CATEGORY_COLUMNS: &[&str] = &[
    "name",
    "description",
    "parent_id",
    "is_active",
    "created_at",
    "updated_at",
];

fn category_values(row: &Category) -> Vec<SqlValue<'_>> {
    vec![
        text(&row.name),
        text(&row.description),
        SqlValue::Int(row.parent_id),
        SqlValue::Bool(row.is_active),
        SqlValue::Timestamp(Some(row.created_at)),
        SqlValue::Timestamp(Some(row.updated_at)),
    ]
}

const PRODUCT_COLUMNS: &[&str] = &[
    "sku",
    "name",
    "description",
    "category_id",
    "unit_price",
    "cost_price",
    "stock_quantity",
    "is_active",
    "created_at",
    "updated_at",
];

fn product_values(row: &Product) -> Result<Vec<SqlValue<'_>>> {
    Ok(vec![
        text(&row.sku),
        text(&row.name),
        text(&row.description),
        SqlValue::Int(Some(row.category_id)),
        money("unit_price", row.unit_price)?,
        money("cost_price", row.cost_price)?,
        SqlValue::Int(Some(row.stock_quantity)),
        SqlValue::Bool(row.is_active),
        SqlValue::Timestamp(Some(row.created_at)),
        SqlValue::Timestamp(Some(row.updated_at)),
    ])
}

const CUSTOMER_COLUMNS: &[&str] = &[
    "customer_code",
    "email",
    "first_name",
    "last_name",
    "phone",
    "date_of_birth",
    "gender",
    "address_line1",
    "address_line2",
    "city",
    "state",
    "postal_code",
    "country",
    "segment",
    "registration_date",
    "is_active",
    "created_at",
    "updated_at",
];

fn customer_values(row: &Customer) -> Vec<SqlValue<'_>> {
    vec![
        text(&row.customer_code),
        text(&row.email),
        text(&row.first_name),
        text(&row.last_name),
        text(&row.phone),
        SqlValue::Date(row.date_of_birth),
        text(row.gender.as_str()),
        text(&row.address_line1),
        SqlValue::Text(row.address_line2.as_deref()),
        text(&row.city),
        SqlValue::Text(row.state.as_deref()),
        text(&row.postal_code),
        text(&row.country),
        text(row.segment.as_str()),
        SqlValue::Date(row.registration_date),
        SqlValue::Bool(row.is_active),
        SqlValue::Timestamp(Some(row.created_at)),
        SqlValue::Timestamp(Some(row.updated_at)),
    ]
}

const ORDER_COLUMNS: &[&str] = &[
    "order_number",
    "customer_id",
    "order_date",
    "order_timestamp",
    "status",
    "subtotal",
    "discount_amount",
    "tax_amount",
    "shipping_fee",
    "total_amount",
    "channel",
    "shipping_address",
    "shipping_city",
    "shipping_phone",
    "customer_note",
    "internal_note",
    "created_at",
    "updated_at",
];

fn order_values(row: &Order) -> Result<Vec<SqlValue<'_>>> {
    Ok(vec![
        text(&row.order_number),
        SqlValue::Int(Some(row.customer_id)),
        SqlValue::Date(row.order_date),
        SqlValue::Timestamp(Some(row.order_timestamp)),
        text(row.status.as_str()),
        money("subtotal", row.subtotal)?,
        money("discount_amount", row.discount_amount)?,
        money("tax_amount", row.tax_amount)?,
        money("shipping_fee", row.shipping_fee)?,
        money("total_amount", row.total_amount)?,
        text(row.channel.as_str()),
        text(&row.shipping_address),
        text(&row.shipping_city),
        text(&row.shipping_phone),
        SqlValue::Text(row.customer_note.as_deref()),
        SqlValue::Text(row.internal_note.as_deref()),
        SqlValue::Timestamp(Some(row.created_at)),
        SqlValue::Timestamp(Some(row.updated_at)),
    ])
}

const ORDER_ITEM_COLUMNS: &[&str] = &[
    "order_id",
    "product_id",
    "quantity",
    "unit_price",
    "discount_percent",
    "line_total",
    "created_at",
];

fn order_item_values(row: &OrderItem, order_id: i32) -> Result<Vec<SqlValue<'_>>> {
    Ok(vec![
        SqlValue::Int(Some(order_id)),
        SqlValue::Int(Some(row.product_id)),
        SqlValue::Int(Some(row.quantity)),
        money("unit_price", row.unit_price)?,
        money("discount_percent", row.discount_percent)?,
        money("line_total", row.line_total)?,
        SqlValue::Timestamp(Some(row.created_at)),
    ])
}

const PAYMENT_COLUMNS: &[&str] = &[
    "payment_code",
    "order_id",
    "amount",
    "payment_method",
    "payment_gateway",
    "status",
    "payment_date",
    "paid_at",
    "transaction_ref",
    "gateway_response",
    "created_at",
    "updated_at",
];

fn payment_values(row: &Payment, order_id: i32) -> Result<Vec<SqlValue<'_>>> {
    Ok(vec![
        text(&row.payment_code),
        SqlValue::Int(Some(order_id)),
        money("amount", row.amount)?,
        text(row.payment_method.as_str()),
        SqlValue::Text(row.payment_gateway.as_deref()),
        text(row.status.as_str()),
        SqlValue::Date(row.payment_date),
        SqlValue::Timestamp(row.paid_at),
        SqlValue::Text(row.transaction_ref.as_deref()),
        SqlValue::Text(row.gateway_response.as_deref()),
        SqlValue::Timestamp(Some(row.created_at)),
        SqlValue::Timestamp(Some(row.updated_at)),
    ])
}

const INVOICE_COLUMNS: &[&str] = &[
    "invoice_number",
    "order_id",
    "customer_id",
    "invoice_date",
    "due_date",
    "subtotal",
    "tax_amount",
    "total_amount",
    "status",
    "accounting_period",
    "notes",
    "created_at",
    "updated_at",
];

fn invoice_values(row: &Invoice, order_id: i32) -> Result<Vec<SqlValue<'_>>> {
    Ok(vec![
        text(&row.invoice_number),
        SqlValue::Int(Some(order_id)),
        SqlValue::Int(Some(row.customer_id)),
        SqlValue::Date(row.invoice_date),
        SqlValue::Date(row.due_date),
        money("subtotal", row.subtotal)?,
        money("tax_amount", row.tax_amount)?,
        money("total_amount", row.total_amount)?,
        text(row.status.as_str()),
        text(&row.accounting_period),
        SqlValue::Text(row.notes.as_deref()),
        SqlValue::Timestamp(Some(row.created_at)),
        SqlValue::Timestamp(Some(row.updated_at)),
    ])
}

const INVOICE_ITEM_COLUMNS: &[&str] = &[
    "invoice_id",
    "product_id",
    "description",
    "quantity",
    "unit_price",
    "tax_rate",
    "line_total",
    "created_at",
];

fn invoice_item_values(row: &InvoiceItem, invoice_id: i32) -> Result<Vec<SqlValue<'_>>> {
    Ok(vec![
        SqlValue::Int(Some(invoice_id)),
        SqlValue::Int(Some(row.product_id)),
        text(&row.description),
        SqlValue::Int(Some(row.quantity)),
        money("unit_price", row.unit_price)?,
        money("tax_rate", row.tax_rate)?,
        money("line_total", row.line_total)?,
        SqlValue::Timestamp(Some(row.created_at)),
    ])
}

#[derive(Debug, Default)]
struct Inserted {
    ids: Vec<i32>,
    rows: u64,
}

/// Writes generated tables into the `ecommerce` schema.
///
/// Each table is inserted inside its own transaction, in multi-row
/// statements of at most `batch_size` rows. A failing statement rolls the
/// whole table back.
#[derive(Debug, Clone)]
pub struct PgSink {
    pool: PgPool,
    batch_size: usize,
}

impl PgSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn insert_rows<'a>(
        &self,
        table: TableName,
        columns: &[&str],
        rows: Vec<Vec<SqlValue<'a>>>,
        returning: bool,
    ) -> Result<Inserted> {
        let mut inserted = Inserted::default();
        if rows.is_empty() {
            return Ok(inserted);
        }

        let total = rows.len();
        let chunk_size = chunk_rows(self.batch_size, columns.len());
        let mut tx = self.pool.begin().await?;
        let mut pending = rows.into_iter().peekable();
        while pending.peek().is_some() {
            let chunk: Vec<_> = pending.by_ref().take(chunk_size).collect();
            let chunk_len = chunk.len();
            let mut builder: QueryBuilder<'a, Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                table.qualified(),
                columns.join(", ")
            ));
            builder.push_values(chunk, |mut row, values| {
                for value in values {
                    bind_value(&mut row, value);
                }
            });

            if returning {
                builder.push(" RETURNING id");
                let ids: Vec<i32> = builder
                    .build_query_scalar::<i32>()
                    .fetch_all(&mut *tx)
                    .await?;
                inserted.rows += ids.len() as u64;
                inserted.ids.extend(ids);
            } else {
                let result = builder.build().execute(&mut *tx).await?;
                inserted.rows += result.rows_affected();
            }
            debug!(table = %table, rows = chunk_len, "inserted chunk");
        }
        tx.commit().await?;

        if returning && inserted.ids.len() != total {
            return Err(StoreError::IdCount {
                table,
                expected: total,
                got: inserted.ids.len(),
            });
        }
        info!(table = %table, rows = inserted.rows, "inserted table");
        Ok(inserted)
    }
}

#[async_trait]
impl DatasetSink for PgSink {
    type Error = StoreError;

    async fn insert_categories(&mut self, rows: &[Category]) -> Result<Vec<i32>> {
        let values = rows.iter().map(category_values).collect();
        let inserted = self
            .insert_rows(TableName::Categories, CATEGORY_COLUMNS, values, true)
            .await?;
        Ok(inserted.ids)
    }

    async fn insert_products(&mut self, rows: &[Product]) -> Result<Vec<i32>> {
        let values = rows.iter().map(product_values).collect::<Result<_>>()?;
        let inserted = self
            .insert_rows(TableName::Products, PRODUCT_COLUMNS, values, true)
            .await?;
        Ok(inserted.ids)
    }

    async fn insert_customers(&mut self, rows: &[Customer]) -> Result<Vec<i32>> {
        let values = rows.iter().map(customer_values).collect();
        let inserted = self
            .insert_rows(TableName::Customers, CUSTOMER_COLUMNS, values, true)
            .await?;
        Ok(inserted.ids)
    }

    async fn insert_orders(&mut self, rows: &[Order]) -> Result<Vec<i32>> {
        let values = rows.iter().map(order_values).collect::<Result<_>>()?;
        let inserted = self
            .insert_rows(TableName::Orders, ORDER_COLUMNS, values, true)
            .await?;
        Ok(inserted.ids)
    }

    async fn insert_order_items(&mut self, rows: &[OrderItem], order_ids: &[i32]) -> Result<u64> {
        let table = TableName::OrderItems;
        let values = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| order_item_values(row, resolve(table, idx, row.order_ref, order_ids)?))
            .collect::<Result<_>>()?;
        let inserted = self
            .insert_rows(table, ORDER_ITEM_COLUMNS, values, false)
            .await?;
        Ok(inserted.rows)
    }

    async fn insert_payments(&mut self, rows: &[Payment], order_ids: &[i32]) -> Result<u64> {
        let table = TableName::Payments;
        let values = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| payment_values(row, resolve(table, idx, row.order_ref, order_ids)?))
            .collect::<Result<_>>()?;
        let inserted = self
            .insert_rows(table, PAYMENT_COLUMNS, values, false)
            .await?;
        Ok(inserted.rows)
    }

    async fn insert_invoices(&mut self, rows: &[Invoice], order_ids: &[i32]) -> Result<Vec<i32>> {
        let table = TableName::Invoices;
        let values = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| invoice_values(row, resolve(table, idx, row.order_ref, order_ids)?))
            .collect::<Result<_>>()?;
        let inserted = self
            .insert_rows(table, INVOICE_COLUMNS, values, true)
            .await?;
        Ok(inserted.ids)
    }

    async fn insert_invoice_items(
        &mut self,
        rows: &[InvoiceItem],
        invoice_ids: &[i32],
    ) -> Result<u64> {
        let table = TableName::InvoiceItems;
        let values = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                invoice_item_values(row, resolve(table, idx, row.invoice_ref, invoice_ids)?)
            })
            .collect::<Result<_>>()?;
        let inserted = self
            .insert_rows(table, INVOICE_ITEM_COLUMNS, values, false)
            .await?;
        Ok(inserted.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_rounds_to_cents() {
        assert_eq!(
            money("amount", 10.005_000_1).unwrap(),
            SqlValue::Money(Decimal::new(1_001, 2))
        );
        assert!(matches!(
            money("amount", f64::NAN),
            Err(StoreError::Money { column: "amount", .. })
        ));
    }

    #[test]
    fn chunks_stay_under_bind_limit() {
        assert_eq!(chunk_rows(DEFAULT_BATCH_SIZE, CUSTOMER_COLUMNS.len()), DEFAULT_BATCH_SIZE);
        let widest = chunk_rows(4_000, CUSTOMER_COLUMNS.len());
        assert!(widest < 4_000);
        assert!(widest * CUSTOMER_COLUMNS.len() <= MAX_BIND_PARAMS);
        assert_eq!(chunk_rows(0, ORDER_ITEM_COLUMNS.len()), 1);
    }

    #[test]
    fn unresolved_parent_is_reported() {
        let err = resolve(TableName::Payments, 3, 9, &[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DanglingRef {
                table: TableName::Payments,
                row: 3,
                position: 9
            }
        ));
        assert_eq!(resolve(TableName::Payments, 0, 1, &[1, 2]).unwrap(), 2);
    }

    #[test]
    fn column_lists_match_value_lists() {
        let created_at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let category = Category {
            name: "Audio".to_string(),
            description: "Speakers".to_string(),
            parent_id: None,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        assert_eq!(category_values(&category).len(), CATEGORY_COLUMNS.len());

        let item = OrderItem {
            order_ref: 0,
            product_id: 1,
            quantity: 2,
            unit_price: 100.0,
            discount_percent: 5.0,
            line_total: 190.0,
            created_at,
        };
        assert_eq!(
            order_item_values(&item, 7).unwrap().len(),
            ORDER_ITEM_COLUMNS.len()
        );
    }
}
