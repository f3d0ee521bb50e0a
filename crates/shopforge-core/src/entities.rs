//! Generated rows, one struct per table.
//!
//! Database identifiers are `i32` (serial columns). Rows that reference a
//! parent generated in the same run carry a positional `*_ref` (0-based index
//! into the parent batch) until the persistence layer back-fills the real id.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::labels::{
    CustomerSegment, Gender, InvoiceStatus, OrderStatus, PaymentMethod, PaymentStatus,
    SalesChannel,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub name: String,
    pub description: String,
    pub parent_id: Option<i32>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category_id: i32,
    pub unit_price: f64,
    pub cost_price: f64,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Persisted product identity and list price, as needed to price order lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProductRef {
    pub id: i32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub customer_code: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub segment: CustomerSegment,
    pub registration_date: NaiveDate,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub order_number: String,
    pub customer_id: i32,
    pub order_date: NaiveDate,
    pub order_timestamp: NaiveDateTime,
    pub status: OrderStatus,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub shipping_fee: f64,
    pub total_amount: f64,
    pub channel: SalesChannel,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_phone: String,
    pub customer_note: Option<String>,
    pub internal_note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub order_ref: usize,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: f64,
    pub discount_percent: f64,
    pub line_total: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub payment_code: String,
    pub order_ref: usize,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub payment_gateway: Option<String>,
    pub status: PaymentStatus,
    pub payment_date: NaiveDate,
    pub paid_at: Option<NaiveDateTime>,
    pub transaction_ref: Option<String>,
    pub gateway_response: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub invoice_number: String,
    pub order_ref: usize,
    pub customer_id: i32,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub status: InvoiceStatus,
    pub accounting_period: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    pub invoice_ref: usize,
    pub product_id: i32,
    pub description: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub tax_rate: f64,
    pub line_total: f64,
    pub created_at: NaiveDateTime,
}
