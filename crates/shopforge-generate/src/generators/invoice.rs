use chrono::Duration;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use shopforge_core::{Invoice, InvoiceItem, InvoiceStatus};

use crate::config::GenerationConfig;
use crate::errors::GenerationError;
use crate::generators::midnight;
use crate::generators::order::{OrderBatch, TAX_RATE};
use crate::sampling::{WeightedChoice, business_code, round_currency, seeded_rng};

const STATUSES: [(InvoiceStatus, f64); 3] = [
    (InvoiceStatus::Paid, 0.85),
    (InvoiceStatus::Issued, 0.10),
    (InvoiceStatus::Closed, 0.05),
];
const ADJUSTMENT_PROBABILITY: f64 = 0.03;
const ADJUSTMENT_SPREAD: f64 = 0.05;
const PAYMENT_TERM_DAYS: i64 = 30;

/// Invoices and their lines; `items[*].invoice_ref` indexes into `invoices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceBatch {
    pub invoices: Vec<Invoice>,
    pub items: Vec<InvoiceItem>,
}

pub struct InvoiceGenerator<'a> {
    config: &'a GenerationConfig,
    orders: &'a OrderBatch,
    rng: ChaCha8Rng,
}

impl<'a> InvoiceGenerator<'a> {
    pub fn new(config: &'a GenerationConfig, orders: &'a OrderBatch) -> Self {
        Self {
            config,
            orders,
            rng: seeded_rng(config.seed, "invoices"),
        }
    }

    pub fn generate(mut self) -> Result<InvoiceBatch, GenerationError> {
        let statuses = WeightedChoice::new(STATUSES)?;
        let year = self.config.code_year();
        let items_by_order = self.orders.items_by_order();

        let mut batch = InvoiceBatch::default();
        for (order_ref, order) in self.orders.orders.iter().enumerate() {
            if !order.status.is_fulfilled() {
                continue;
            }

            let invoice_date = order.order_date + Duration::days(self.rng.random_range(0..=5));
            let status = statuses.sample(&mut self.rng);

            let mut subtotal = order.subtotal;
            let mut tax_amount = order.tax_amount;
            if self.rng.random::<f64>() < ADJUSTMENT_PROBABILITY {
                let adjustment = self
                    .rng
                    .random_range(-ADJUSTMENT_SPREAD..ADJUSTMENT_SPREAD);
                subtotal = round_currency(subtotal * (1.0 + adjustment));
                tax_amount = round_currency(subtotal * TAX_RATE);
            }

            let invoice_ref = batch.invoices.len();
            batch.invoices.push(Invoice {
                invoice_number: business_code("INV", year, invoice_ref + 1),
                order_ref,
                customer_id: order.customer_id,
                invoice_date,
                due_date: invoice_date + Duration::days(PAYMENT_TERM_DAYS),
                subtotal,
                tax_amount,
                total_amount: round_currency(subtotal + tax_amount),
                status,
                accounting_period: invoice_date.format("%Y-%m").to_string(),
                notes: None,
                created_at: midnight(invoice_date),
                updated_at: self.config.as_of,
            });

            let lines = items_by_order.get(order_ref).map(Vec::as_slice).unwrap_or(&[]);
            batch.items.extend(lines.iter().map(|item| InvoiceItem {
                invoice_ref,
                product_id: item.product_id,
                description: format!("Product #{}", item.product_id),
                quantity: item.quantity,
                unit_price: item.unit_price,
                tax_rate: TAX_RATE * 100.0,
                line_total: item.line_total,
                created_at: midnight(invoice_date),
            }));
        }

        info!(
            table = "invoices",
            rows = batch.invoices.len(),
            items = batch.items.len(),
            "generated table"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use shopforge_core::{OrderItem, OrderStatus, ProductRef};

    use super::*;
    use crate::generators::OrderGenerator;

    fn orders(config: &GenerationConfig) -> OrderBatch {
        let products: Vec<ProductRef> = (1..=20)
            .map(|id| ProductRef {
                id,
                unit_price: 250_000.0,
            })
            .collect();
        OrderGenerator::new(config, &[1, 2, 3], &products)
            .generate()
            .unwrap()
    }

    #[test]
    fn only_fulfilled_orders_are_invoiced() {
        let config = GenerationConfig {
            num_orders: 1_000,
            ..GenerationConfig::default()
        };
        let orders = orders(&config);
        let batch = InvoiceGenerator::new(&config, &orders).generate().unwrap();

        let fulfilled = orders
            .orders
            .iter()
            .filter(|order| order.status.is_fulfilled())
            .count();
        assert_eq!(batch.invoices.len(), fulfilled);
        for invoice in &batch.invoices {
            let order = &orders.orders[invoice.order_ref];
            assert!(matches!(
                order.status,
                OrderStatus::Completed | OrderStatus::Delivered
            ));
            assert_eq!(invoice.customer_id, order.customer_id);
            assert_eq!(invoice.due_date - invoice.invoice_date, Duration::days(30));
            assert_eq!(
                invoice.accounting_period,
                invoice.invoice_date.format("%Y-%m").to_string()
            );
        }
    }

    #[test]
    fn invoice_lines_mirror_order_lines() {
        let config = GenerationConfig {
            num_orders: 400,
            ..GenerationConfig::default()
        };
        let orders = orders(&config);
        let batch = InvoiceGenerator::new(&config, &orders).generate().unwrap();
        let by_order = orders.items_by_order();

        for (invoice_ref, invoice) in batch.invoices.iter().enumerate() {
            let expected: Vec<&OrderItem> = by_order[invoice.order_ref].clone();
            let lines: Vec<&InvoiceItem> = batch
                .items
                .iter()
                .filter(|item| item.invoice_ref == invoice_ref)
                .collect();
            assert_eq!(lines.len(), expected.len());
            for (line, item) in lines.iter().zip(expected) {
                assert_eq!(line.product_id, item.product_id);
                assert_eq!(line.line_total, item.line_total);
                assert_eq!(line.tax_rate, 10.0);
            }
        }
    }
}
