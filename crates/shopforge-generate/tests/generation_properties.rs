use std::collections::{HashMap, HashSet};

use shopforge_core::{OrderStatus, PaymentStatus, TableName};
use shopforge_generate::{GenerationConfig, GenerationPipeline, MemorySink};

const TOLERANCE: f64 = 0.011;

fn small_config() -> GenerationConfig {
    GenerationConfig {
        num_categories: 20,
        num_products: 80,
        num_customers: 300,
        num_orders: 3_000,
        ..GenerationConfig::default()
    }
}

async fn generate(config: GenerationConfig) -> (MemorySink, shopforge_generate::GenerationReport) {
    let pipeline = GenerationPipeline::new(config).expect("valid config");
    let mut sink = MemorySink::new();
    let report = pipeline.run(&mut sink).await.expect("run generation");
    (sink, report)
}

#[tokio::test]
async fn report_matches_configured_counts() {
    let config = small_config();
    let (sink, report) = generate(config.clone()).await;

    assert_eq!(report.tables.len(), 8);
    assert_eq!(report.rows_written(TableName::Categories), Some(20));
    assert_eq!(report.rows_written(TableName::Products), Some(80));
    assert_eq!(report.rows_written(TableName::Customers), Some(300));
    assert_eq!(report.rows_written(TableName::Orders), Some(3_000));
    for table in TableName::ALL {
        assert_eq!(report.rows_written(table), Some(sink.row_count(table)));
    }
}

#[tokio::test]
async fn order_totals_add_up() {
    let (sink, _) = generate(small_config()).await;
    for stored in &sink.orders {
        let order = &stored.row;
        let expected =
            order.subtotal - order.discount_amount + order.tax_amount + order.shipping_fee;
        assert!(
            (order.total_amount - expected).abs() < TOLERANCE,
            "{}: total {} expected {}",
            order.order_number,
            order.total_amount,
            expected
        );
        assert!(order.total_amount > 0.0);
    }
}

#[tokio::test]
async fn line_totals_apply_discounts() {
    let (sink, _) = generate(small_config()).await;
    for stored in &sink.order_items {
        let item = &stored.row;
        let expected =
            item.quantity as f64 * item.unit_price * (1.0 - item.discount_percent / 100.0);
        assert!((item.line_total - expected).abs() < TOLERANCE);
    }
}

#[tokio::test]
async fn references_point_at_existing_rows() {
    let (sink, _) = generate(small_config()).await;
    let customers: HashSet<i32> = sink.customers.iter().map(|c| c.id).collect();
    let products: HashSet<i32> = sink.products.iter().map(|p| p.id).collect();
    let categories: HashSet<i32> = sink.categories.iter().map(|c| c.id).collect();
    let orders: HashSet<i32> = sink.orders.iter().map(|o| o.id).collect();
    let invoices: HashSet<i32> = sink.invoices.iter().map(|i| i.id).collect();

    assert!(sink.products.iter().all(|p| categories.contains(&p.row.category_id)));
    assert!(sink.orders.iter().all(|o| customers.contains(&o.row.customer_id)));
    for item in &sink.order_items {
        assert!(orders.contains(&item.parent_id.expect("order id")));
        assert!(products.contains(&item.row.product_id));
    }
    assert!(
        sink.payments
            .iter()
            .all(|p| orders.contains(&p.parent_id.expect("order id")))
    );
    for item in &sink.invoice_items {
        assert!(invoices.contains(&item.parent_id.expect("invoice id")));
        assert!(products.contains(&item.row.product_id));
    }
    let order_ids: HashSet<i32> = sink.order_items.iter().filter_map(|i| i.parent_id).collect();
    assert_eq!(order_ids.len(), sink.orders.len(), "every order has items");
}

#[tokio::test]
async fn invoices_exist_only_for_fulfilled_orders() {
    let (sink, _) = generate(small_config()).await;
    let invoiced: HashMap<i32, usize> =
        sink.invoices
            .iter()
            .fold(HashMap::new(), |mut acc, invoice| {
                *acc.entry(invoice.parent_id.expect("order id")).or_default() += 1;
                acc
            });

    for order in &sink.orders {
        let fulfilled = matches!(
            order.row.status,
            OrderStatus::Completed | OrderStatus::Delivered
        );
        let count = invoiced.get(&order.id).copied().unwrap_or(0);
        assert_eq!(count, usize::from(fulfilled), "order {}", order.row.order_number);
    }
}

#[tokio::test]
async fn payments_follow_order_status() {
    let (sink, _) = generate(small_config()).await;
    let mut by_order: HashMap<i32, Vec<PaymentStatus>> = HashMap::new();
    for payment in &sink.payments {
        by_order
            .entry(payment.parent_id.expect("order id"))
            .or_default()
            .push(payment.row.status);
        if payment.row.status == PaymentStatus::Completed {
            assert!(payment.row.paid_at.is_some());
        } else {
            assert!(payment.row.paid_at.is_none());
        }
        assert_eq!(
            payment.row.transaction_ref.is_some(),
            payment.row.payment_gateway.is_some()
        );
    }

    for order in &sink.orders {
        let payments = by_order.get(&order.id).cloned().unwrap_or_default();
        match order.row.status {
            OrderStatus::Completed | OrderStatus::Delivered | OrderStatus::Shipped => {
                assert_eq!(payments, vec![PaymentStatus::Completed]);
            }
            OrderStatus::Pending => {
                assert!(payments.len() <= 1);
                assert!(payments.iter().all(|s| *s == PaymentStatus::Pending));
            }
            OrderStatus::Cancelled => {
                assert!(payments.iter().all(|s| *s == PaymentStatus::Failed));
            }
            OrderStatus::Refunded => assert_eq!(payments, vec![PaymentStatus::Refunded]),
            OrderStatus::Processing => {
                assert_eq!(payments.len(), 1);
                assert!(matches!(
                    payments[0],
                    PaymentStatus::Completed | PaymentStatus::Processing
                ));
            }
        }
    }
}

#[tokio::test]
async fn business_codes_are_unique() {
    let (sink, _) = generate(small_config()).await;
    let orders: HashSet<&str> = sink.orders.iter().map(|o| o.row.order_number.as_str()).collect();
    let payments: HashSet<&str> = sink
        .payments
        .iter()
        .map(|p| p.row.payment_code.as_str())
        .collect();
    let invoices: HashSet<&str> = sink
        .invoices
        .iter()
        .map(|i| i.row.invoice_number.as_str())
        .collect();
    assert_eq!(orders.len(), sink.orders.len());
    assert_eq!(payments.len(), sink.payments.len());
    assert_eq!(invoices.len(), sink.invoices.len());
}

#[tokio::test]
async fn reconciliation_noise_stays_within_bounds() {
    let (sink, _) = generate(small_config()).await;
    let orders: HashMap<i32, &shopforge_core::Order> =
        sink.orders.iter().map(|o| (o.id, &o.row)).collect();

    for payment in &sink.payments {
        let order = orders[&payment.parent_id.expect("order id")];
        let drift = (payment.row.amount - order.total_amount).abs();
        assert!(
            drift <= order.total_amount * 0.10 + TOLERANCE,
            "{}: amount {} against total {}",
            payment.row.payment_code,
            payment.row.amount,
            order.total_amount
        );
    }

    let mut adjusted = 0;
    for invoice in &sink.invoices {
        let order = orders[&invoice.parent_id.expect("order id")];
        let row = &invoice.row;
        let drift = (row.subtotal - order.subtotal).abs();
        assert!(
            drift <= order.subtotal * 0.05 + TOLERANCE,
            "{}: subtotal {} against order subtotal {}",
            row.invoice_number,
            row.subtotal,
            order.subtotal
        );
        assert!((row.total_amount - (row.subtotal + row.tax_amount)).abs() < TOLERANCE);
        if (row.subtotal - order.subtotal).abs() >= 0.005 {
            adjusted += 1;
            let expected_tax = (row.subtotal * 0.10 * 100.0).round() / 100.0;
            assert!(
                (row.tax_amount - expected_tax).abs() < TOLERANCE,
                "{}: tax {} expected {}",
                row.invoice_number,
                row.tax_amount,
                expected_tax
            );
        }
    }
    assert!(adjusted > 0, "some invoices carry an adjustment");
}
