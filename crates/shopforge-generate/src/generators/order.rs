use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, StreetName};
use fake::faker::lorem::en::Sentence;
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use shopforge_core::{Order, OrderItem, ProductRef};

use crate::config::GenerationConfig;
use crate::errors::GenerationError;
use crate::generators::midnight;
use crate::sampling::{
    ParetoPicker, Seasonality, WeightedChoice, business_code, round_currency, seasonal_dates,
    seeded_rng, truncate_chars,
};

const ITEM_COUNTS: [(usize, f64); 5] = [(1, 0.40), (2, 0.35), (3, 0.15), (4, 0.07), (5, 0.03)];
const QUANTITIES: [(i32, f64); 5] = [(1, 0.50), (2, 0.30), (3, 0.10), (4, 0.05), (5, 0.05)];
const LINE_DISCOUNTS: [(f64, f64); 5] = [
    (0.0, 0.50),
    (5.0, 0.20),
    (10.0, 0.15),
    (15.0, 0.10),
    (20.0, 0.05),
];
/// Coupon share of the subtotal.
const ORDER_DISCOUNTS: [(f64, f64); 3] = [(0.0, 0.70), (0.05, 0.20), (0.10, 0.10)];
const SHIPPING_FEES: [(f64, f64); 4] = [
    (0.0, 0.30),
    (20_000.0, 0.40),
    (30_000.0, 0.20),
    (50_000.0, 0.10),
];
/// Hour-of-day weights, midnight first; traffic peaks 10:00 to 22:00.
const HOUR_WEIGHTS: [f64; 24] = [
    1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 5.0, 7.0, 8.0, 9.0, 10.0, 10.0, 9.0, 8.0, 7.0, 8.0, 9.0,
    10.0, 10.0, 8.0, 6.0, 4.0, 2.0,
];
pub const TAX_RATE: f64 = 0.10;
const NOTE_PROBABILITY: f64 = 0.10;

/// Orders and their line items; `items[*].order_ref` indexes into `orders`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBatch {
    pub orders: Vec<Order>,
    pub items: Vec<OrderItem>,
}

impl OrderBatch {
    /// Line items grouped by order position.
    pub fn items_by_order(&self) -> Vec<Vec<&OrderItem>> {
        let mut grouped = vec![Vec::new(); self.orders.len()];
        for item in &self.items {
            if let Some(slot) = grouped.get_mut(item.order_ref) {
                slot.push(item);
            }
        }
        grouped
    }
}

struct Samplers {
    statuses: WeightedChoice<shopforge_core::OrderStatus>,
    channels: WeightedChoice<shopforge_core::SalesChannel>,
    item_counts: WeightedChoice<usize>,
    quantities: WeightedChoice<i32>,
    line_discounts: WeightedChoice<f64>,
    order_discounts: WeightedChoice<f64>,
    shipping_fees: WeightedChoice<f64>,
    hours: WeightedChoice<i64>,
}

impl Samplers {
    fn build(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            statuses: WeightedChoice::from_table(&config.order_statuses)?,
            channels: WeightedChoice::from_table(&config.sales_channels)?,
            item_counts: WeightedChoice::new(ITEM_COUNTS)?,
            quantities: WeightedChoice::new(QUANTITIES)?,
            line_discounts: WeightedChoice::new(LINE_DISCOUNTS)?,
            order_discounts: WeightedChoice::new(ORDER_DISCOUNTS)?,
            shipping_fees: WeightedChoice::new(SHIPPING_FEES)?,
            hours: WeightedChoice::new((0..24_i64).zip(HOUR_WEIGHTS))?,
        })
    }
}

/// Money columns of one order, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub shipping_fee: f64,
    pub total_amount: f64,
}

impl OrderTotals {
    /// Total is derived from the rounded parts so the identity
    /// `total = subtotal - discount + tax + shipping` holds on stored values.
    pub fn compute(line_totals: &[f64], discount_rate: f64, shipping_fee: f64) -> Self {
        let subtotal = round_currency(line_totals.iter().sum());
        let discount_amount = round_currency(subtotal * discount_rate);
        let tax_amount = round_currency((subtotal - discount_amount) * TAX_RATE);
        let shipping_fee = round_currency(shipping_fee);
        let total_amount = round_currency(subtotal - discount_amount + tax_amount + shipping_fee);
        Self {
            subtotal,
            discount_amount,
            tax_amount,
            shipping_fee,
            total_amount,
        }
    }
}

pub fn line_total(quantity: i32, unit_price: f64, discount_percent: f64) -> f64 {
    round_currency(quantity as f64 * unit_price * (1.0 - discount_percent / 100.0))
}

pub struct OrderGenerator<'a> {
    config: &'a GenerationConfig,
    customer_ids: &'a [i32],
    products: &'a [ProductRef],
    rng: ChaCha8Rng,
}

impl<'a> OrderGenerator<'a> {
    pub fn new(
        config: &'a GenerationConfig,
        customer_ids: &'a [i32],
        products: &'a [ProductRef],
    ) -> Self {
        Self {
            config,
            customer_ids,
            products,
            rng: seeded_rng(config.seed, "orders"),
        }
    }

    pub fn generate(mut self) -> Result<OrderBatch, GenerationError> {
        if self.config.num_orders == 0 {
            return Ok(OrderBatch::default());
        }
        if self.customer_ids.is_empty() {
            return Err(GenerationError::MissingParents(
                "orders need at least one customer".to_string(),
            ));
        }
        if self.products.is_empty() {
            return Err(GenerationError::MissingParents(
                "orders need at least one product".to_string(),
            ));
        }

        let samplers = Samplers::build(self.config)?;
        let picker = ParetoPicker::new(self.config.max_pareto_attempts)?;
        let season = Seasonality {
            start: self.config.date_start,
            end: self.config.date_end,
            target: self.config.num_orders,
            monthly_weights: &self.config.monthly_weights,
            weekend_multiplier: self.config.weekend_multiplier,
        };
        let dates = seasonal_dates(&season, &mut self.rng);
        let year = self.config.code_year();

        let mut batch = OrderBatch {
            orders: Vec::with_capacity(dates.len()),
            items: Vec::with_capacity(dates.len() * 2),
        };
        for (position, order_date) in dates.into_iter().enumerate() {
            let order = self.order(
                position,
                business_code("ORD", year, position + 1),
                order_date,
                &samplers,
                &picker,
                &mut batch.items,
            )?;
            batch.orders.push(order);

            if (position + 1) % 10_000 == 0 {
                debug!(table = "orders", rows = position + 1, "order generation progress");
            }
        }

        info!(
            table = "orders",
            rows = batch.orders.len(),
            items = batch.items.len(),
            "generated table"
        );
        Ok(batch)
    }

    fn order(
        &mut self,
        position: usize,
        order_number: String,
        order_date: NaiveDate,
        samplers: &Samplers,
        picker: &ParetoPicker,
        items: &mut Vec<OrderItem>,
    ) -> Result<Order, GenerationError> {
        let customer_id = *self
            .customer_ids
            .choose(&mut self.rng)
            .ok_or_else(|| GenerationError::MissingParents("customers".to_string()))?;
        let status = samplers.statuses.sample(&mut self.rng);
        let channel = samplers.channels.sample(&mut self.rng);

        let hour = samplers.hours.sample(&mut self.rng);
        let minute = self.rng.random_range(0..60_i64);
        let second = self.rng.random_range(0..60_i64);
        let order_timestamp = midnight(order_date)
            + Duration::hours(hour)
            + Duration::minutes(minute)
            + Duration::seconds(second);

        let wanted = samplers
            .item_counts
            .sample(&mut self.rng)
            .min(self.products.len());
        let mut used = HashSet::with_capacity(wanted);
        let mut line_totals = Vec::with_capacity(wanted);
        for _ in 0..wanted {
            let Some(index) = picker.pick_distinct(self.products.len(), &mut used, &mut self.rng)
            else {
                break;
            };
            let product = self.products[index];
            let quantity = samplers.quantities.sample(&mut self.rng);
            let discount_percent = samplers.line_discounts.sample(&mut self.rng);
            let total = line_total(quantity, product.unit_price, discount_percent);
            line_totals.push(total);
            items.push(OrderItem {
                order_ref: position,
                product_id: product.id,
                quantity,
                unit_price: product.unit_price,
                discount_percent,
                line_total: total,
                created_at: order_timestamp,
            });
        }

        let totals = OrderTotals::compute(
            &line_totals,
            samplers.order_discounts.sample(&mut self.rng),
            samplers.shipping_fees.sample(&mut self.rng),
        );

        let building: String = BuildingNumber().fake_with_rng(&mut self.rng);
        let street: String = StreetName().fake_with_rng(&mut self.rng);
        let shipping_city = self
            .config
            .cities
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default();
        let phone: String = PhoneNumber().fake_with_rng(&mut self.rng);
        let customer_note = if self.rng.random::<f64>() < NOTE_PROBABILITY {
            Some(Sentence(4..10).fake_with_rng::<String, _>(&mut self.rng))
        } else {
            None
        };

        Ok(Order {
            order_number,
            customer_id,
            order_date,
            order_timestamp,
            status,
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            tax_amount: totals.tax_amount,
            shipping_fee: totals.shipping_fee,
            total_amount: totals.total_amount,
            channel,
            shipping_address: format!("{building} {street}, {shipping_city}"),
            shipping_city,
            shipping_phone: truncate_chars(phone, 20),
            customer_note,
            internal_note: None,
            created_at: order_timestamp,
            updated_at: self.config.as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(len: usize) -> Vec<ProductRef> {
        (1..=len as i32)
            .map(|id| ProductRef {
                id,
                unit_price: 100_000.0 * id as f64,
            })
            .collect()
    }

    #[test]
    fn totals_identity_holds_on_rounded_values() {
        let totals = OrderTotals::compute(&[199_999.995, 10_000.333], 0.05, 20_000.0);
        let recomputed =
            totals.subtotal - totals.discount_amount + totals.tax_amount + totals.shipping_fee;
        assert!((totals.total_amount - recomputed).abs() < 0.01);
        assert_eq!(totals.shipping_fee, 20_000.0);
    }

    #[test]
    fn line_total_applies_percent_discount() {
        assert_eq!(line_total(2, 150_000.0, 10.0), 270_000.0);
        assert_eq!(line_total(1, 99_999.0, 0.0), 99_999.0);
    }

    #[test]
    fn single_product_catalog_terminates() {
        let config = GenerationConfig {
            num_orders: 300,
            ..GenerationConfig::default()
        };
        let products = catalog(1);
        let batch = OrderGenerator::new(&config, &[1, 2], &products)
            .generate()
            .unwrap();
        assert_eq!(batch.orders.len(), 300);
        assert_eq!(batch.items.len(), 300);
        assert!(batch.items.iter().all(|item| item.product_id == 1));
    }

    #[test]
    fn items_within_an_order_are_distinct() {
        let config = GenerationConfig {
            num_orders: 2_000,
            ..GenerationConfig::default()
        };
        let products = catalog(50);
        let batch = OrderGenerator::new(&config, &[7], &products)
            .generate()
            .unwrap();
        for items in batch.items_by_order() {
            assert!(!items.is_empty());
            let distinct: HashSet<_> = items.iter().map(|item| item.product_id).collect();
            assert_eq!(distinct.len(), items.len());
        }
    }

    #[test]
    fn timestamps_share_the_order_date() {
        let config = GenerationConfig {
            num_orders: 500,
            ..GenerationConfig::default()
        };
        let products = catalog(10);
        let batch = OrderGenerator::new(&config, &[1], &products)
            .generate()
            .unwrap();
        for order in &batch.orders {
            assert_eq!(order.order_timestamp.date(), order.order_date);
            assert!(order.order_date >= config.date_start && order.order_date <= config.date_end);
        }
    }

    #[test]
    fn missing_customers_fail() {
        let config = GenerationConfig::default();
        let products = catalog(3);
        let err = OrderGenerator::new(&config, &[], &products)
            .generate()
            .unwrap_err();
        assert!(matches!(err, GenerationError::MissingParents(_)));
    }
}
