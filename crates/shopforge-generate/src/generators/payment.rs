use chrono::Duration;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use uuid::Builder;

use shopforge_core::{Order, OrderStatus, Payment, PaymentStatus};

use crate::config::GenerationConfig;
use crate::errors::GenerationError;
use crate::generators::midnight;
use crate::sampling::{WeightedChoice, business_code, round_currency, seeded_rng};

/// Share of payments whose amount drifts from the order total.
const MISMATCH_PROBABILITY: f64 = 0.05;
const MISMATCH_SPREAD: f64 = 0.10;

/// Decide whether an order gets a payment row and with which status.
pub fn payment_status_for<R: Rng + ?Sized>(
    status: OrderStatus,
    rng: &mut R,
) -> Option<PaymentStatus> {
    match status {
        OrderStatus::Completed | OrderStatus::Delivered | OrderStatus::Shipped => {
            Some(PaymentStatus::Completed)
        }
        OrderStatus::Processing => {
            if rng.random_bool(0.5) {
                Some(PaymentStatus::Completed)
            } else {
                Some(PaymentStatus::Processing)
            }
        }
        OrderStatus::Pending => rng.random_bool(0.5).then_some(PaymentStatus::Pending),
        OrderStatus::Cancelled => rng.random_bool(0.7).then_some(PaymentStatus::Failed),
        OrderStatus::Refunded => Some(PaymentStatus::Refunded),
    }
}

pub struct PaymentGenerator<'a> {
    config: &'a GenerationConfig,
    orders: &'a [Order],
    rng: ChaCha8Rng,
}

impl<'a> PaymentGenerator<'a> {
    pub fn new(config: &'a GenerationConfig, orders: &'a [Order]) -> Self {
        Self {
            config,
            orders,
            rng: seeded_rng(config.seed, "payments"),
        }
    }

    pub fn generate(mut self) -> Result<Vec<Payment>, GenerationError> {
        let methods = WeightedChoice::from_table(&self.config.payment_methods)?;
        let year = self.config.code_year();

        let mut payments = Vec::with_capacity(self.orders.len());
        for (order_ref, order) in self.orders.iter().enumerate() {
            let Some(status) = payment_status_for(order.status, &mut self.rng) else {
                continue;
            };

            let method = methods.sample(&mut self.rng);
            let payment_gateway = method
                .gateways()
                .choose(&mut self.rng)
                .map(|gateway| (*gateway).to_string());

            let (payment_date, paid_at) = if status == PaymentStatus::Completed {
                let date = order.order_date + Duration::days(self.rng.random_range(0..=3));
                let at = midnight(date)
                    + Duration::hours(self.rng.random_range(8..=22))
                    + Duration::minutes(self.rng.random_range(0..60));
                (date, Some(at))
            } else {
                (order.order_date, None)
            };

            let mut amount = order.total_amount;
            if self.rng.random::<f64>() < MISMATCH_PROBABILITY {
                let variance = self.rng.random_range(-MISMATCH_SPREAD..MISMATCH_SPREAD);
                amount = round_currency(amount * (1.0 + variance));
            }

            let transaction_ref = payment_gateway.as_ref().map(|_| {
                let mut id = Builder::from_random_bytes(self.rng.random())
                    .into_uuid()
                    .hyphenated()
                    .to_string();
                id.truncate(20);
                id
            });

            payments.push(Payment {
                payment_code: business_code("PAY", year, payments.len() + 1),
                order_ref,
                amount,
                payment_method: method,
                payment_gateway,
                status,
                payment_date,
                paid_at,
                transaction_ref,
                gateway_response: None,
                created_at: midnight(order.order_date),
                updated_at: self.config.as_of,
            });
        }

        info!(table = "payments", rows = payments.len(), "generated table");
        Ok(payments)
    }
}
