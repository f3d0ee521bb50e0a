use chrono::Duration;
use fake::Fake;
use fake::faker::company::en::CatchPhrase;
use fake::faker::lorem::en::{Sentence, Word};
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use shopforge_core::Product;

use crate::config::GenerationConfig;
use crate::errors::GenerationError;
use crate::generators::datetime_between;
use crate::sampling::{round_thousands, seeded_rng, truncate_chars};

/// Price tiers as `(min, max, probability)`; most products are cheap.
const PRICE_TIERS: &[(f64, f64, f64)] = &[
    (50_000.0, 200_000.0, 0.30),
    (200_000.0, 1_000_000.0, 0.35),
    (1_000_000.0, 5_000_000.0, 0.20),
    (5_000_000.0, 20_000_000.0, 0.10),
    (20_000_000.0, 50_000_000.0, 0.05),
];

pub struct ProductGenerator<'a> {
    config: &'a GenerationConfig,
    category_ids: &'a [i32],
    rng: ChaCha8Rng,
}

impl<'a> ProductGenerator<'a> {
    pub fn new(config: &'a GenerationConfig, category_ids: &'a [i32]) -> Self {
        Self {
            config,
            category_ids,
            rng: seeded_rng(config.seed, "products"),
        }
    }

    pub fn generate(mut self) -> Result<Vec<Product>, GenerationError> {
        if self.config.num_products > 0 && self.category_ids.is_empty() {
            return Err(GenerationError::MissingParents(
                "products need at least one category".to_string(),
            ));
        }

        let created_from = self.config.as_of - Duration::days(730);
        let created_to = self.config.as_of - Duration::days(182);

        let mut products = Vec::with_capacity(self.config.num_products);
        for idx in 1..=self.config.num_products {
            let category_id = *self
                .category_ids
                .choose(&mut self.rng)
                .ok_or_else(|| GenerationError::MissingParents("categories".to_string()))?;
            let (unit_price, cost_price) = price_pair(&mut self.rng);
            let phrase: String = CatchPhrase().fake_with_rng(&mut self.rng);
            let word: String = Word().fake_with_rng(&mut self.rng);
            let description: String = Sentence(8..20).fake_with_rng(&mut self.rng);

            products.push(Product {
                sku: format!("SKU-{idx:06}"),
                name: truncate_chars(format!("{phrase} {}", title_case(&word)), 255),
                description: truncate_chars(description, 200),
                category_id,
                unit_price,
                cost_price,
                stock_quantity: self.rng.random_range(0..=1_000),
                is_active: self.rng.random::<f64>() > 0.05,
                created_at: datetime_between(created_from, created_to, &mut self.rng),
                updated_at: self.config.as_of,
            });
        }

        info!(table = "products", rows = products.len(), "generated table");
        Ok(products)
    }
}

/// Draw a list price from the tiers and a cost price 20–40% below it.
/// Both are rounded to thousands; cost always stays strictly below price.
fn price_pair<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    let roll = rng.random::<f64>();
    let mut cumulative = 0.0;
    let mut tier = PRICE_TIERS[PRICE_TIERS.len() - 1];
    for candidate in PRICE_TIERS {
        cumulative += candidate.2;
        if roll <= cumulative {
            tier = *candidate;
            break;
        }
    }

    let unit_price = round_thousands(rng.random_range(tier.0..tier.1));
    let margin = rng.random_range(0.20..0.40);
    let cost_price = round_thousands(unit_price * (1.0 - margin)).min(unit_price - 1_000.0);
    (unit_price, cost_price)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
