use chrono::{Datelike, Duration, NaiveDate};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, PostCode, StreetName};
use fake::faker::internet::en::FreeEmailProvider;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use shopforge_core::{Customer, Gender};

use crate::config::GenerationConfig;
use crate::errors::GenerationError;
use crate::generators::{date_between, midnight};
use crate::sampling::{WeightedChoice, business_code, seeded_rng, truncate_chars};

pub struct CustomerGenerator<'a> {
    config: &'a GenerationConfig,
    rng: ChaCha8Rng,
}

impl<'a> CustomerGenerator<'a> {
    pub fn new(config: &'a GenerationConfig) -> Self {
        Self {
            config,
            rng: seeded_rng(config.seed, "customers"),
        }
    }

    pub fn generate(mut self) -> Result<Vec<Customer>, GenerationError> {
        let segments = WeightedChoice::from_table(&self.config.customer_segments)?;
        let year = self.config.code_year();
        let registration_from = self.config.date_start - Duration::days(365);
        let registration_to = self.config.date_end;
        let today = self.config.as_of.date();
        let (oldest, youngest) = birth_bounds(today);

        let mut customers = Vec::with_capacity(self.config.num_customers);
        for idx in 1..=self.config.num_customers {
            let registration_date =
                date_between(registration_from, registration_to, &mut self.rng);
            let segment = segments.sample(&mut self.rng);
            let gender = *Gender::ALL
                .choose(&mut self.rng)
                .unwrap_or(&Gender::Other);
            let provider: String = FreeEmailProvider().fake_with_rng(&mut self.rng);
            let first_name: String = FirstName().fake_with_rng(&mut self.rng);
            let last_name: String = LastName().fake_with_rng(&mut self.rng);
            let phone: String = PhoneNumber().fake_with_rng(&mut self.rng);
            let building: String = BuildingNumber().fake_with_rng(&mut self.rng);
            let street: String = StreetName().fake_with_rng(&mut self.rng);
            let postal_code: String = PostCode().fake_with_rng(&mut self.rng);
            let city = self
                .config
                .cities
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_default();

            customers.push(Customer {
                customer_code: business_code("CUST", year, idx),
                email: format!("customer{idx}@{provider}"),
                first_name,
                last_name,
                phone: truncate_chars(phone, 20),
                date_of_birth: date_between(oldest, youngest, &mut self.rng),
                gender,
                address_line1: truncate_chars(format!("{building} {street}"), 255),
                address_line2: None,
                city,
                state: None,
                postal_code: truncate_chars(postal_code, 20),
                country: self.config.country.clone(),
                segment,
                registration_date,
                is_active: self.rng.random::<f64>() > 0.02,
                created_at: midnight(registration_date),
                updated_at: self.config.as_of,
            });
        }

        info!(table = "customers", rows = customers.len(), "generated table");
        Ok(customers)
    }
}

/// Birth date window for customers aged 18 to 70 on `today`.
fn birth_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let shift = |years: i32| {
        NaiveDate::from_ymd_opt(today.year() - years, today.month(), today.day().min(28))
            .unwrap_or(today)
    };
    (shift(70), shift(18))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn small_config() -> GenerationConfig {
        GenerationConfig {
            num_customers: 500,
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn codes_and_emails_are_unique() {
        let customers = CustomerGenerator::new(&small_config()).generate().unwrap();
        assert_eq!(customers.len(), 500);
        let codes: HashSet<_> = customers.iter().map(|c| c.customer_code.as_str()).collect();
        assert_eq!(codes.len(), 500);
        assert_eq!(customers[0].customer_code, "CUST-2024-000001");
        assert!(customers[0].email.starts_with("customer1@"));
    }

    #[test]
    fn attributes_stay_in_bounds() {
        let config = small_config();
        let customers = CustomerGenerator::new(&config).generate().unwrap();
        let earliest = config.date_start - Duration::days(365);
        for customer in &customers {
            assert!(customer.registration_date >= earliest);
            assert!(customer.registration_date <= config.date_end);
            assert!(customer.phone.chars().count() <= 20);
            assert!(config.cities.contains(&customer.city));
            let age = config.as_of.date().year() - customer.date_of_birth.year();
            assert!((18..=71).contains(&age), "age {age}");
        }
    }

    #[test]
    fn same_seed_same_customers() {
        let config = small_config();
        let first = CustomerGenerator::new(&config).generate().unwrap();
        let second = CustomerGenerator::new(&config).generate().unwrap();
        assert_eq!(first, second);
    }
}
