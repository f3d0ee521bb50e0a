use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use shopforge_core::{CustomerSegment, OrderStatus, PaymentMethod, SalesChannel};

use crate::errors::GenerationError;

/// One entry of a weighted categorical table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Weighted<T> {
    pub value: T,
    pub weight: f64,
}

impl<T> Weighted<T> {
    pub const fn new(value: T, weight: f64) -> Self {
        Self { value, weight }
    }
}

/// Knobs for a generation run.
///
/// Every field has a default, so a TOML file only needs the values it
/// overrides. Weight tables are ordered lists because draw order feeds
/// reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seed shared by every generator of the run.
    pub seed: u64,
    pub num_categories: usize,
    pub num_products: usize,
    pub num_customers: usize,
    pub num_orders: usize,
    /// First order date (inclusive).
    pub date_start: NaiveDate,
    /// Last order date (inclusive).
    pub date_end: NaiveDate,
    /// Clock used for audit timestamps and relative dates.
    pub as_of: NaiveDateTime,
    /// Demand multiplier per calendar month, January first.
    pub monthly_weights: Vec<f64>,
    /// Demand multiplier for Saturdays and Sundays.
    pub weekend_multiplier: f64,
    pub customer_segments: Vec<Weighted<CustomerSegment>>,
    pub sales_channels: Vec<Weighted<SalesChannel>>,
    pub payment_methods: Vec<Weighted<PaymentMethod>>,
    pub order_statuses: Vec<Weighted<OrderStatus>>,
    pub cities: Vec<String>,
    pub country: String,
    /// Resample budget for distinct Pareto product picks within one order.
    pub max_pareto_attempts: u32,
    /// Rows per multi-row INSERT statement.
    pub insert_batch_size: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let date_start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let date_end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default();
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap_or_default()
            .and_time(NaiveTime::MIN);

        Self {
            seed: 42,
            num_categories: 20,
            num_products: 1_000,
            num_customers: 10_000,
            num_orders: 100_000,
            date_start,
            date_end,
            as_of,
            monthly_weights: vec![0.7, 1.3, 0.8, 0.9, 1.0, 1.0, 1.1, 1.0, 0.9, 1.1, 1.5, 1.8],
            weekend_multiplier: 1.2,
            customer_segments: vec![
                Weighted::new(CustomerSegment::Vip, 0.05),
                Weighted::new(CustomerSegment::Regular, 0.30),
                Weighted::new(CustomerSegment::Occasional, 0.45),
                Weighted::new(CustomerSegment::New, 0.20),
            ],
            sales_channels: vec![
                Weighted::new(SalesChannel::Website, 0.45),
                Weighted::new(SalesChannel::MobileApp, 0.30),
                Weighted::new(SalesChannel::Marketplace, 0.15),
                Weighted::new(SalesChannel::Store, 0.10),
            ],
            payment_methods: vec![
                Weighted::new(PaymentMethod::CreditCard, 0.25),
                Weighted::new(PaymentMethod::BankTransfer, 0.30),
                Weighted::new(PaymentMethod::Cod, 0.25),
                Weighted::new(PaymentMethod::EWallet, 0.20),
            ],
            order_statuses: vec![
                Weighted::new(OrderStatus::Completed, 0.70),
                Weighted::new(OrderStatus::Delivered, 0.10),
                Weighted::new(OrderStatus::Shipped, 0.05),
                Weighted::new(OrderStatus::Processing, 0.05),
                Weighted::new(OrderStatus::Pending, 0.03),
                Weighted::new(OrderStatus::Cancelled, 0.05),
                Weighted::new(OrderStatus::Refunded, 0.02),
            ],
            cities: [
                "Hồ Chí Minh",
                "Hà Nội",
                "Đà Nẵng",
                "Hải Phòng",
                "Cần Thơ",
                "Biên Hòa",
                "Nha Trang",
                "Huế",
                "Buôn Ma Thuột",
                "Đà Lạt",
                "Vũng Tàu",
                "Quy Nhơn",
                "Thanh Hóa",
                "Nam Định",
                "Thái Nguyên",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            country: "Vietnam".to_string(),
            max_pareto_attempts: 64,
            insert_batch_size: 1_000,
        }
    }
}

impl GenerationConfig {
    /// Load a TOML config file and validate it.
    pub fn load(path: &Path) -> Result<Self, GenerationError> {
        let content = std::fs::read_to_string(path)?;
        let config: GenerationConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.date_end < self.date_start {
            return Err(GenerationError::InvalidConfig(format!(
                "date_end {} is before date_start {}",
                self.date_end, self.date_start
            )));
        }
        if self.monthly_weights.len() != 12 {
            return Err(GenerationError::InvalidConfig(format!(
                "monthly_weights needs 12 entries, got {}",
                self.monthly_weights.len()
            )));
        }
        if self
            .monthly_weights
            .iter()
            .chain(std::iter::once(&self.weekend_multiplier))
            .any(|weight| !weight.is_finite() || *weight < 0.0)
        {
            return Err(GenerationError::InvalidConfig(
                "seasonality weights must be finite and non-negative".to_string(),
            ));
        }
        check_table("customer_segments", &self.customer_segments)?;
        check_table("sales_channels", &self.sales_channels)?;
        check_table("payment_methods", &self.payment_methods)?;
        check_table("order_statuses", &self.order_statuses)?;
        if self.cities.is_empty() {
            return Err(GenerationError::InvalidConfig(
                "cities must not be empty".to_string(),
            ));
        }
        if self.num_categories > crate::generators::category::CATALOG.len() {
            return Err(GenerationError::InvalidConfig(format!(
                "num_categories is limited to {}",
                crate::generators::category::CATALOG.len()
            )));
        }
        if self.max_pareto_attempts == 0 || self.insert_batch_size == 0 {
            return Err(GenerationError::InvalidConfig(
                "max_pareto_attempts and insert_batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Year stamped into business codes such as `ORD-2024-000001`.
    pub fn code_year(&self) -> i32 {
        use chrono::Datelike;
        self.date_start.year()
    }
}

fn check_table<T>(name: &str, entries: &[Weighted<T>]) -> Result<(), GenerationError> {
    if entries.is_empty() {
        return Err(GenerationError::InvalidConfig(format!(
            "{name} must not be empty"
        )));
    }
    if entries
        .iter()
        .any(|entry| !entry.weight.is_finite() || entry.weight < 0.0)
    {
        return Err(GenerationError::InvalidConfig(format!(
            "{name} weights must be finite and non-negative"
        )));
    }
    if entries.iter().all(|entry| entry.weight == 0.0) {
        return Err(GenerationError::InvalidConfig(format!(
            "{name} needs at least one positive weight"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GenerationConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GenerationConfig = toml::from_str(
            r#"
            seed = 7
            num_orders = 500

            [[sales_channels]]
            value = "Store"
            weight = 1.0
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.num_orders, 500);
        assert_eq!(config.num_customers, 10_000);
        assert_eq!(config.sales_channels, vec![Weighted::new(SalesChannel::Store, 1.0)]);
    }

    #[test]
    fn rejects_inverted_range() {
        let config = GenerationConfig {
            date_end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GenerationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_all_zero_weights() {
        let config = GenerationConfig {
            order_statuses: vec![Weighted::new(OrderStatus::Pending, 0.0)],
            ..GenerationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("order_statuses"));
    }

    #[test]
    fn rejects_short_monthly_table() {
        let config = GenerationConfig {
            monthly_weights: vec![1.0; 11],
            ..GenerationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
