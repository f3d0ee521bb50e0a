//! Random sampling primitives shared by the generators.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Pareto;

use crate::config::Weighted;
use crate::errors::GenerationError;

/// Categorical sampler over an ordered `(value, weight)` table.
#[derive(Debug, Clone)]
pub struct WeightedChoice<T> {
    values: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> WeightedChoice<T> {
    pub fn new(entries: impl IntoIterator<Item = (T, f64)>) -> Result<Self, GenerationError> {
        let (values, weights): (Vec<T>, Vec<f64>) = entries.into_iter().unzip();
        let index = WeightedIndex::new(&weights).map_err(|err| {
            GenerationError::InvalidConfig(format!("malformed weight table: {err}"))
        })?;
        Ok(Self { values, index })
    }

    pub fn from_table(table: &[Weighted<T>]) -> Result<Self, GenerationError> {
        Self::new(table.iter().map(|entry| (entry.value, entry.weight)))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.values[self.index.sample(rng)]
    }
}

/// Inputs of the seasonal order-date distribution.
#[derive(Debug, Clone, Copy)]
pub struct Seasonality<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub target: usize,
    /// Twelve multipliers, January first.
    pub monthly_weights: &'a [f64],
    pub weekend_multiplier: f64,
}

impl Seasonality<'_> {
    fn day_weight(&self, date: NaiveDate) -> f64 {
        let month = self
            .monthly_weights
            .get(date.month0() as usize)
            .copied()
            .unwrap_or(1.0);
        let weekday = match date.weekday() {
            Weekday::Sat | Weekday::Sun => self.weekend_multiplier,
            _ => 1.0,
        };
        month * weekday
    }
}

/// Produce exactly `target` dates whose density follows the seasonality.
///
/// Each day is replicated `trunc(trunc(base × weight) × jitter)` times with a
/// floor of one, so sparse days never vanish from the pool before the final
/// shuffle and truncation. A pool shorter than the target is topped up with
/// days drawn by weight.
pub fn seasonal_dates<R: Rng + ?Sized>(season: &Seasonality<'_>, rng: &mut R) -> Vec<NaiveDate> {
    if season.target == 0 || season.end < season.start {
        return Vec::new();
    }

    let span_days = (season.end - season.start).num_days().max(1) as f64;
    let base_rate = season.target as f64 / span_days;

    let mut pool = Vec::with_capacity(season.target + span_days as usize);
    let mut days = Vec::new();
    let mut weights = Vec::new();

    for date in season.start.iter_days().take_while(|date| *date <= season.end) {
        let weight = season.day_weight(date);
        let daily = (base_rate * weight).trunc();
        let jittered = (daily * rng.random_range(0.8..1.2)).trunc() as usize;
        pool.extend(std::iter::repeat_n(date, jittered.max(1)));
        days.push(date);
        weights.push(weight);
    }

    if pool.len() < season.target {
        let missing = season.target - pool.len();
        match WeightedIndex::new(&weights) {
            Ok(index) => pool.extend((0..missing).map(|_| days[index.sample(rng)])),
            Err(_) => pool.extend((0..missing).map(|_| days[rng.random_range(0..days.len())])),
        }
    }

    pool.shuffle(rng);
    pool.truncate(season.target);
    pool
}

/// Popularity-skewed index picker: low catalog positions win most draws.
#[derive(Debug, Clone)]
pub struct ParetoPicker {
    dist: Pareto<f64>,
    max_attempts: u32,
}

impl ParetoPicker {
    pub const SHAPE: f64 = 1.5;

    pub fn new(max_attempts: u32) -> Result<Self, GenerationError> {
        let dist = Pareto::new(1.0, Self::SHAPE)
            .map_err(|err| GenerationError::InvalidConfig(format!("pareto: {err}")))?;
        Ok(Self {
            dist,
            max_attempts: max_attempts.max(1),
        })
    }

    /// One draw clamped into `0..len`. `len` must be positive.
    pub fn draw_index<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> usize {
        let x = self.dist.sample(rng);
        ((x - 1.0).max(0.0) as usize).min(len.saturating_sub(1))
    }

    /// Pick an index not yet in `used`, resampling up to the attempt budget
    /// and then falling back to the first unused position. Returns `None`
    /// only when every index is taken.
    pub fn pick_distinct<R: Rng + ?Sized>(
        &self,
        len: usize,
        used: &mut HashSet<usize>,
        rng: &mut R,
    ) -> Option<usize> {
        if len == 0 {
            return None;
        }
        for _ in 0..self.max_attempts {
            let idx = self.draw_index(len, rng);
            if used.insert(idx) {
                return Some(idx);
            }
        }
        let idx = (0..len).find(|idx| !used.contains(idx))?;
        used.insert(idx);
        Some(idx)
    }
}

/// Derive a per-generator seed from the run seed (FNV-1a over the key).
pub fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

pub fn seeded_rng(seed: u64, key: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash_seed(seed, key))
}

pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round_thousands(value: f64) -> f64 {
    (value / 1_000.0).round() * 1_000.0
}

/// Business code such as `ORD-2024-000001`.
pub fn business_code(prefix: &str, year: i32, number: usize) -> String {
    format!("{prefix}-{year}-{number:06}")
}

/// Cut a string to at most `max` characters on a char boundary.
pub fn truncate_chars(value: String, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn year_2024(target: usize, monthly: &[f64]) -> Seasonality<'_> {
        Seasonality {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            target,
            monthly_weights: monthly,
            weekend_multiplier: 1.2,
        }
    }

    #[test]
    fn weighted_choice_converges_to_weights() {
        let choice = WeightedChoice::new([("a", 0.7), ("b", 0.2), ("c", 0.1)]).unwrap();
        let mut rng = rng();
        let draws = 20_000;
        let hits = (0..draws).filter(|_| choice.sample(&mut rng) == "a").count();
        let freq = hits as f64 / draws as f64;
        assert!((freq - 0.7).abs() < 0.02, "frequency {freq}");
    }

    #[test]
    fn weighted_choice_rejects_empty_table() {
        let entries: Vec<(u8, f64)> = Vec::new();
        assert!(WeightedChoice::new(entries).is_err());
    }

    #[test]
    fn seasonal_dates_hit_target_exactly() {
        let monthly = [1.0; 12];
        let dates = seasonal_dates(&year_2024(5_000, &monthly), &mut rng());
        assert_eq!(dates.len(), 5_000);
        assert!(dates.iter().all(|date| date.year() == 2024));
    }

    #[test]
    fn sparse_target_is_truncated_after_padding() {
        let monthly = [1.0; 12];
        let dates = seasonal_dates(&year_2024(10, &monthly), &mut rng());
        assert_eq!(dates.len(), 10);
    }

    #[test]
    fn zero_weights_still_fill_the_target() {
        let monthly = [0.0; 12];
        let dates = seasonal_dates(&year_2024(2_000, &monthly), &mut rng());
        assert_eq!(dates.len(), 2_000);
    }

    #[test]
    fn heavy_months_receive_more_dates() {
        let monthly = [0.7, 1.3, 0.8, 0.9, 1.0, 1.0, 1.1, 1.0, 0.9, 1.1, 1.5, 1.8];
        let dates = seasonal_dates(&year_2024(50_000, &monthly), &mut rng());
        let january = dates.iter().filter(|date| date.month() == 1).count();
        let december = dates.iter().filter(|date| date.month() == 12).count();
        assert!(december > january * 2, "jan={january} dec={december}");
    }

    #[test]
    fn pareto_prefers_low_indices() {
        let picker = ParetoPicker::new(64).unwrap();
        let mut rng = rng();
        let draws: Vec<usize> = (0..10_000).map(|_| picker.draw_index(1_000, &mut rng)).collect();
        let head = draws.iter().filter(|idx| **idx < 10).count();
        assert!(head > 8_000, "head share {head}");
        assert!(draws.iter().all(|idx| *idx < 1_000));
    }

    #[test]
    fn distinct_picks_terminate_on_tiny_catalogs() {
        let picker = ParetoPicker::new(4).unwrap();
        let mut rng = rng();
        let mut used = HashSet::new();
        let picks: Vec<_> = (0..3)
            .map(|_| picker.pick_distinct(3, &mut used, &mut rng))
            .collect();
        assert!(picks.iter().all(Option::is_some));
        assert_eq!(used.len(), 3);
        assert_eq!(picker.pick_distinct(3, &mut used, &mut rng), None);
    }

    #[test]
    fn hash_seed_separates_keys() {
        assert_ne!(hash_seed(42, "orders"), hash_seed(42, "payments"));
        assert_eq!(hash_seed(42, "orders"), hash_seed(42, "orders"));
    }

    #[test]
    fn formats_codes_and_rounds() {
        assert_eq!(business_code("ORD", 2024, 1), "ORD-2024-000001");
        assert_eq!(round_currency(10.005_1), 10.01);
        assert_eq!(round_thousands(123_456.0), 123_000.0);
        assert_eq!(truncate_chars("Hà Nội".to_string(), 2), "Hà");
    }
}
