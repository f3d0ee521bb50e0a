//! Per-table generators.
//!
//! Each generator owns a ChaCha8 stream seeded from the run seed and its
//! table key, so its output depends only on the config and its inputs.

pub mod category;
pub mod customer;
pub mod invoice;
pub mod order;
pub mod payment;
pub mod product;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;

pub use category::CategoryGenerator;
pub use customer::CustomerGenerator;
pub use invoice::{InvoiceBatch, InvoiceGenerator};
pub use order::{OrderBatch, OrderGenerator};
pub use payment::PaymentGenerator;
pub use product::ProductGenerator;

/// Uniform date in `[start, end]`.
pub(crate) fn date_between<R: Rng + ?Sized>(
    start: NaiveDate,
    end: NaiveDate,
    rng: &mut R,
) -> NaiveDate {
    let span = (end - start).num_days().max(0);
    start + Duration::days(rng.random_range(0..=span))
}

/// Uniform timestamp in `[start, end]` at second resolution.
pub(crate) fn datetime_between<R: Rng + ?Sized>(
    start: NaiveDateTime,
    end: NaiveDateTime,
    rng: &mut R,
) -> NaiveDateTime {
    let span = (end - start).num_seconds().max(0);
    start + Duration::seconds(rng.random_range(0..=span))
}

pub(crate) fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
