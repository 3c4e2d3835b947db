use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Source of the current instant. Every rule reads "now" through this so
/// temporal behavior can be driven deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by [`Utc::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Returns the UTC calendar date an instant falls on.
pub fn utc_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Returns the half-open `[start, end)` UTC interval covering `date`.
///
/// `end` is `None` for the last representable date, whose following
/// midnight does not exist.
pub fn utc_day_bounds(date: NaiveDate) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start, start.checked_add_signed(Duration::days(1)))
}

#[cfg(test)]
pub use manual::ManualClock;
