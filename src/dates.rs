//! Day arithmetic shared by the estimator, the ranking and the refresher.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// Keeps `Duration::days` well inside chrono's representable range.
const MAX_OFFSET_DAYS: f64 = 1_000_000.0;

/// Whole days from `b` to `a`, rounded to the nearest day.
///
/// Positive when `a` is later than `b`. Rounding is half-away-from-zero so
/// `days_between(a, b) == -days_between(b, a)` always holds.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let millis = a.signed_duration_since(b).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).round() as i64
}

/// `now + days`, with `days` rounded to the nearest whole day.
pub fn future_date(days: f64) -> DateTime<Utc> {
    future_date_from(Utc::now(), days)
}

/// Same as [`future_date`] but relative to an explicit `now`.
pub fn future_date_from(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    let whole = if days.is_finite() {
        days.round().clamp(-MAX_OFFSET_DAYS, MAX_OFFSET_DAYS) as i64
    } else {
        0
    };
    now + Duration::days(whole)
}

/// Source of "now" for everything that reasons about dates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *guard = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}
