//! In-memory item cache with time-based staleness.
//!
//! Provides [`Clock`] trait and implementations:
//! - [`SystemClock`]: wall clock time
//! - [`FixedClock`]: settable time for tests and reproducible builds

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};

use crate::item::Item;

/// Source of the current time.
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

/// Clock returning a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache lifetime split into whole hours and rounded minutes.
///
/// `None` if the period does not fit in a `TimeDelta`.
#[allow(clippy::cast_possible_truncation)]
fn period_duration(hours: f64) -> Option<TimeDelta> {
    let whole = hours.trunc();
    let minutes = ((hours - whole) * 60.0).round() as i64;
    TimeDelta::try_hours(whole as i64)?.checked_add(&TimeDelta::try_minutes(minutes)?)
}

/// Items of the last build and when they were computed.
#[derive(Debug, Default)]
pub struct ItemCache {
    items: Vec<Item>,
    cached_at: Option<DateTime<Utc>>,
}

impl ItemCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the held items may be reused at `now`.
    ///
    /// False when nothing is held, when `period_hours` is `None` or not
    /// positive, and from the expiry instant `cached_at + period` onward.
    /// A period reaching past the representable time range never expires.
    #[must_use]
    pub fn is_fresh(&self, period_hours: Option<f64>, now: DateTime<Utc>) -> bool {
        if self.items.is_empty() {
            tracing::debug!("Data is not ready yet");
            return false;
        }
        let Some(hours) = period_hours.filter(|h| *h > 0.0) else {
            return false;
        };
        let Some(cached_at) = self.cached_at else {
            return false;
        };

        let Some(expires_at) =
            period_duration(hours).and_then(|period| cached_at.checked_add_signed(period))
        else {
            return true;
        };
        if now < expires_at {
            true
        } else {
            tracing::debug!(%expires_at, "Updating data cache");
            false
        }
    }

    /// Replace the held items, stamped at `now`.
    pub fn store(&mut self, items: Vec<Item>, now: DateTime<Utc>) {
        self.items = items;
        self.cached_at = Some(now);
    }

    /// Drop held items so the next build recomputes.
    pub fn invalidate(&mut self) {
        self.items.clear();
        self.cached_at = None;
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.cached_at
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
