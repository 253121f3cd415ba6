//! Maps "now" onto a calendar day in the fixed reference timezone.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::med_record::DateKey;

/// Abstraction over "current time" so tests can pin arbitrary instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[derive(Clone)]
pub struct DayResolver {
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl DayResolver {
    pub fn new(clock: Arc<dyn Clock>, tz: Tz) -> Self {
        Self { clock, tz }
    }

    pub fn system(tz: Tz) -> Self {
        Self::new(Arc::new(SystemClock), tz)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Today's key in the reference zone, whatever the host's local zone is.
    pub fn today(&self) -> DateKey {
        Self::day_of(self.clock.now(), self.tz)
    }

    pub fn day_of(instant: DateTime<Utc>, tz: Tz) -> DateKey {
        DateKey::new(instant.with_timezone(&tz).date_naive())
    }
}

impl std::fmt::Debug for DayResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DayResolver").field("tz", &self.tz).finish()
    }
}
