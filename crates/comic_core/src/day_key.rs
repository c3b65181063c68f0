use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use shared::domain::{DayKey, Theme};

use crate::catalog::ThemeCatalog;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Maps wall-clock instants to the civil day in a fixed timezone and to the
/// theme for that day.
///
/// The day key is the chrono ordinal: January 1 is day 1 and December 31 is
/// day 365, or 366 in leap years. The theme index is `(day - 1) % len`, so
/// every January 1 starts over at index 0 no matter where December 31 ended.
#[derive(Debug, Clone)]
pub struct DaySelector {
    catalog: Arc<ThemeCatalog>,
    timezone: Tz,
}

impl DaySelector {
    pub fn new(catalog: Arc<ThemeCatalog>, timezone: Tz) -> Self {
        Self { catalog, timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn catalog(&self) -> &ThemeCatalog {
        &self.catalog
    }

    pub fn civil_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    pub fn day_key(&self, now: DateTime<Utc>) -> DayKey {
        DayKey(self.civil_date(now).ordinal())
    }

    pub fn theme_index(&self, day: DayKey) -> usize {
        day.0.saturating_sub(1) as usize % self.catalog.len()
    }

    pub fn theme_for_day(&self, day: DayKey) -> &Theme {
        let index = self.theme_index(day);
        // ThemeCatalog is never empty, so the index is always in range.
        &self.catalog.themes()[index]
    }

    pub fn theme_for(&self, now: DateTime<Utc>) -> Theme {
        self.theme_for_day(self.day_key(now)).clone()
    }
}

#[cfg(test)]
#[path = "tests/day_key_tests.rs"]
mod tests;
