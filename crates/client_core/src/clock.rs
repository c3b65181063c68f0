use std::sync::Arc;

use chrono::{DateTime, Days, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Display-only values for the strip header. Nothing here feeds back into
/// which comic is shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderInfo {
    pub date: String,
    pub time: String,
    pub countdown: String,
}

pub fn header_info(now: DateTime<Utc>, timezone: Tz) -> HeaderInfo {
    let local = now.with_timezone(&timezone);
    HeaderInfo {
        date: local.format("%A, %B %-d, %Y").to_string(),
        time: format!("{} {}", local.format("%I:%M:%S %p"), zone_label(&local)),
        countdown: format_countdown(until_next_midnight(now, timezone)),
    }
}

fn zone_label(local: &DateTime<Tz>) -> String {
    if local.timezone() == chrono_tz::America::New_York {
        "ET".to_string()
    } else {
        local.format("%Z").to_string()
    }
}

pub fn until_next_midnight(now: DateTime<Utc>, timezone: Tz) -> TimeDelta {
    let local = now.with_timezone(&timezone);
    let Some(next_midnight) = local
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    else {
        return TimeDelta::zero();
    };

    match timezone.from_local_datetime(&next_midnight).earliest() {
        Some(instant) => instant.with_timezone(&Utc) - now,
        // Midnight skipped by a transition; fall back to wall-clock distance.
        None => next_midnight - local.naive_local(),
    }
}

fn format_countdown(remaining: TimeDelta) -> String {
    let total = remaining.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

#[cfg(test)]
#[path = "tests/clock_tests.rs"]
mod tests;
