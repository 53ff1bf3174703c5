//! Clock providers and timestamp formatting.

use time::OffsetDateTime;
use time::macros::format_description;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time at the local UTC offset.
///
/// Falls back to UTC when the offset cannot be determined.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|e| {
            log::debug!("Local offset unavailable, using UTC: {}", e);
            OffsetDateTime::now_utc()
        })
    }
}

// `std::time::SystemTime` is unavailable in the browser.
#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        use time::UtcOffset;
        use web_time::{SystemTime, UNIX_EPOCH};

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i128)
            .unwrap_or(0);
        let now =
            OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH);

        // `getTimezoneOffset` is minutes behind UTC.
        let behind = js_sys::Date::new_0().get_timezone_offset() as i32;
        match UtcOffset::from_whole_seconds(-behind * 60) {
            Ok(offset) => now.to_offset(offset),
            Err(_) => now,
        }
    }
}

/// A clock frozen at a given instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Render a timestamp the way an en-US locale would: `3/14/2025, 9:05:07 PM`.
///
/// The timestamp is shown at its own offset.
pub fn format_human(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
    );
    at.format(&format).unwrap_or_else(|e| {
        log::warn!("Failed to format timestamp {}: {}", at, e);
        at.to_string()
    })
}

/// Render a timestamp as a clock time only: `09:05:07 PM`.
pub fn format_time_of_day(at: OffsetDateTime) -> String {
    let format = format_description!("[hour repr:12]:[minute]:[second] [period]");
    at.format(&format).unwrap_or_else(|_| at.time().to_string())
}

/// Milliseconds since the Unix epoch.
pub fn unix_millis(at: OffsetDateTime) -> i128 {
    at.unix_timestamp_nanos() / 1_000_000
}
