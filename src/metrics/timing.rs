//! Clock conversions between the browser's millisecond timeline and span timestamps.
//!
//! Performance entries report milliseconds relative to the navigation time origin. Spans and
//! transactions use seconds since the Unix epoch, so every entry timestamp becomes
//! `time_origin_seconds + ms_to_sec(relative_ms)`.

use chrono::Utc;

/// Converts milliseconds to seconds.
pub fn ms_to_sec(time: f64) -> f64 {
    time / 1000.0
}

/// Absolute epoch seconds for a timestamp measured relative to the time origin.
pub fn origin_relative(time_origin: f64, relative_ms: f64) -> f64 {
    time_origin + ms_to_sec(relative_ms)
}

/// Wall-clock time as epoch seconds.
pub fn timestamp_in_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
