//! Session clock.
//!
//! Every timestamp the core records (session bounds, telemetry points) comes
//! from this one UTC millisecond clock so all artifacts share a time base.

use chrono::Utc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current UTC time as Unix milliseconds.
pub fn now_utc_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a filesystem timestamp to Unix milliseconds, 0 when unavailable.
pub fn system_time_ms(time: Option<SystemTime>) -> i64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
