//! Conversions between UTC and Beijing time (Asia/Shanghai).
//!
//! Asia/Shanghai has had a fixed UTC+8 offset without daylight saving since
//! 1991, so a `FixedOffset` is sufficient for every timestamp this bot sees.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeDelta, Utc};

use crate::error::AppError;

/// Format accepted for the user-supplied reference time.
pub const REFERENCE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

/// The Asia/Shanghai offset (UTC+8).
pub fn beijing_offset() -> FixedOffset {
    FixedOffset::east_opt(BEIJING_OFFSET_SECS).unwrap_or(Utc.fix())
}

/// Parse a `YYYY-MM-DD HH:MM:SS` wall-clock time in Beijing time and convert it to UTC.
pub fn parse_reference_time(input: &str) -> Result<DateTime<Utc>, AppError> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), REFERENCE_TIME_FORMAT).map_err(
        |source| AppError::InvalidReferenceTime {
            input: input.to_string(),
            source,
        },
    )?;
    beijing_from_naive(naive).ok_or_else(|| AppError::ReferenceTimeOutOfRange(input.to_string()))
}

/// Interpret a naive timestamp as Beijing local time and return it in UTC.
///
/// `None` when the shift leaves chrono's representable range.
pub fn beijing_from_naive(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    // A fixed offset never yields an ambiguous or skipped local time.
    naive
        .checked_sub_signed(TimeDelta::seconds(BEIJING_OFFSET_SECS as i64))
        .map(|utc| utc.and_utc())
}

/// Interpret a naive timestamp as already being in UTC.
pub fn utc_from_naive(naive: NaiveDateTime) -> DateTime<Utc> {
    naive.and_utc()
}

/// Render a UTC timestamp in Beijing time, e.g. `2024-12-22 19:19:22 CST`.
pub fn format_beijing(time: DateTime<Utc>) -> String {
    format!(
        "{} CST",
        time.with_timezone(&beijing_offset())
            .format(REFERENCE_TIME_FORMAT)
    )
}
