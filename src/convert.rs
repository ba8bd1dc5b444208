//! Numeric and time conversions applied to raw EXIF values.

use crate::config::TimeZonePolicy;
use crate::error::AppError;
use chrono::{NaiveDateTime, Offset, TimeZone, Timelike};

pub const CAPTURE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

const MICROS_DIGITS: usize = 6;

pub fn rational_to_f64(num: u32, denom: u32) -> Result<f64, AppError> {
    if denom == 0 {
        return Err(AppError::MalformedRational { num, denom });
    }
    Ok(f64::from(num) / f64::from(denom))
}

/// Degrees, minutes and seconds to signed decimal degrees.
///
/// Only `S` and `W` flip the sign; every other reference is read as north/east.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: &str) -> f64 {
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere.trim() {
        "S" | "W" => -decimal,
        _ => decimal,
    }
}

pub fn parse_capture_time(raw: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(raw.trim(), CAPTURE_TIME_FORMAT).map_err(|source| {
        AppError::InvalidTimestamp {
            value: raw.to_string(),
            source,
        }
    })
}

/// Reads a sub-second tag as the digits after a decimal point, returning microseconds.
///
/// `"643"` is 643000µs and `"07"` is 70000µs. Digits past the sixth are dropped.
pub fn parse_sub_second(raw: &str) -> Result<u32, AppError> {
    let digits = raw.trim();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidSubSecond(raw.to_string()));
    }

    let micros = digits
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(MICROS_DIGITS)
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
    Ok(micros)
}

/// Epoch second of `timestamp`, reading the naive time in the given zone.
pub fn epoch_seconds(timestamp: &NaiveDateTime, zone: TimeZonePolicy) -> i64 {
    match zone {
        TimeZonePolicy::Utc => timestamp.and_utc().timestamp(),
        TimeZonePolicy::Local => match chrono::Local.from_local_datetime(timestamp).earliest() {
            Some(local) => local.timestamp(),
            // Inside a DST gap: shift by the offset in force at that instant.
            None => {
                let offset = chrono::Local.offset_from_utc_datetime(timestamp).fix();
                timestamp.and_utc().timestamp() - i64::from(offset.local_minus_utc())
            }
        },
    }
}

/// Epoch second and millisecond written side by side.
///
/// `1531241239` and 643ms give `1531241239643`.
pub fn concat_epoch_millis(seconds: i64, micros: u32) -> String {
    let mut seconds = seconds;
    let mut millis = (f64::from(micros) / 1000.0).round() as u32;
    if millis >= 1000 {
        seconds += i64::from(millis / 1000);
        millis %= 1000;
    }
    format!("{}{:03}", seconds, millis)
}

pub fn encode_exif_time(timestamp: &NaiveDateTime, zone: TimeZonePolicy) -> String {
    let micros = timestamp.nanosecond() / 1000;
    concat_epoch_millis(epoch_seconds(timestamp, zone), micros)
}

/// Shortest decimal that reads back to the same value, always with a fractional part.
pub fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}
