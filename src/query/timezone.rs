//! Shifts every date leaf of a BSON tree by a fixed utc-offset.
//!
//! The store keeps day boundaries in one timezone while callers express
//! filters in their local day. Shifting the filter clause in reverse before it
//! reaches the store lines the two up; the forward direction turns stored
//! instants back into local ones for display.

use bson::Bson;

/// Offset applied when a caller does not specify one.
pub const DEFAULT_TZ_OFFSET: &str = "+05:30";

/// Parse a `±HH:MM` offset label into signed minutes. `"+05:30"` → 330.
pub fn offset_minutes(tz: &str) -> Option<i64> {
    let sign = match tz.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i64 = tz.get(1..3)?.parse().ok()?;
    let minutes: i64 = tz.get(4..6)?.parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

/// Deep-copy `data`, shifting every datetime leaf by the `±HH:MM` offset,
/// negated when `reverse` is set. A malformed offset label returns the input
/// unchanged rather than failing the request.
pub fn change_timezone(data: &Bson, tz: &str, reverse: bool) -> Bson {
    match offset_minutes(tz) {
        Some(minutes) => shift_by_minutes(data, if reverse { -minutes } else { minutes }),
        None => data.clone(),
    }
}

/// Same as [`change_timezone`] with the offset given directly in minutes.
pub fn change_timezone_minutes(data: &Bson, minutes: i64, reverse: bool) -> Bson {
    shift_by_minutes(data, if reverse { -minutes } else { minutes })
}

/// Recursive worker: datetime leaves move by `minutes`, documents and arrays
/// are traversed, everything else is copied as-is.
pub fn shift_by_minutes(data: &Bson, minutes: i64) -> Bson {
    match data {
        Bson::DateTime(dt) => {
            Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis() + minutes * 60_000))
        }
        Bson::Document(doc) => {
            let mut out = bson::Document::new();
            for (k, v) in doc {
                out.insert(k.clone(), shift_by_minutes(v, minutes));
            }
            Bson::Document(out)
        }
        Bson::Array(items) => {
            Bson::Array(items.iter().map(|v| shift_by_minutes(v, minutes)).collect())
        }
        other => other.clone(),
    }
}
