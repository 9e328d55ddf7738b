//! Coerces raw client pagination parameters into safe, bounded values.

use bson::{doc, Document};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Hard cap applied to `limit` unless the exported escape flag is set.
pub const LIMIT_CAP: i64 = 500;
/// Limit used when the caller sends nothing (or garbage).
pub const DEFAULT_LIMIT: i64 = 100;

/// Raw pagination fields exactly as the client sent them: query-string values
/// arrive as strings, JSON bodies may carry numbers, and anything may be
/// missing or malformed. Nothing here is trusted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageData {
    pub limit: Option<Value>,
    pub skip: Option<Value>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub from_date: Option<Value>,
    pub to_date: Option<Value>,
    /// Escape flag for export jobs that genuinely need more than the cap.
    pub exported: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_int(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// Normalized pagination: every field is bounded and typed. Built once per
/// request and handed to the list executor.
#[derive(Debug, Clone, PartialEq)]
pub struct PageParams {
    pub limit: i64,
    pub skip: u64,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

impl PageParams {
    /// Normalize raw pagination data. Malformed numeric input degrades to the
    /// defaults instead of failing the request. With `force_dates` (or when
    /// the caller supplied the corresponding raw value), `from_date` resolves
    /// to UTC midnight of the given/current day and `to_date` to UTC midnight
    /// of the day after the given/current instant, so the window covers
    /// "today" inclusively with an exclusive next-midnight upper bound.
    pub fn from_data(data: &PageData, force_dates: bool) -> Self {
        let skip = int_or(data.skip.as_ref(), 0).max(0) as u64;
        let mut limit = int_or(data.limit.as_ref(), DEFAULT_LIMIT).max(0);
        if !truthy(data.exported.as_ref()) && limit > LIMIT_CAP {
            limit = LIMIT_CAP;
        }
        let now = Utc::now();
        let from_date = (force_dates || data.from_date.is_some())
            .then(|| midnight_utc(instant_or(data.from_date.as_ref(), now)));
        let to_date = (force_dates || data.to_date.is_some())
            .then(|| midnight_utc(instant_or(data.to_date.as_ref(), now) + Duration::hours(24)));
        PageParams {
            limit,
            skip,
            sort_by: data.sort_by.clone(),
            sort_order: SortOrder::from_raw(data.sort_order.as_deref()),
            from_date,
            to_date,
        }
    }
}

/// Sort document for the store: requested field or `createdAt`, descending by
/// default.
pub fn sort_doc(sort_by: Option<&str>, order: SortOrder) -> Document {
    doc! { sort_by.unwrap_or("createdAt"): order.as_int() }
}

/// Lenient instant parsing: epoch millis (number or numeric string), RFC 3339,
/// or a bare `YYYY-MM-DD` date.
pub fn parse_instant(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| d.with_timezone(&Utc))
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
                })
                .or_else(|| {
                    s.parse::<i64>()
                        .ok()
                        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                })
        }
        _ => None,
    }
}

fn instant_or(v: Option<&Value>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    v.and_then(parse_instant).unwrap_or(fallback)
}

fn midnight_utc(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn int_or(v: Option<&Value>, default: i64) -> i64 {
    v.and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
    .unwrap_or(default)
}

fn truthy(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty() && s != "false" && s != "0",
        _ => false,
    }
}
