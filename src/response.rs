//! Wire envelope types and BSON→JSON rendering.
//!
//! Every operation answers with the same envelope: `status: 1` for success,
//! `status: 2` for a handled failure. Failure envelopes carry `statusCode`
//! (set by the engine itself) or `errorCode` (set by the error mapping); the
//! HTTP status is taken from `errorCode` and the field is dropped from the
//! body, mirroring the response plumbing this starter grew out of.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bson::{Bson, Document};
use serde::Serialize;
use serde_json::{Map, Value};

pub const STATUS_OK: u8 = 1;
pub const STATUS_FAILED: u8 = 2;

#[derive(Debug, Clone, Serialize, Default)]
pub struct Envelope {
    pub status: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Map<String, Value>>,
    /// Extra top-level keys, e.g. the lowercased model name on detail
    /// responses (`{"status": 1, "user": {...}}`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    pub fn list_ok(items: &[Document], total: u64, limit: i64, skip: u64) -> Self {
        Envelope {
            status: STATUS_OK,
            items: Some(items.iter().map(doc_to_json).collect()),
            total: Some(total),
            limit: Some(limit),
            skip: Some(skip),
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>, status_code: u16) -> Self {
        Envelope {
            status: STATUS_FAILED,
            message: Some(message.into()),
            status_code: Some(status_code),
            ..Default::default()
        }
    }

    pub fn detail_ok(key: &str, doc: &Document) -> Self {
        let mut extra = Map::new();
        extra.insert(key.to_string(), doc_to_json(doc));
        Envelope {
            status: STATUS_OK,
            extra,
            ..Default::default()
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(mut self) -> Response {
        let status = self
            .error_code
            .take()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// One autocomplete candidate: `label` is "<field> (<id>)", `value` the id.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchHit {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub status: u8,
    pub result: Vec<SearchHit>,
}

impl IntoResponse for SearchResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Render a BSON value as plain JSON: object ids become their hex form,
/// datetimes RFC 3339 strings. Everything a client sees goes through this so
/// the wire never carries extended-JSON wrappers.
pub fn bson_to_json(b: &Bson) -> Value {
    match b {
        Bson::Null => Value::Null,
        Bson::Boolean(v) => Value::Bool(*v),
        Bson::Int32(n) => Value::Number((*n).into()),
        Bson::Int64(n) => Value::Number((*n).into()),
        Bson::Double(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().to_rfc3339()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => doc_to_json(doc),
        other => serde_json::to_value(other).unwrap_or(Value::Null),
    }
}

pub fn doc_to_json(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(k, v)| (k.clone(), bson_to_json(v)))
            .collect(),
    )
}

/// Canonical string form of an identifier value, used as a lookup key when
/// joining records by id.
pub fn id_key(b: &Bson) -> Option<String> {
    match b {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(n) => Some(n.to_string()),
        Bson::Int64(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::oid::ObjectId;

    #[test]
    fn renders_ids_and_dates_as_plain_strings() {
        let oid = ObjectId::new();
        let d = doc! { "_id": oid, "at": bson::DateTime::from_millis(0), "n": 3 };
        let v = doc_to_json(&d);
        assert_eq!(v["_id"], Value::String(oid.to_hex()));
        assert_eq!(v["at"], Value::String("1970-01-01T00:00:00+00:00".into()));
        assert_eq!(v["n"], Value::Number(3.into()));
    }

    #[test]
    fn failure_envelope_shape() {
        let e = Envelope::failed("Query failed", 400);
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["status"], 2);
        assert_eq!(v["statusCode"], 400);
        assert_eq!(v["message"], "Query failed");
        assert!(v.get("items").is_none());
    }

    #[test]
    fn detail_envelope_uses_flattened_key() {
        let e = Envelope::detail_ok("user", &doc! { "name": "Amy" });
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["status"], 1);
        assert_eq!(v["user"]["name"], "Amy");
    }
}
