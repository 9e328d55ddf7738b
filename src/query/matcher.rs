//! Projects untrusted filter keys onto a model's declared field set and turns
//! the survivors into a store match clause.

use crate::model::ModelSpec;
use bson::{doc, oid::ObjectId, Bson, Document};
use serde_json::{Map, Value};

/// Keys consumed by the time-range logic, never by the generic matcher.
const RESERVED_KEYS: [&str; 2] = ["fromDate", "toDate"];

/// Lexical check for a store-native document id: 24 hex characters.
pub fn is_identifier_candidate(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The subset of filter keys that the model actually declares, sorted so the
/// clause shape is stable regardless of the order the client sent them in.
/// Keys the model does not know are dropped here and never reach the store.
pub fn matching_paths(filter: &Map<String, Value>, model: &ModelSpec) -> Vec<String> {
    let mut paths: Vec<String> = filter
        .keys()
        .filter(|k| !RESERVED_KEYS.contains(&k.as_str()) && model.has_field(k))
        .cloned()
        .collect();
    paths.sort();
    paths
}

/// Reinterpret a value sequence as ObjectIds, gated on the first element
/// looking like one. Conversion is all-or-nothing: if any element fails to
/// parse the raw values are kept untouched, never a partial mix.
pub fn reinterpret_identifiers(values: Vec<Bson>) -> Vec<Bson> {
    let plausible =
        matches!(values.first(), Some(Bson::String(s)) if is_identifier_candidate(s));
    if !plausible {
        return values;
    }
    let mut converted = Vec::with_capacity(values.len());
    for v in &values {
        match v {
            Bson::String(s) => match ObjectId::parse_str(s) {
                Ok(oid) => converted.push(Bson::ObjectId(oid)),
                Err(_) => return values,
            },
            _ => return values,
        }
    }
    converted
}

/// Build the match clause for the allow-listed paths. A scalar filter value
/// becomes an equality condition; a sequence of two or more becomes `$in`.
/// The single-element case stays a plain equality (not a one-element `$in`)
/// so the store can use equality indexes.
pub fn match_for_listing(paths: &[String], filter: &Map<String, Value>) -> Document {
    let mut clause = Document::new();
    for path in paths {
        let Some(raw) = filter.get(path) else { continue };
        let seq: Vec<Value> = match raw {
            Value::Array(items) => items.clone(),
            scalar => vec![scalar.clone()],
        };
        let values: Vec<Bson> = seq
            .iter()
            .map(|v| bson::to_bson(v).unwrap_or(Bson::Null))
            .collect();
        let mut values = reinterpret_identifiers(values);
        match values.len() {
            0 => {}
            1 => {
                clause.insert(path.as_str(), values.remove(0));
            }
            _ => {
                clause.insert(path.as_str(), doc! { "$in": values });
            }
        }
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> ModelSpec {
        ModelSpec::new("Team", "teams", &["team", "name", "status", "ownerId", "createdAt"])
    }

    fn filter(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn unknown_keys_never_survive() {
        let f = filter(json!({ "team": "eng", "$where": "1", "secret": "x", "name": "a" }));
        let paths = matching_paths(&f, &model());
        assert_eq!(paths, vec!["name", "team"]);
        let clause = match_for_listing(&paths, &f);
        for key in clause.keys() {
            assert!(model().has_field(key));
        }
    }

    #[test]
    fn path_order_is_stable_regardless_of_client_key_order() {
        let a = filter(json!({ "team": "eng", "name": "a" }));
        let b = filter(json!({ "name": "a", "team": "eng" }));
        assert_eq!(matching_paths(&a, &model()), matching_paths(&b, &model()));
        assert_eq!(matching_paths(&a, &model()), vec!["name", "team"]);
    }

    #[test]
    fn reserved_date_keys_are_skipped() {
        let f = filter(json!({ "fromDate": "2024-01-01", "toDate": "2024-01-02", "team": "eng" }));
        assert_eq!(matching_paths(&f, &model()), vec!["team"]);
    }

    #[test]
    fn single_value_is_equality_multi_is_any_of() {
        let f = filter(json!({ "status": "A" }));
        let clause = match_for_listing(&matching_paths(&f, &model()), &f);
        assert_eq!(clause, doc! { "status": "A" });

        let f = filter(json!({ "status": ["A", "B"] }));
        let clause = match_for_listing(&matching_paths(&f, &model()), &f);
        assert_eq!(clause, doc! { "status": { "$in": ["A", "B"] } });
    }

    #[test]
    fn identifier_candidates_convert_when_first_element_is_plausible() {
        let id = "5f1d7f4b8e4a2c0012345678";
        let f = filter(json!({ "ownerId": [id, id] }));
        let clause = match_for_listing(&matching_paths(&f, &model()), &f);
        let arr = clause.get_document("ownerId").unwrap().get_array("$in").unwrap();
        assert!(matches!(arr[0], Bson::ObjectId(_)));
        assert!(matches!(arr[1], Bson::ObjectId(_)));
    }

    #[test]
    fn conversion_is_all_or_nothing() {
        let id = "5f1d7f4b8e4a2c0012345678";
        let f = filter(json!({ "ownerId": [id, "not-an-id"] }));
        let clause = match_for_listing(&matching_paths(&f, &model()), &f);
        let arr = clause.get_document("ownerId").unwrap().get_array("$in").unwrap();
        assert_eq!(arr[0], Bson::String(id.into()));
        assert_eq!(arr[1], Bson::String("not-an-id".into()));
    }

    #[test]
    fn non_plausible_first_element_skips_conversion() {
        let id = "5f1d7f4b8e4a2c0012345678";
        let f = filter(json!({ "ownerId": ["plain", id] }));
        let clause = match_for_listing(&matching_paths(&f, &model()), &f);
        let arr = clause.get_document("ownerId").unwrap().get_array("$in").unwrap();
        assert_eq!(arr[1], Bson::String(id.into()));
    }

    #[test]
    fn identifier_lexing() {
        assert!(is_identifier_candidate("5f1d7f4b8e4a2c0012345678"));
        assert!(is_identifier_candidate("5F1D7F4B8E4A2C0012345678"));
        assert!(!is_identifier_candidate("5f1d7f4b8e4a2c001234567"));
        assert!(!is_identifier_candidate("zf1d7f4b8e4a2c0012345678"));
    }
}
