//! Batch id-to-name resolution for enriching listings that only carry
//! references. One store round-trip per call regardless of how many records
//! point at the same target.

use crate::model::ModelSpec;
use crate::query::matcher::reinterpret_identifiers;
use crate::response::id_key;
use crate::store::{DocumentStore, StoreError};
use bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use std::collections::HashMap;

/// Placeholder for "no reference"; never looked up.
const EMPTY_REF: &str = "-";

/// Join display names onto `records`: the ids held in `id_field` are resolved
/// with one deduplicated any-of query against `model`, and each returned copy
/// carries `name_field` set to the target's `key` value. Placeholder and
/// unresolved ids leave `name_field` absent; every other field passes through
/// untouched.
pub async fn names_from_ids(
    store: &dyn DocumentStore,
    model: &ModelSpec,
    records: &[Document],
    id_field: &str,
    name_field: &str,
    key: &str,
) -> Result<Vec<Document>, StoreError> {
    let mut ids: Vec<String> = Vec::new();
    for record in records {
        if let Some(id) = record.get(id_field).and_then(id_key) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    let names = resolve_names(store, model, &ids, key).await?;

    Ok(records
        .iter()
        .map(|record| {
            let mut out = record.clone();
            let resolved = record
                .get(id_field)
                .and_then(id_key)
                .and_then(|id| names.get(&id));
            if let Some(name) = resolved {
                out.insert(name_field, name.clone());
            }
            out
        })
        .collect())
}

/// Resolve a batch of ids to the display value held in `key` with a single
/// any-of query. Ids are deduplicated and the `'-'` placeholder skipped before
/// the fetch; unknown ids are simply absent from the returned map.
pub async fn resolve_names(
    store: &dyn DocumentStore,
    model: &ModelSpec,
    ids: &[String],
    key: &str,
) -> Result<HashMap<String, String>, StoreError> {
    let mut wanted: Vec<Bson> = Vec::new();
    for id in ids {
        if id.is_empty() || id.as_str() == EMPTY_REF {
            continue;
        }
        let id = Bson::String(id.clone());
        if !wanted.contains(&id) {
            wanted.push(id);
        }
    }
    if wanted.is_empty() {
        return Ok(HashMap::new());
    }
    let wanted = reinterpret_identifiers(wanted);

    let mut options = FindOptions::default();
    let mut projection = Document::new();
    projection.insert(key, 1);
    options.projection = Some(projection);

    let found = store
        .find(
            &model.collection,
            doc! { "_id": { "$in": wanted } },
            options,
        )
        .await?;

    let mut names = HashMap::with_capacity(found.len());
    for obj in &found {
        let id = match obj.get("_id").and_then(id_key) {
            Some(id) => id,
            None => continue,
        };
        if let Some(Bson::String(name)) = obj.get(key) {
            names.insert(id, name.clone());
        }
    }
    Ok(names)
}
