//! In-memory `DocumentStore` used by the integration tests. Evaluates the
//! small filter dialect the engine emits ($and, $or, $in, $gte, $lte, $regex
//! with the `i` option, and plain equality) and honors sort, skip, limit, and
//! include-projections.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use mongodb::options::{FindOneOptions, FindOptions};
use starter_sdk::{DocumentStore, StoreError};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    find_filters: Mutex<Vec<Document>>,
    pub find_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, collection: &str, docs: Vec<Document>) {
        let mut map = self.collections.lock().unwrap();
        let entry = map.entry(collection.to_string()).or_default();
        for mut doc in docs {
            if !doc.contains_key("_id") {
                doc.insert("_id", ObjectId::new());
            }
            entry.push(doc);
        }
    }

    pub fn find_count(&self) -> usize {
        self.find_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn last_find_filter(&self) -> Option<Document> {
        self.find_filters.lock().unwrap().last().cloned()
    }

    fn matching(&self, collection: &str, filter: &Document) -> Vec<Document> {
        let map = self.collections.lock().unwrap();
        map.get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches_filter(d, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.find_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.find_filters.lock().unwrap().push(filter.clone());
        let mut docs = self.matching(collection, &filter);
        if let Some(sort) = &options.sort {
            if let Some((key, dir)) = sort.iter().next() {
                let descending = matches!(dir, Bson::Int32(n) if *n < 0)
                    || matches!(dir, Bson::Int64(n) if *n < 0);
                docs.sort_by(|a, b| {
                    let ord = compare(a.get(key), b.get(key));
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
            }
        }
        let skip = options.skip.unwrap_or(0) as usize;
        let mut docs: Vec<Document> = docs.into_iter().skip(skip).collect();
        if let Some(limit) = options.limit {
            docs.truncate(limit.max(0) as usize);
        }
        if let Some(projection) = &options.projection {
            docs = docs.iter().map(|d| project(d, projection)).collect();
        }
        Ok(docs)
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<u64, StoreError> {
        Ok(self.matching(collection, &filter).len() as u64)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: FindOneOptions,
    ) -> Result<Option<Document>, StoreError> {
        let docs = self.matching(collection, &filter);
        Ok(docs.first().map(|d| match &options.projection {
            Some(projection) => project(d, projection),
            None => d.clone(),
        }))
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> Result<Bson, StoreError> {
        if !doc.contains_key("_id") {
            doc.insert("_id", ObjectId::new());
        }
        let id = doc.get("_id").cloned().unwrap_or(Bson::Null);
        let mut map = self.collections.lock().unwrap();
        map.entry(collection.to_string()).or_default().push(doc);
        Ok(id)
    }
}

fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, cond)| match key.as_str() {
        "$and" => match cond {
            Bson::Array(clauses) => clauses.iter().all(|c| match c {
                Bson::Document(c) => matches_filter(doc, c),
                _ => false,
            }),
            _ => false,
        },
        "$or" => match cond {
            Bson::Array(clauses) => clauses.iter().any(|c| match c {
                Bson::Document(c) => matches_filter(doc, c),
                _ => false,
            }),
            _ => false,
        },
        field => matches_condition(doc.get(field), cond),
    })
}

fn matches_condition(value: Option<&Bson>, cond: &Bson) -> bool {
    match cond {
        Bson::Document(ops) if ops.keys().any(|k| k.starts_with('$')) => {
            ops.iter().all(|(op, operand)| match op.as_str() {
                "$in" => match operand {
                    Bson::Array(candidates) => {
                        value.map(|v| candidates.contains(v)).unwrap_or(false)
                    }
                    _ => false,
                },
                "$gte" => value
                    .map(|v| compare(Some(v), Some(operand)) != Ordering::Less)
                    .unwrap_or(false),
                "$lte" => value
                    .map(|v| compare(Some(v), Some(operand)) != Ordering::Greater)
                    .unwrap_or(false),
                "$regex" => {
                    let pattern = match operand {
                        Bson::String(p) => p.clone(),
                        _ => return false,
                    };
                    let insensitive = matches!(
                        ops.get("$options"),
                        Some(Bson::String(o)) if o.contains('i')
                    );
                    let pattern = if insensitive {
                        format!("(?i){pattern}")
                    } else {
                        pattern
                    };
                    match (value, regex::Regex::new(&pattern)) {
                        (Some(Bson::String(s)), Ok(re)) => re.is_match(s),
                        _ => false,
                    }
                }
                "$options" => true,
                _ => false,
            })
        }
        other => value.map(|v| v == other).unwrap_or(false),
    }
}

fn compare(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (Some(Bson::DateTime(x)), Some(Bson::DateTime(y))) => {
            x.timestamp_millis().cmp(&y.timestamp_millis())
        }
        (Some(Bson::Int32(x)), Some(Bson::Int32(y))) => x.cmp(y),
        (Some(Bson::Int64(x)), Some(Bson::Int64(y))) => x.cmp(y),
        (Some(Bson::Int32(x)), Some(Bson::Int64(y))) => (*x as i64).cmp(y),
        (Some(Bson::Int64(x)), Some(Bson::Int32(y))) => x.cmp(&(*y as i64)),
        (Some(Bson::Double(x)), Some(Bson::Double(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Include-projection: listed keys plus `_id`.
fn project(doc: &Document, projection: &Document) -> Document {
    if projection.is_empty() {
        return doc.clone();
    }
    let mut out = Document::new();
    if let Some(id) = doc.get("_id") {
        out.insert("_id", id.clone());
    }
    for key in projection.keys() {
        if let Some(v) = doc.get(key) {
            out.insert(key.as_str(), v.clone());
        }
    }
    out
}
