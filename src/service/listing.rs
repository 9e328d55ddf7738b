//! The listing engine: a bounded, projected, sorted find plus an independent
//! count over the same clause, and the handler factories that bind
//! per-resource configuration to it.
//!
//! Untrusted filter parameters flow through the allow-list matcher and the
//! match builder, time-range bounds are merged onto the configured time key,
//! and the combined clause is shifted in reverse into the store's native time
//! basis before execution.

use crate::error::AppError;
use crate::model::ModelSpec;
use crate::query::matcher::{
    is_identifier_candidate, match_for_listing, matching_paths, reinterpret_identifiers,
};
use crate::query::pagination::{sort_doc, PageData, PageParams, SortOrder};
use crate::query::timezone::{change_timezone, DEFAULT_TZ_OFFSET};
use crate::response::{bson_to_json, id_key, Envelope, SearchHit, SearchResponse, STATUS_OK};
use crate::store::DocumentStore;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use mongodb::options::{FindOneOptions, FindOptions};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Limit applied by the executor when the caller bypasses the normalizer.
const EXECUTOR_DEFAULT_LIMIT: i64 = 500;
/// Autocomplete results are always capped.
const SEARCH_CAP: i64 = 20;

/// Raw request data for a listing call. `filters` may be a JSON object or a
/// JSON-encoded string; `fields` a single name or a sequence of names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRequest {
    pub filters: Option<Value>,
    pub fields: Option<Value>,
    #[serde(flatten)]
    pub page: PageData,
}

/// Full input set of [`paginated_list`]. Handler factories fill this from a
/// [`ListRequest`]; direct callers can build it by hand.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub filters: Option<Value>,
    /// Projection: the fields the store is asked to return.
    pub required_fields: Vec<String>,
    /// Field the fromDate/toDate bounds apply to, if any.
    pub time_key: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    /// Clause ANDed into every query regardless of client filters.
    pub custom_match: Document,
    pub limit: Option<i64>,
    pub skip: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    /// Offset between the caller's local day and the store's time basis.
    pub tz_offset: String,
    /// Escape hatch: explicit driver options win over the computed ones.
    pub options: FindOptions,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            filters: None,
            required_fields: Vec::new(),
            time_key: None,
            from_date: None,
            to_date: None,
            custom_match: Document::new(),
            limit: None,
            skip: None,
            sort_by: None,
            sort_order: SortOrder::Desc,
            tz_offset: DEFAULT_TZ_OFFSET.to_string(),
            options: FindOptions::default(),
        }
    }
}

/// Run a bounded, projected, sorted find plus an independent count and wrap
/// the outcome in a result envelope. Store faults never propagate: they are
/// logged and surfaced as a generic `status: 2` failure.
pub async fn paginated_list(
    store: &dyn DocumentStore,
    model: &ModelSpec,
    q: ListQuery,
) -> Envelope {
    let filter = match parse_filters(q.filters.as_ref()) {
        Ok(filter) => strip_empty_values(filter),
        Err(()) => return Envelope::failed("Query failed, invalid JSON in filters", 400),
    };

    let paths = matching_paths(&filter, model);
    let mut clause = match_for_listing(&paths, &filter);

    if let Some(time_key) = &q.time_key {
        if q.from_date.is_some() || q.to_date.is_some() {
            // merge additively with any bound already on the time key
            let mut bounds = match clause.remove(time_key) {
                Some(Bson::Document(d)) => d,
                _ => Document::new(),
            };
            if let Some(from) = q.from_date {
                bounds.insert("$gte", Bson::DateTime(bson::DateTime::from_chrono(from)));
            }
            if let Some(to) = q.to_date {
                bounds.insert("$lte", Bson::DateTime(bson::DateTime::from_chrono(to)));
            }
            clause.insert(time_key.as_str(), bounds);
        }
    }

    let combined = doc! { "$and": [clause, q.custom_match.clone()] };
    // caller-local date literals -> store-native basis
    let shifted = match change_timezone(&Bson::Document(combined), &q.tz_offset, true) {
        Bson::Document(d) => d,
        _ => Document::new(),
    };

    let limit = q.limit.unwrap_or(EXECUTOR_DEFAULT_LIMIT);
    let skip = q.skip.unwrap_or(0);
    let mut projection = Document::new();
    for field in &q.required_fields {
        projection.insert(field.as_str(), 1);
    }
    let mut options = q.options.clone();
    options.limit = options.limit.or(Some(limit));
    options.skip = options.skip.or(Some(skip));
    options.sort = options
        .sort
        .or_else(|| Some(sort_doc(q.sort_by.as_deref(), q.sort_order)));
    options.projection = options.projection.or(Some(projection));

    let items = match store.find(&model.collection, shifted.clone(), options).await {
        Ok(items) => items,
        Err(e) => {
            tracing::debug!(error = %e, model = %model.name, "list query failed");
            return Envelope::failed("Query failed", 400);
        }
    };
    // fetch and count are not transactionally consistent; small skew under
    // concurrent writes is accepted
    let total = match store.count_documents(&model.collection, shifted).await {
        Ok(total) => total,
        Err(e) => {
            tracing::debug!(error = %e, model = %model.name, "count query failed");
            return Envelope::failed("Query failed", 400);
        }
    };

    Envelope::list_ok(&items, total, limit, skip)
}

/// Paginated, filterable listing bound to one model and its allowed fields.
#[derive(Debug, Clone)]
pub struct ListingHandler {
    model: Arc<ModelSpec>,
    allowed_fields: Vec<String>,
    time_key: String,
    custom_match: Document,
    tz_offset: String,
    options: FindOptions,
}

impl ListingHandler {
    pub fn new(model: Arc<ModelSpec>, allowed_fields: &[&str]) -> Self {
        ListingHandler {
            model,
            allowed_fields: allowed_fields.iter().map(|f| f.to_string()).collect(),
            time_key: "createdAt".to_string(),
            custom_match: Document::new(),
            tz_offset: DEFAULT_TZ_OFFSET.to_string(),
            options: FindOptions::default(),
        }
    }

    pub fn time_key(mut self, key: &str) -> Self {
        self.time_key = key.to_string();
        self
    }

    pub fn custom_match(mut self, clause: Document) -> Self {
        self.custom_match = clause;
        self
    }

    pub fn tz_offset(mut self, tz: &str) -> Self {
        self.tz_offset = tz.to_string();
        self
    }

    pub fn options(mut self, options: FindOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn execute(&self, store: &dyn DocumentStore, data: &ListRequest) -> Envelope {
        let requested = string_list(data.fields.as_ref());
        let mut required: Vec<String> = self
            .allowed_fields
            .iter()
            .filter(|f| requested.iter().any(|r| r == *f))
            .cloned()
            .collect();
        if required.is_empty() {
            required = self.allowed_fields.clone();
        }
        let page = PageParams::from_data(&data.page, false);
        paginated_list(
            store,
            &self.model,
            ListQuery {
                filters: data.filters.clone(),
                required_fields: required,
                time_key: Some(self.time_key.clone()),
                from_date: page.from_date,
                to_date: page.to_date,
                custom_match: self.custom_match.clone(),
                limit: Some(page.limit),
                skip: Some(page.skip),
                sort_by: page.sort_by,
                sort_order: page.sort_order,
                tz_offset: self.tz_offset.clone(),
                options: self.options.clone(),
            },
        )
        .await
    }
}

/// Raw request data for an autocomplete search: an explicit id list wins over
/// a phrase; extra `filters` merge into the fixed custom clause.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub phrase: Option<String>,
    pub ids: Option<Value>,
    pub filters: Option<Value>,
}

/// Autocomplete search bound to one model and a display field.
#[derive(Debug, Clone)]
pub struct SearchHandler {
    model: Arc<ModelSpec>,
    id_query: bool,
    custom_match: Document,
    key: String,
}

impl SearchHandler {
    pub fn new(model: Arc<ModelSpec>) -> Self {
        SearchHandler {
            model,
            id_query: false,
            custom_match: Document::new(),
            key: "name".to_string(),
        }
    }

    /// Also match `_id` exactly when the phrase itself looks like an id.
    pub fn id_query(mut self, enabled: bool) -> Self {
        self.id_query = enabled;
        self
    }

    pub fn custom_match(mut self, clause: Document) -> Self {
        self.custom_match = clause;
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub async fn execute(
        &self,
        store: &dyn DocumentStore,
        data: &SearchRequest,
    ) -> Result<SearchResponse, AppError> {
        let mut custom = self.custom_match.clone();
        if let Some(filters) = &data.filters {
            let parsed = parse_filters(Some(filters))
                .map_err(|()| AppError::BadRequest("Please send valid JSON".to_string()))?;
            for (k, v) in parsed {
                custom.insert(k, bson::to_bson(&v).unwrap_or(Bson::Null));
            }
        }

        let clause = match &data.ids {
            Some(ids) => id_match(ids),
            None => phrase_search(data.phrase.as_deref().unwrap_or(""), self.id_query, &self.key),
        };

        let mut options = FindOptions::default();
        options.limit = Some(SEARCH_CAP);
        let mut projection = Document::new();
        projection.insert(self.key.as_str(), 1);
        options.projection = Some(projection);

        let objects = store
            .find(&self.model.collection, doc! { "$and": [clause, custom] }, options)
            .await?;

        let result = objects
            .iter()
            .map(|obj| {
                let value = obj.get("_id").and_then(id_key).unwrap_or_default();
                let label = display_string(obj.get(&self.key));
                SearchHit {
                    label: format!("{} ({})", label, value),
                    value,
                }
            })
            .collect();
        Ok(SearchResponse {
            status: STATUS_OK,
            result,
        })
    }
}

/// Single-record lookup bound to one model, with an optional projection.
#[derive(Debug, Clone)]
pub struct DetailHandler {
    model: Arc<ModelSpec>,
    required_fields: Vec<String>,
    options: FindOneOptions,
}

impl DetailHandler {
    pub fn new(model: Arc<ModelSpec>) -> Self {
        DetailHandler {
            model,
            required_fields: Vec::new(),
            options: FindOneOptions::default(),
        }
    }

    pub fn required_fields(mut self, fields: &[&str]) -> Self {
        self.required_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn options(mut self, options: FindOneOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn execute(&self, store: &dyn DocumentStore, id: &str) -> Envelope {
        let id_value = if is_identifier_candidate(id) {
            ObjectId::parse_str(id)
                .map(Bson::ObjectId)
                .unwrap_or_else(|_| Bson::String(id.to_string()))
        } else {
            Bson::String(id.to_string())
        };
        let mut options = self.options.clone();
        if !self.required_fields.is_empty() && options.projection.is_none() {
            let mut projection = Document::new();
            for field in &self.required_fields {
                projection.insert(field.as_str(), 1);
            }
            options.projection = Some(projection);
        }
        // malformed ids and store faults both land on the not-found path
        let found = match store
            .find_one(&self.model.collection, doc! { "_id": id_value }, options)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(error = %e, model = %self.model.name, "detail lookup failed");
                None
            }
        };
        match found {
            Some(doc) => Envelope::detail_ok(&self.model.name.to_lowercase(), &doc),
            None => Envelope::failed(format!("No such {}", self.model.name), 404),
        }
    }
}

/// Case-insensitive prefix match on `key`, optionally ORed with an exact
/// `_id` match when the phrase is itself an identifier candidate. An empty
/// phrase matches everything (the result cap still applies).
fn phrase_search(phrase: &str, id_query: bool, key: &str) -> Document {
    if phrase.is_empty() {
        return Document::new();
    }
    let pattern = format!("^{}", regex::escape(phrase));
    let mut prefix = Document::new();
    prefix.insert(key, doc! { "$regex": pattern, "$options": "i" });
    if id_query && is_identifier_candidate(phrase) {
        if let Ok(oid) = ObjectId::parse_str(phrase) {
            return doc! { "$or": [prefix, { "_id": oid }] };
        }
    }
    prefix
}

/// Any-of match over an explicit id list; a single string splits on commas.
fn id_match(ids: &Value) -> Document {
    let list: Vec<Bson> = match ids {
        Value::String(s) => s.split(',').map(|p| Bson::String(p.to_string())).collect(),
        Value::Array(items) => items
            .iter()
            .map(|v| bson::to_bson(v).unwrap_or(Bson::Null))
            .collect(),
        other => vec![bson::to_bson(other).unwrap_or(Bson::Null)],
    };
    let list = reinterpret_identifiers(list);
    doc! { "_id": { "$in": list } }
}

/// Accept filters as an already-parsed object or a JSON-encoded string.
/// A string that fails to parse is the one caller error this layer reports;
/// any other shape degrades to "no filters".
fn parse_filters(filters: Option<&Value>) -> Result<Map<String, Value>, ()> {
    match filters {
        None => Ok(Map::new()),
        Some(Value::Object(m)) => Ok(m.clone()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(m)) => Ok(m),
            Ok(_) => Ok(Map::new()),
            Err(_) => Err(()),
        },
        Some(_) => Ok(Map::new()),
    }
}

/// Drop empty leaf values (null, "", [], {}) so they never become clauses.
fn strip_empty_values(mut filter: Map<String, Value>) -> Map<String, Value> {
    filter.retain(|_, v| {
        !(v.is_null()
            || matches!(v, Value::String(s) if s.is_empty())
            || matches!(v, Value::Array(a) if a.is_empty())
            || matches!(v, Value::Object(o) if o.is_empty()))
    });
    filter
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| i.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn display_string(b: Option<&Bson>) -> String {
    match b {
        Some(Bson::String(s)) => s.clone(),
        Some(other) => bson_to_json(other).to_string(),
        None => String::new(),
    }
}
