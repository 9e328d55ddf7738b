//! Per-resource model declarations: collection name plus the allow-listed
//! field set. Built once at startup and shared read-only.

use std::collections::HashMap;
use std::sync::Arc;

/// Declared shape of one resource. `fields` is the full set a resource is
/// willing to filter or project on; anything a client sends outside it is
/// dropped before a query is built. Never mutated after registration.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// Display name, used in messages ("No such User") and detail envelopes.
    pub name: String,
    /// Store collection backing the model.
    pub collection: String,
    /// Ordered allow-list of filterable/projectable fields.
    pub fields: Vec<String>,
}

impl ModelSpec {
    pub fn new(name: &str, collection: &str, fields: &[&str]) -> Self {
        ModelSpec {
            name: name.to_string(),
            collection: collection.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// All registered models, keyed by name. Registration happens at process
/// start; afterwards the registry is shared behind an `Arc` and never changes.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelSpec>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ModelSpec) -> Arc<ModelSpec> {
        let spec = Arc::new(spec);
        self.models.insert(spec.name.clone(), spec.clone());
        spec
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelSpec>> {
        self.models.get(name).cloned()
    }
}
