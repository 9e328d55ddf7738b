//! Shared application state for all routes. Built once at startup and cloned
//! per request; the store sits behind a trait object so tests can swap in an
//! in-memory implementation.

use crate::handlers::user::UserHandlers;
use crate::model::ModelRegistry;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub registry: Arc<ModelRegistry>,
    pub users: Arc<UserHandlers>,
}
