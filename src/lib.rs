//! Starter SDK: configuration-driven REST backend library with a generic
//! dynamic-query listing engine over a document store.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use auth::AuthUser;
pub use config::Config;
pub use error::{AppError, ConfigError};
pub use model::{ModelRegistry, ModelSpec};
pub use response::{Envelope, SearchHit, SearchResponse};
pub use routes::router;
pub use service::{
    names_from_ids, paginated_list, resolve_names, DetailHandler, ListQuery, ListRequest,
    ListingHandler, SearchHandler, SearchRequest,
};
pub use state::AppState;
pub use store::{DocumentStore, MongoStore, StoreError};
