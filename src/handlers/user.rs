//! User resource: registration plus the listing, autocomplete, and detail
//! operations wired through the generic handler factories.

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::model::ModelSpec;
use crate::response::{Envelope, SearchResponse, STATUS_OK};
use crate::service::{DetailHandler, ListRequest, ListingHandler, SearchHandler, SearchRequest};
use crate::state::AppState;
use crate::store::StoreError;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use axum::extract::{Path, Query, State};
use axum::Json;
use bson::doc;
use mongodb::options::FindOneOptions;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// The user model's handler bundle, configured once at startup. The listing
/// allow-list comes from the registered model, which deliberately leaves out
/// `password` and `apiKey`.
pub struct UserHandlers {
    pub model: Arc<ModelSpec>,
    pub listing: ListingHandler,
    pub search: SearchHandler,
    pub detail: DetailHandler,
}

impl UserHandlers {
    pub fn new(model: Arc<ModelSpec>, tz_offset: &str) -> Self {
        let fields = model.fields.clone();
        let allowed: Vec<&str> = fields.iter().map(String::as_str).collect();
        UserHandlers {
            listing: ListingHandler::new(model.clone(), &allowed).tz_offset(tz_offset),
            search: SearchHandler::new(model.clone()).id_query(true),
            detail: DetailHandler::new(model.clone()).required_fields(&allowed),
            model,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// POST /api/user/register. Stores an argon2 hash of the password and hands
/// back a fresh api key; the key is shown only in this response.
pub async fn register(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Envelope, AppError> {
    let name = trimmed(&body.name)
        .ok_or_else(|| AppError::Validation("name is required".to_string()))?;
    let email = trimmed(&body.email)
        .ok_or_else(|| AppError::Validation("email is required".to_string()))?;
    let password = body
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("password is required".to_string()))?;

    let existing = state
        .store
        .find_one("users", doc! { "email": email }, FindOneOptions::default())
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::Other(format!("password hash: {e}")))?
        .to_string();
    let api_key = Uuid::new_v4().to_string();

    state
        .store
        .insert_one(
            "users",
            doc! {
                "name": name,
                "email": email,
                "password": hash,
                "apiKey": &api_key,
                "createdAt": bson::DateTime::now(),
            },
        )
        .await?;
    tracing::info!(email, "user registered");

    let mut extra = Map::new();
    extra.insert("apiKey".to_string(), Value::String(api_key));
    Ok(Envelope {
        status: STATUS_OK,
        message: Some("User registered successfully".to_string()),
        extra,
        ..Default::default()
    })
}

/// GET /api/user/list.
pub async fn list(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(data): Query<ListRequest>,
) -> Envelope {
    state.users.listing.execute(state.store.as_ref(), &data).await
}

/// GET /api/user/search.
pub async fn search(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(data): Query<SearchRequest>,
) -> Result<SearchResponse, AppError> {
    state.users.search.execute(state.store.as_ref(), &data).await
}

/// GET /api/user/:id.
pub async fn detail(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Envelope {
    state.users.detail.execute(state.store.as_ref(), &id).await
}
