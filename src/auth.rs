//! Opaque api-key authentication. The key travels either as an `apiKey`
//! query parameter or an `x-api-key` header and is matched against the users
//! collection on every request; there is no session state.

use crate::error::AppError;
use crate::response::id_key;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use bson::doc;
use mongodb::options::FindOneOptions;
use serde::Deserialize;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The authenticated caller. Extracting this in a handler signature is what
/// puts the route behind the api-key check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyParam {
    api_key: Option<String>,
}

fn api_key_from(parts: &Parts) -> Option<String> {
    if let Ok(Query(param)) = Query::<ApiKeyParam>::try_from_uri(&parts.uri) {
        if let Some(key) = param.api_key {
            if !key.is_empty() {
                return Some(key);
            }
        }
    }
    parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let key = api_key_from(parts).ok_or(AppError::Unauthorized)?;
        let found = state
            .store
            .find_one(
                "users",
                doc! { "apiKey": &key },
                FindOneOptions::default(),
            )
            .await?;
        let user = found.ok_or(AppError::Unauthorized)?;
        let id = user.get("_id").and_then(id_key).unwrap_or_default();
        let name = user.get_str("name").unwrap_or_default().to_string();
        tracing::debug!(user = %name, "authenticated");
        Ok(AuthUser { id, name })
    }
}
