//! API server entry point: env config, store connection, model registry,
//! router, serve.

use starter_sdk::handlers::UserHandlers;
use starter_sdk::{AppState, Config, ModelRegistry, ModelSpec, MongoStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let store = Arc::new(MongoStore::connect(&config.mongodb_uri, &config.database).await?);
    tracing::info!(database = %config.database, "connected to store");

    let mut registry = ModelRegistry::new();
    // password and apiKey stay off the allow-list
    let user_model = registry.register(ModelSpec::new(
        "User",
        "users",
        &["name", "email", "createdAt"],
    ));

    let state = AppState {
        store,
        registry: Arc::new(registry),
        users: Arc::new(UserHandlers::new(user_model, &config.tz_offset)),
    };

    let app = starter_sdk::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
