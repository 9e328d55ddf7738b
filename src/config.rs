//! Environment-driven runtime configuration. `.env` is loaded by the binary
//! before this runs; here we only read the process environment.

use crate::error::ConfigError;
use crate::query::timezone::{offset_minutes, DEFAULT_TZ_OFFSET};
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_DATABASE: &str = "starter";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string. Required.
    pub mongodb_uri: String,
    pub database: String,
    pub bind_addr: SocketAddr,
    /// Offset between caller-local days and the store's time basis.
    pub tz_offset: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mongodb_uri =
            env::var("MONGODB_URI").map_err(|_| ConfigError::MissingVar("MONGODB_URI"))?;
        let database = env::var("DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let bind_raw = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;
        let tz_offset = env::var("TZ_OFFSET").unwrap_or_else(|_| DEFAULT_TZ_OFFSET.to_string());
        if offset_minutes(&tz_offset).is_none() {
            return Err(ConfigError::InvalidValue {
                var: "TZ_OFFSET",
                value: tz_offset,
            });
        }
        Ok(Config {
            mongodb_uri,
            database,
            bind_addr,
            tz_offset,
        })
    }
}
