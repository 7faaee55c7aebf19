use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://classroom.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_LOG_FILTER: &str = "classroom=debug,tower_http=info";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Mapbox access token. Geocoding is disabled when unset.
    pub mapbox_token: Option<String>,
    /// ISO 3166 alpha-2 country filter passed to the geocoder.
    pub geocoding_country: Option<String>,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let mapbox_token = non_empty_var("MAPBOX_TOKEN");
        let geocoding_country = non_empty_var("GEOCODING_COUNTRY");

        Ok(Self {
            database_url,
            bind_addr,
            mapbox_token,
            geocoding_country,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
