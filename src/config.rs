use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub encryption_key: String,
    pub identity_api_url: String,
    /// Deadline applied to every downstream call a handler makes.
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let encryption_key =
            std::env::var("ENCRYPTION_KEY").context("ENCRYPTION_KEY is not set")?;
        let identity_api_url =
            std::env::var("IDENTITY_API_URL").context("IDENTITY_API_URL is not set")?;
        let request_timeout = Duration::from_millis(
            std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(500),
        );

        Ok(Self {
            database_url,
            encryption_key,
            identity_api_url,
            request_timeout,
        })
    }
}
