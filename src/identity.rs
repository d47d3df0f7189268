use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity api request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity api answered with status {0}")]
    Status(u16),
}

/// What the passport-information service knows about a person.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProfile {
    pub surname: String,
    pub name: String,
    #[serde(default)]
    pub patronymic: String,
    #[serde(default)]
    pub address: String,
}

#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn fetch(&self, passport: &str) -> Result<IdentityProfile, IdentityError>;
}

pub struct HttpIdentityClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpIdentityClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// The upstream splits the passport into its serie and number; the caller
/// has already validated the "NNNN NNNNNN" shape.
fn info_url(base_url: &str, passport: &str) -> String {
    let serie = &passport[..4];
    let number = &passport[5..];
    format!("{base_url}/info?passportSerie={serie}&passportNumber={number}")
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn fetch(&self, passport: &str) -> Result<IdentityProfile, IdentityError> {
        let url = info_url(&self.base_url, passport);
        let resp = self.http.get(&url).send().await?;

        if !resp.status().is_success() {
            return Err(IdentityError::Status(resp.status().as_u16()));
        }
        Ok(resp.json::<IdentityProfile>().await?)
    }
}
