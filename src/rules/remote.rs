use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::error::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCheck {
    pub has_update: bool,
    pub latest_version: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub change_log: Option<String>,
}

/// Where refreshed rule data comes from. The body is returned raw so that
/// the exact bytes can be checksummed and cached.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_bundle(&self, year: u32) -> Result<Vec<u8>, RemoteError>;

    async fn check_version(&self, year: u32, current: &str) -> Result<VersionCheck, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct HttpRemoteSource {
    client: Client,
    base_url: String,
}

impl HttpRemoteSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteError::Url(base_url));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("takehome/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn ensure_success(status: StatusCode) -> Result<(), RemoteError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(RemoteError::Status(status.as_u16()))
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_bundle(&self, year: u32) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .client
            .get(format!("{}/tax-data/{year}", self.base_url))
            .send()
            .await?;
        ensure_success(response.status())?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn check_version(&self, year: u32, current: &str) -> Result<VersionCheck, RemoteError> {
        let response = self
            .client
            .get(format!("{}/tax-data/{year}/version", self.base_url))
            .query(&[("current", current)])
            .send()
            .await?;
        ensure_success(response.status())?;
        Ok(response.json::<VersionCheck>().await?)
    }
}
