//! Source lookup against the remote `srcapi` service.

use crate::SourceBundle;
use reqwest::{StatusCode, header};
use serde::Deserialize;
use srcfetch_config::{ChainId, Config};
use std::fmt::Debug;

/// The user agent sent with every lookup.
pub const USER_AGENT: &str = concat!("srcfetch/", env!("CARGO_PKG_VERSION"));

/// Errors returned by a [`SourceProvider`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no verified source found for {address} on chain {chain}")]
    NotFound { address: String, chain: ChainId },
    #[error("source lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source lookup for {url} returned {status}: {body}")]
    Status { url: String, status: StatusCode, body: String },
    #[error("failed to decode source lookup response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Something that can look up the verified sources of a contract.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync + Debug {
    /// Fetches the sources of the contract at `address` on `chain`.
    async fn fetch(&self, address: &str, chain: &ChainId) -> Result<SourceBundle, FetchError>;
}

/// The response body of `GET /srcapi/{chain}/{address}`.
///
/// For proxies, the `proxy*` fields describe the implementation contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub proxy_address: Option<String>,
    #[serde(default)]
    pub proxy_result: Option<String>,
    #[serde(default)]
    pub proxy_contract_name: Option<String>,
    #[serde(default)]
    pub proxy_ext: Option<String>,
}

impl SourceResponse {
    /// Returns `true` if the response describes a proxy with a known implementation.
    pub fn is_proxy(&self) -> bool {
        self.proxy_address.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Normalizes the response into a bundle, following the proxy to its implementation.
    pub fn into_bundle(self, address: &str, chain: &ChainId) -> Result<SourceBundle, FetchError> {
        let (result, contract_name, ext) = if self.is_proxy() {
            debug!(target: "srcfetch::fetch", proxy = address, implementation = ?self.proxy_address, "following proxy");
            (self.proxy_result, self.proxy_contract_name, self.proxy_ext)
        } else {
            (self.result, self.contract_name, self.ext)
        };

        let Some(payload) = result.filter(|r| !r.trim().is_empty()) else {
            return Err(FetchError::NotFound { address: address.to_string(), chain: chain.clone() });
        };
        Ok(SourceBundle::from_payload(&payload, contract_name, ext.as_deref()))
    }
}

/// HTTP client for the source lookup service.
#[derive(Clone, Debug)]
pub struct SourceApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl SourceApiClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client for the service configured in `config`.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(config.source_api_url.clone())
    }

    /// Creates a client using an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Returns the lookup URL for `address` on `chain`.
    pub fn url(&self, chain: &ChainId, address: &str) -> String {
        format!("{}/srcapi/{chain}/{address}", self.base_url)
    }

    /// Performs the lookup and returns the raw response.
    pub async fn lookup(
        &self,
        address: &str,
        chain: &ChainId,
    ) -> Result<SourceResponse, FetchError> {
        let url = self.url(chain, address);
        trace!(target: "srcfetch::fetch", %url, "requesting sources");

        let resp = self.client.get(&url).header(header::ACCEPT, "application/json").send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { address: address.to_string(), chain: chain.clone() });
        }
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(target: "srcfetch::fetch", %url, %status, "source lookup failed");
            return Err(FetchError::Status { url, status, body });
        }

        trace!(target: "srcfetch::fetch", len = body.len(), "received response");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl SourceProvider for SourceApiClient {
    async fn fetch(&self, address: &str, chain: &ChainId) -> Result<SourceBundle, FetchError> {
        self.lookup(address, chain).await?.into_bundle(address, chain)
    }
}
