use crate::config::CrmConfig;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, IF_MATCH};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";
const ACCOUNTS_PATH: &str = "/sap/c4c/api/v1/account-service/accounts";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("CRM API error: {status} {reason} - {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },
    #[error("CRM API request failed: {0}")]
    Transport(String),
    #[error("CRM API returned an unreadable body: {0}")]
    Decode(String),
    #[error("invalid account endpoint: {0}")]
    Endpoint(String),
}

/// Access to the upstream account resource. The proxy never interprets the
/// account JSON; it only relays it.
#[async_trait]
pub trait AccountUpstream: Send + Sync {
    async fn get_account(&self, id: &str) -> Result<Value, UpstreamError>;
    async fn patch_account(
        &self,
        id: &str,
        if_match: &str,
        patch: Value,
    ) -> Result<Value, UpstreamError>;
}

/// HTTP client for the CRM account service with a Basic-Auth header built once.
#[derive(Clone)]
pub struct HttpCrmClient {
    base_url: url::Url,
    authorization: HeaderValue,
    client: reqwest::Client,
}

impl HttpCrmClient {
    pub fn new(cfg: &CrmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let mut authorization =
            HeaderValue::from_str(&basic_auth_value(&cfg.username, &cfg.password))?;
        authorization.set_sensitive(true);
        Ok(Self {
            base_url: cfg.base_url.clone(),
            authorization,
            client,
        })
    }

    fn account_url(&self, id: &str) -> Result<url::Url, UpstreamError> {
        account_url(&self.base_url, id)
    }

    async fn read_json(resp: reqwest::Response, endpoint: &str) -> Result<Value, UpstreamError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = UpstreamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            };
            warn!(%endpoint, %err, "upstream returned an error status");
            return Err(err);
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AccountUpstream for HttpCrmClient {
    async fn get_account(&self, id: &str) -> Result<Value, UpstreamError> {
        let url = self.account_url(id)?;
        debug!(%url, "fetching upstream account");
        let resp = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "upstream request failed");
                UpstreamError::Transport(e.to_string())
            })?;
        Self::read_json(resp, url.path()).await
    }

    async fn patch_account(
        &self,
        id: &str,
        if_match: &str,
        patch: Value,
    ) -> Result<Value, UpstreamError> {
        let url = self.account_url(id)?;
        let body = serde_json::to_vec(&patch).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        debug!(%url, %if_match, "patching upstream account");
        let resp = self
            .client
            .patch(url.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .header(CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE)
            .header(IF_MATCH, if_match)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "upstream request failed");
                UpstreamError::Transport(e.to_string())
            })?;
        Self::read_json(resp, url.path()).await
    }
}

pub fn basic_auth_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Appends the account path to the configured base, keeping any path prefix
/// the base already carries. The id is pushed as a single encoded segment.
fn account_url(base: &url::Url, id: &str) -> Result<url::Url, UpstreamError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| UpstreamError::Endpoint(base.to_string()))?;
        segments.pop_if_empty();
        segments.extend(ACCOUNTS_PATH.trim_start_matches('/').split('/'));
        segments.push(id);
    }
    Ok(url)
}
