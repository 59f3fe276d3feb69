use super::WidgetError;
use crate::upstream::MERGE_PATCH_CONTENT_TYPE;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, IF_MATCH};
use serde_json::Value;

/// Raw proxy answer; status interpretation belongs to the save protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// The proxy's account endpoints as seen from the widget.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn get_account(&self, id: &str) -> Result<ApiResponse, WidgetError>;
    async fn patch_account(
        &self,
        id: &str,
        if_match: &str,
        patch: &Value,
    ) -> Result<ApiResponse, WidgetError>;
}

/// `AccountApi` over HTTP against the proxy the widget was launched from.
#[derive(Clone)]
pub struct ProxyAccountClient {
    base: url::Url,
    client: reqwest::Client,
}

impl ProxyAccountClient {
    pub fn new(base: url::Url) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { base, client })
    }

    fn account_url(&self, id: &str) -> Result<url::Url, WidgetError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| WidgetError::InvalidLaunchUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(["api", "accounts", id]);
        Ok(url)
    }

    async fn into_response(resp: reqwest::Response) -> Result<ApiResponse, WidgetError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| WidgetError::Transport(e.to_string()))?;
        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

#[async_trait]
impl AccountApi for ProxyAccountClient {
    async fn get_account(&self, id: &str) -> Result<ApiResponse, WidgetError> {
        let resp = self
            .client
            .get(self.account_url(id)?)
            .send()
            .await
            .map_err(|e| WidgetError::Transport(e.to_string()))?;
        Self::into_response(resp).await
    }

    async fn patch_account(
        &self,
        id: &str,
        if_match: &str,
        patch: &Value,
    ) -> Result<ApiResponse, WidgetError> {
        let body = serde_json::to_vec(patch).map_err(|e| WidgetError::Transport(e.to_string()))?;
        let resp = self
            .client
            .patch(self.account_url(id)?)
            .header(CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE)
            .header(IF_MATCH, if_match)
            .body(body)
            .send()
            .await
            .map_err(|e| WidgetError::Transport(e.to_string()))?;
        Self::into_response(resp).await
    }
}
