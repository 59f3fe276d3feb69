//! The score widget: input normalization, the optimistic save protocol and
//! the seams it talks through (proxy API, view, host window).

pub mod client;
pub mod controls;
pub mod host;
pub mod protocol;
pub mod session;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ProxyAccountClient;
pub use host::TracingNotifier;
pub use protocol::{SaveOutcome, ScoreWidget};
pub use view::TerminalView;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("No accountId provided in URL. Please provide ?accountId=YOUR_ACCOUNT_UUID")]
    MissingAccountId,
    #[error("invalid launch URL: {0}")]
    InvalidLaunchUrl(String),
    #[error("failed to fetch account: {0}")]
    AccountFetchFailed(String),
    #[error("No updatedOn timestamp found for If-Match header")]
    PreconditionMissing,
    #[error("Save failed: {status} {body}")]
    SaveFailed { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
}

/// What the widget learns from its launch URL: where the proxy lives and
/// which account to edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchParams {
    pub proxy_base: url::Url,
    pub account_id: String,
}

impl LaunchParams {
    pub fn from_url(raw: &str) -> Result<Self, WidgetError> {
        let url = url::Url::parse(raw).map_err(|e| WidgetError::InvalidLaunchUrl(e.to_string()))?;
        let account_id = url
            .query_pairs()
            .find(|(key, _)| key == "accountId")
            .map(|(_, value)| value.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(WidgetError::MissingAccountId)?;

        let mut proxy_base = url.clone();
        proxy_base.set_query(None);
        proxy_base.set_fragment(None);
        proxy_base.set_path("/");
        Ok(Self {
            proxy_base,
            account_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_url_yields_account_and_origin() {
        let params = LaunchParams::from_url(
            "http://localhost:3000/widget?accountId=11111111-2222-3333-4444-555555555555#x",
        )
        .unwrap();
        assert_eq!(params.account_id, "11111111-2222-3333-4444-555555555555");
        assert_eq!(params.proxy_base.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn missing_or_blank_account_id_is_fatal() {
        for raw in [
            "http://localhost:3000/",
            "http://localhost:3000/?accountId=",
            "http://localhost:3000/?other=1",
        ] {
            assert!(matches!(
                LaunchParams::from_url(raw),
                Err(WidgetError::MissingAccountId)
            ));
        }
    }

    #[test]
    fn unparsable_url_is_rejected() {
        assert!(matches!(
            LaunchParams::from_url("not a url"),
            Err(WidgetError::InvalidLaunchUrl(_))
        ));
    }
}
