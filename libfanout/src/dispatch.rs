//! Dispatch coordination
//!
//! Fans one post out to every requested platform. Each platform is attempted
//! independently: a failure on one never prevents the others, and the
//! returned results line up one-to-one with the requested platforms.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{PublishError, Result, ACCOUNT_NOT_CONNECTED};
use crate::publishers::PublisherRegistry;
use crate::store::AccountStore;
use crate::types::{ConnectedAccount, MediaType, Platform};

/// Default upper bound for one publisher call
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

/// What to publish and where
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub content: String,
    pub platforms: Vec<Platform>,
    pub media_type: MediaType,
    pub media_url: Option<String>,
}

/// Outcome of one publish attempt on one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub platform: Platform,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    pub fn succeeded(platform: Platform, external_post_id: String) -> Self {
        Self {
            platform,
            success: true,
            external_post_id: Some(external_post_id),
            error: None,
        }
    }

    pub fn failed(platform: Platform, error: impl Into<String>) -> Self {
        Self {
            platform,
            success: false,
            external_post_id: None,
            error: Some(error.into()),
        }
    }
}

/// True when at least one platform accepted the post
pub fn any_success(results: &[DispatchResult]) -> bool {
    results.iter().any(|r| r.success)
}

pub struct Dispatcher {
    accounts: Arc<dyn AccountStore>,
    publishers: PublisherRegistry,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(accounts: Arc<dyn AccountStore>, publishers: PublisherRegistry) -> Self {
        Self {
            accounts,
            publishers,
            timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Publish to every platform in `request.platforms` on behalf of `owner_id`
    ///
    /// Only a failure to load the owner's accounts is returned as `Err`;
    /// every per-platform problem is reported in that platform's result.
    pub async fn dispatch(
        &self,
        owner_id: &str,
        request: &DispatchRequest,
    ) -> Result<Vec<DispatchResult>> {
        info!(
            owner_id,
            platforms = ?request.platforms,
            "Dispatching post"
        );

        let accounts: HashMap<Platform, ConnectedAccount> = self
            .accounts
            .find_connected_accounts(owner_id)
            .await?
            .into_iter()
            .filter(|account| account.connected)
            .map(|account| (account.platform, account))
            .collect();

        let attempts = request
            .platforms
            .iter()
            .map(|&platform| self.attempt(platform, accounts.get(&platform), request));

        let results = join_all(attempts).await;

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            owner_id,
            succeeded,
            failed = results.len() - succeeded,
            "Dispatch finished"
        );

        Ok(results)
    }

    async fn attempt(
        &self,
        platform: Platform,
        account: Option<&ConnectedAccount>,
        request: &DispatchRequest,
    ) -> DispatchResult {
        let Some(account) = account else {
            warn!(platform = platform.as_str(), "{}", ACCOUNT_NOT_CONNECTED);
            return DispatchResult::failed(platform, ACCOUNT_NOT_CONNECTED);
        };

        let Some(publisher) = self.publishers.get(platform) else {
            warn!(platform = platform.as_str(), "No publisher registered");
            return DispatchResult::failed(
                platform,
                format!("No publisher registered for {}", platform),
            );
        };

        let publish = publisher.publish(account, &request.content, request.media_url.as_deref());
        let outcome = match tokio::time::timeout(self.timeout, publish).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PublishError::Timeout {
                platform,
                secs: self.timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(post_id) => {
                info!(platform = platform.as_str(), post_id = %post_id, "Published");
                DispatchResult::succeeded(platform, post_id)
            }
            Err(e) => {
                warn!(platform = platform.as_str(), "Publish failed: {}", e);
                DispatchResult::failed(platform, e.to_string())
            }
        }
    }
}
