//! Platform publishers
//!
//! Each [`Platform`] variant is bound to exactly one [`Publisher`] in the
//! [`PublisherRegistry`]. A publisher turns a normalized post (content plus
//! an optional media URL) into the provider's publish call and returns the
//! provider-assigned post id.
//!
//! Accounts holding a token with the [`SIMULATED_TOKEN_PREFIX`] never touch
//! the network: [`simulate`] stands in for the provider call so the whole
//! dispatch path can be exercised end to end.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EndpointsConfig;
use crate::error::{ConfigError, PublishError, Result};
use crate::types::{ConnectedAccount, Platform};

pub mod facebook;
pub mod instagram;
pub mod linkedin;
pub mod twitter;

pub use facebook::FacebookPublisher;
pub use instagram::InstagramPublisher;
pub use linkedin::LinkedinPublisher;
pub use twitter::TwitterPublisher;

/// Reserved token prefix marking a simulated credential
pub const SIMULATED_TOKEN_PREFIX: &str = "mock_";

#[async_trait]
pub trait Publisher: Send + Sync {
    fn platform(&self) -> Platform;

    /// Publish and return the provider's post id
    async fn publish(
        &self,
        account: &ConnectedAccount,
        content: &str,
        media_url: Option<&str>,
    ) -> std::result::Result<String, PublishError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Simulated,
    Live,
}

impl CredentialMode {
    pub fn of(token: &str) -> Self {
        if token.starts_with(SIMULATED_TOKEN_PREFIX) {
            CredentialMode::Simulated
        } else {
            CredentialMode::Live
        }
    }
}

/// Latency emulated for a simulated publish
pub fn simulated_latency(platform: Platform) -> Duration {
    match platform {
        Platform::Linkedin => Duration::from_millis(1000),
        Platform::Facebook => Duration::from_millis(1000),
        Platform::Twitter => Duration::from_millis(800),
        Platform::Instagram => Duration::from_millis(1500),
    }
}

fn simulated_tag(platform: Platform) -> &'static str {
    match platform {
        Platform::Linkedin => "li_share",
        Platform::Facebook => "fb_post",
        Platform::Twitter => "tweet",
        Platform::Instagram => "ig_media",
    }
}

/// Stand in for a provider call: optional sleep, then `<tag>_<unix millis>`
pub async fn simulate(platform: Platform, emulate_latency: bool) -> String {
    if emulate_latency {
        tokio::time::sleep(simulated_latency(platform)).await;
    }

    let id = format!(
        "{}_{}",
        simulated_tag(platform),
        chrono::Utc::now().timestamp_millis()
    );
    tracing::debug!(platform = platform.as_str(), post_id = %id, "Simulated publish");
    id
}

/// Shared state handed to every live publisher
#[derive(Clone)]
pub struct HttpContext {
    pub client: Arc<reqwest::Client>,
    /// Sleep the platform latency on simulated publishes
    pub simulated_latency: bool,
}

impl HttpContext {
    pub fn new(client: Arc<reqwest::Client>, simulated_latency: bool) -> Self {
        Self {
            client,
            simulated_latency,
        }
    }
}

/// Send a request and turn non-2xx answers into [`PublishError::Rejected`]
pub(crate) async fn send(
    platform: Platform,
    request: reqwest::RequestBuilder,
) -> std::result::Result<reqwest::Response, PublishError> {
    let response = request.send().await.map_err(|e| PublishError::Network {
        platform,
        message: e.to_string(),
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = provider_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    tracing::warn!(
        platform = platform.as_str(),
        status = status.as_u16(),
        "Provider rejected publish: {}",
        message
    );

    Err(PublishError::Rejected {
        platform,
        status: status.as_u16(),
        message,
    })
}

/// Pull the human-readable diagnostic out of a provider error body
///
/// Graph API nests it under `error.message`, LinkedIn uses `message`, X uses
/// `detail` or `title`. Anything else is returned as raw text.
fn provider_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for pointer in ["/error/message", "/message", "/detail", "/title", "/errors/0/message"] {
            if let Some(message) = value.pointer(pointer).and_then(|v| v.as_str()) {
                return Some(message.to_string());
            }
        }
    }

    Some(trimmed.chars().take(300).collect())
}

/// Decode a JSON response body
pub(crate) async fn read_json(
    platform: Platform,
    response: reqwest::Response,
) -> std::result::Result<serde_json::Value, PublishError> {
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| PublishError::InvalidResponse {
            platform,
            message: format!("response is not JSON: {}", e),
        })
}

/// Read an id at `pointer`; providers return ids as strings or numbers
pub(crate) fn id_at(value: &serde_json::Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn missing_id(platform: Platform, pointer: &str) -> PublishError {
    PublishError::InvalidResponse {
        platform,
        message: format!("no post id at {}", pointer),
    }
}

/// True when the URL path names a video file (`.mp4` / `.mov`)
///
/// Query strings and fragments are ignored, so signed CDN links still match.
pub fn is_video_url(url: &str) -> bool {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let path = path.to_lowercase();
    path.ends_with(".mp4") || path.ends_with(".mov")
}

/// Maps each platform to its publisher
#[derive(Clone, Default)]
pub struct PublisherRegistry {
    publishers: HashMap<Platform, Arc<dyn Publisher>>,
}

impl PublisherRegistry {
    /// Registry with an empty platform map
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the four built-in publishers
    pub fn new(endpoints: &EndpointsConfig, simulated_latency: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fanout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_context(
            endpoints,
            HttpContext::new(Arc::new(client), simulated_latency),
        ))
    }

    pub fn with_context(endpoints: &EndpointsConfig, http: HttpContext) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(LinkedinPublisher::new(
            http.clone(),
            endpoints.linkedin.clone(),
        )));
        registry.register(Arc::new(FacebookPublisher::new(
            http.clone(),
            endpoints.graph.clone(),
        )));
        registry.register(Arc::new(TwitterPublisher::new(
            http.clone(),
            endpoints.twitter.clone(),
        )));
        registry.register(Arc::new(InstagramPublisher::new(
            http,
            endpoints.graph.clone(),
        )));
        registry
    }

    /// Bind a publisher to its platform, replacing any previous binding
    pub fn register(&mut self, publisher: Arc<dyn Publisher>) {
        self.publishers.insert(publisher.platform(), publisher);
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn Publisher>> {
        self.publishers.get(&platform).cloned()
    }
}
