//! X (Twitter) API v2 publisher

use async_trait::async_trait;
use serde_json::json;

use super::{id_at, missing_id, read_json, send, simulate, CredentialMode, HttpContext, Publisher};
use crate::error::PublishError;
use crate::types::{ConnectedAccount, Platform};

pub struct TwitterPublisher {
    http: HttpContext,
    base_url: String,
}

impl TwitterPublisher {
    pub fn new(http: HttpContext, base_url: String) -> Self {
        Self { http, base_url }
    }
}

/// Tweet text; media is shared as a trailing link
pub fn tweet_text(content: &str, media_url: Option<&str>) -> String {
    match media_url {
        Some(url) => format!("{} {}", content, url),
        None => content.to_string(),
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(
        &self,
        account: &ConnectedAccount,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<String, PublishError> {
        if CredentialMode::of(account.token()) == CredentialMode::Simulated {
            return Ok(simulate(Platform::Twitter, self.http.simulated_latency).await);
        }

        let request = self
            .http
            .client
            .post(format!("{}/tweets", self.base_url))
            .bearer_auth(account.token())
            .json(&json!({ "text": tweet_text(content, media_url) }));

        let response = send(Platform::Twitter, request).await?;
        let value = read_json(Platform::Twitter, response).await?;

        id_at(&value, "/data/id").ok_or_else(|| missing_id(Platform::Twitter, "/data/id"))
    }
}
