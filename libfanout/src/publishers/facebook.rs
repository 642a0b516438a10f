//! Facebook Graph API publisher (page feed, photos and videos)

use async_trait::async_trait;
use serde_json::json;

use super::{id_at, is_video_url, missing_id, read_json, send, simulate, CredentialMode, HttpContext, Publisher};
use crate::error::PublishError;
use crate::types::{ConnectedAccount, Platform};

pub struct FacebookPublisher {
    http: HttpContext,
    base_url: String,
}

impl FacebookPublisher {
    pub fn new(http: HttpContext, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Graph edge and body for the given media
    fn target(content: &str, media_url: Option<&str>) -> (&'static str, serde_json::Value) {
        match media_url {
            None => ("feed", json!({ "message": content })),
            Some(url) if is_video_url(url) => {
                ("videos", json!({ "description": content, "file_url": url }))
            }
            Some(url) => ("photos", json!({ "caption": content, "url": url })),
        }
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn publish(
        &self,
        account: &ConnectedAccount,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<String, PublishError> {
        if CredentialMode::of(account.token()) == CredentialMode::Simulated {
            return Ok(simulate(Platform::Facebook, self.http.simulated_latency).await);
        }

        // Without a page id the post goes to the token owner's own feed
        let page = account
            .platform_user
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or("me");
        let (edge, body) = Self::target(content, media_url);

        tracing::debug!(page, edge, "Publishing to Facebook");

        let request = self
            .http
            .client
            .post(format!("{}/{}/{}", self.base_url, page, edge))
            .query(&[("access_token", account.token())])
            .json(&body);

        let response = send(Platform::Facebook, request).await?;
        let value = read_json(Platform::Facebook, response).await?;

        id_at(&value, "/id").ok_or_else(|| missing_id(Platform::Facebook, "/id"))
    }
}
