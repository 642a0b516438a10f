//! LinkedIn UGC share publisher

use async_trait::async_trait;
use serde_json::json;

use super::{id_at, send, simulate, CredentialMode, HttpContext, Publisher};
use crate::error::PublishError;
use crate::types::{ConnectedAccount, Platform};

pub struct LinkedinPublisher {
    http: HttpContext,
    base_url: String,
}

impl LinkedinPublisher {
    pub fn new(http: HttpContext, base_url: String) -> Self {
        Self { http, base_url }
    }

    fn share_body(author: &str, content: &str, media_url: Option<&str>) -> serde_json::Value {
        let mut share = json!({
            "shareCommentary": { "text": content },
            "shareMediaCategory": "NONE",
        });

        if let Some(url) = media_url {
            share["shareMediaCategory"] = json!("ARTICLE");
            share["media"] = json!([{
                "status": "READY",
                "description": { "text": "Shared via Fanout" },
                "originalUrl": url,
                "title": { "text": "View Content" },
            }]);
        }

        json!({
            "author": author,
            "lifecycleState": "PUBLISHED",
            "specificContent": { "com.linkedin.ugc.ShareContent": share },
            "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" },
        })
    }
}

#[async_trait]
impl Publisher for LinkedinPublisher {
    fn platform(&self) -> Platform {
        Platform::Linkedin
    }

    async fn publish(
        &self,
        account: &ConnectedAccount,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<String, PublishError> {
        if CredentialMode::of(account.token()) == CredentialMode::Simulated {
            return Ok(simulate(Platform::Linkedin, self.http.simulated_latency).await);
        }

        let author = account
            .platform_user
            .as_deref()
            .filter(|urn| !urn.is_empty())
            .ok_or_else(|| PublishError::MissingIdentity("Missing LinkedIn person URN".to_string()))?;

        let request = self
            .http
            .client
            .post(format!("{}/ugcPosts", self.base_url))
            .bearer_auth(account.token())
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&Self::share_body(author, content, media_url));

        let response = send(Platform::Linkedin, request).await?;

        // The share URN comes back in the body, or only in this header
        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| PublishError::Network {
            platform: Platform::Linkedin,
            message: e.to_string(),
        })?;
        let body_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| id_at(&value, "/id"));

        body_id
            .or(header_id)
            .ok_or_else(|| super::missing_id(Platform::Linkedin, "/id"))
    }
}
