//! Instagram Graph API publisher
//!
//! Publishing is two calls: create a media container, then publish it.

use async_trait::async_trait;

use super::{id_at, is_video_url, missing_id, read_json, send, simulate, CredentialMode, HttpContext, Publisher};
use crate::error::PublishError;
use crate::types::{ConnectedAccount, Platform};

pub struct InstagramPublisher {
    http: HttpContext,
    base_url: String,
}

/// Prefix the failure with the phase it happened in
fn in_phase(phase: &str, error: PublishError) -> PublishError {
    match error {
        PublishError::Rejected {
            platform,
            status,
            message,
        } => PublishError::Rejected {
            platform,
            status,
            message: format!("{}: {}", phase, message),
        },
        PublishError::Network { platform, message } => PublishError::Network {
            platform,
            message: format!("{}: {}", phase, message),
        },
        PublishError::InvalidResponse { platform, message } => PublishError::InvalidResponse {
            platform,
            message: format!("{}: {}", phase, message),
        },
        other => other,
    }
}

impl InstagramPublisher {
    pub fn new(http: HttpContext, base_url: String) -> Self {
        Self { http, base_url }
    }

    async fn create_container(
        &self,
        ig_user: &str,
        token: &str,
        caption: &str,
        media_url: &str,
    ) -> Result<String, PublishError> {
        let mut params = vec![("caption", caption), ("access_token", token)];
        if is_video_url(media_url) {
            params.push(("video_url", media_url));
            params.push(("media_type", "REELS"));
        } else {
            params.push(("image_url", media_url));
        }

        let request = self
            .http
            .client
            .post(format!("{}/{}/media", self.base_url, ig_user))
            .query(&params);

        let response = send(Platform::Instagram, request).await?;
        let value = read_json(Platform::Instagram, response).await?;
        id_at(&value, "/id").ok_or_else(|| missing_id(Platform::Instagram, "/id"))
    }

    async fn publish_container(
        &self,
        ig_user: &str,
        token: &str,
        creation_id: &str,
    ) -> Result<String, PublishError> {
        let request = self
            .http
            .client
            .post(format!("{}/{}/media_publish", self.base_url, ig_user))
            .query(&[("creation_id", creation_id), ("access_token", token)]);

        let response = send(Platform::Instagram, request).await?;
        let value = read_json(Platform::Instagram, response).await?;
        id_at(&value, "/id").ok_or_else(|| missing_id(Platform::Instagram, "/id"))
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn publish(
        &self,
        account: &ConnectedAccount,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<String, PublishError> {
        // Checked before the credential mode: simulated accounts fail too
        let media_url = media_url
            .filter(|url| !url.is_empty())
            .ok_or(PublishError::MissingMedia(Platform::Instagram))?;

        if CredentialMode::of(account.token()) == CredentialMode::Simulated {
            return Ok(simulate(Platform::Instagram, self.http.simulated_latency).await);
        }

        let ig_user = account
            .platform_user
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                PublishError::MissingIdentity("Missing Instagram business account id".to_string())
            })?;

        let creation_id = self
            .create_container(ig_user, account.token(), content, media_url)
            .await
            .map_err(|e| in_phase("container creation failed", e))?;

        tracing::debug!(creation_id = %creation_id, "Instagram container created");

        self.publish_container(ig_user, account.token(), &creation_id)
            .await
            .map_err(|e| in_phase("publish failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn publisher() -> InstagramPublisher {
        InstagramPublisher::new(
            HttpContext::new(Arc::new(reqwest::Client::new()), false),
            "http://127.0.0.1:1".to_string(),
        )
    }

    #[tokio::test]
    async fn test_missing_media_fails_even_when_simulated() {
        let account = ConnectedAccount::new("alice", Platform::Instagram, "mock_ig".to_string());
        let err = publisher().publish(&account, "Hello", None).await.unwrap_err();

        assert_eq!(err, PublishError::MissingMedia(Platform::Instagram));
        assert_eq!(err.to_string(), "Instagram requires an image or video");
    }

    #[tokio::test]
    async fn test_simulated_with_media() {
        let account = ConnectedAccount::new("alice", Platform::Instagram, "mock_ig".to_string());
        let id = publisher()
            .publish(&account, "Hello", Some("https://cdn.example.com/a.jpg"))
            .await
            .unwrap();

        assert!(id.starts_with("ig_media_"));
    }

    #[tokio::test]
    async fn test_live_requires_business_account() {
        let account = ConnectedAccount::new("alice", Platform::Instagram, "live-token".to_string());
        let err = publisher()
            .publish(&account, "Hello", Some("https://cdn.example.com/a.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::MissingIdentity(_)));
    }

    #[test]
    fn test_in_phase_prefixes_message() {
        let err = in_phase(
            "publish failed",
            PublishError::Rejected {
                platform: Platform::Instagram,
                status: 400,
                message: "Media ID is not available".to_string(),
            },
        );

        assert!(err.to_string().contains("publish failed: Media ID is not available"));
    }
}
