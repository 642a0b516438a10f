//! Core types for Fanout

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{FanoutError, StoreError};

/// Target platform for a publish
///
/// The set is closed: each variant is bound to exactly one publisher in
/// [`crate::publishers::PublisherRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linkedin,
    Facebook,
    Twitter,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Linkedin,
        Platform::Facebook,
        Platform::Twitter,
        Platform::Instagram,
    ];

    /// Lowercase identifier used in storage, config and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Linkedin => "LinkedIn",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "X",
            Platform::Instagram => "Instagram",
        }
    }

    /// Parse a comma-separated platform list, e.g. `"twitter,instagram"`
    pub fn parse_list(input: &str) -> crate::Result<Vec<Platform>> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Platform::from_str)
            .collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = FanoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linkedin" => Ok(Platform::Linkedin),
            "facebook" => Ok(Platform::Facebook),
            "twitter" | "x" => Ok(Platform::Twitter),
            "instagram" => Ok(Platform::Instagram),
            other => Err(FanoutError::Validation(format!(
                "Unknown platform '{}'. Valid platforms: linkedin, facebook, twitter, instagram",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    #[default]
    Text,
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Text => "TEXT",
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
        }
    }
}

impl FromStr for MediaType {
    type Err = FanoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TEXT" => Ok(MediaType::Text),
            "IMAGE" => Ok(MediaType::Image),
            "VIDEO" => Ok(MediaType::Video),
            other => Err(FanoutError::Validation(format!(
                "Unknown media type '{}'. Valid types: TEXT, IMAGE, VIDEO",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Queued,
    /// Claimed by a scheduler run; not visible to other runs
    Processing,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Queued => "queued",
            PostStatus::Processing => "processing",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = FanoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "scheduled" => Ok(PostStatus::Scheduled),
            "queued" => Ok(PostStatus::Queued),
            "processing" => Ok(PostStatus::Processing),
            "published" => Ok(PostStatus::Published),
            "failed" => Ok(PostStatus::Failed),
            other => Err(FanoutError::Validation(format!("Unknown post status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub media_type: MediaType,
    pub media_url: Option<String>,
    /// JSON array of platform identifiers, as stored
    pub platforms: String,
    pub scheduled_at: Option<i64>,
    pub queue_position: Option<i64>,
    pub status: PostStatus,
    pub created_at: i64,
}

impl Post {
    pub fn new(
        owner_id: &str,
        content: String,
        media_type: MediaType,
        media_url: Option<String>,
        platforms: &[Platform],
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            content,
            media_type,
            media_url,
            platforms: encode_platforms(platforms),
            scheduled_at: None,
            queue_position: None,
            status: PostStatus::Draft,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Decode the stored platform set
    pub fn target_platforms(&self) -> crate::Result<Vec<Platform>> {
        serde_json::from_str(&self.platforms).map_err(|e| {
            StoreError::Corrupt {
                id: self.id.clone(),
                reason: format!("invalid platform list {}: {}", self.platforms, e),
            }
            .into()
        })
    }
}

pub fn encode_platforms(platforms: &[Platform]) -> String {
    let names: Vec<&str> = platforms.iter().map(Platform::as_str).collect();
    serde_json::Value::from(names).to_string()
}

/// A platform credential binding for one owner
///
/// The access token is kept behind [`SecretString`] so it is redacted from
/// `Debug` output and zeroed on drop.
#[derive(Debug)]
pub struct ConnectedAccount {
    pub owner_id: String,
    pub platform: Platform,
    pub connected: bool,
    pub access_token: SecretString,
    pub refresh_token: Option<String>,
    pub auth_data: Option<String>,
    pub platform_user: Option<String>,
    pub updated_at: i64,
}

impl ConnectedAccount {
    pub fn new(owner_id: &str, platform: Platform, access_token: String) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            platform,
            connected: true,
            access_token: SecretString::from(access_token),
            refresh_token: None,
            auth_data: None,
            platform_user: None,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_platform_user(mut self, platform_user: &str) -> Self {
        self.platform_user = Some(platform_user.to_string());
        self
    }

    pub fn token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

/// Per-status post totals for one owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostStats {
    pub draft: i64,
    pub scheduled: i64,
    pub queued: i64,
    pub processing: i64,
    pub published: i64,
    pub failed: i64,
}

impl PostStats {
    pub fn add(&mut self, status: PostStatus, count: i64) {
        let slot = match status {
            PostStatus::Draft => &mut self.draft,
            PostStatus::Scheduled => &mut self.scheduled,
            PostStatus::Queued => &mut self.queued,
            PostStatus::Processing => &mut self.processing,
            PostStatus::Published => &mut self.published,
            PostStatus::Failed => &mut self.failed,
        };
        *slot += count;
    }

    pub fn total(&self) -> i64 {
        self.draft + self.scheduled + self.queued + self.processing + self.published + self.failed
    }
}

/// Target position of one queued post in a reorder batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSlot {
    pub id: String,
    pub position: i64,
}
