//! Post submission: validate, store, and publish now / schedule / queue

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::dispatch::{any_success, DispatchRequest, DispatchResult, Dispatcher};
use crate::store::PostStore;
use crate::types::{MediaType, Platform, Post, PostStatus};
use crate::{FanoutError, Result};

#[derive(Clone)]
pub struct PostingService {
    posts: Arc<dyn PostStore>,
    dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Clone, Default)]
pub struct PostRequest {
    pub content: String,
    pub platforms: Vec<Platform>,
    pub media_type: MediaType,
    pub media_url: Option<String>,
    /// Unix seconds; a value in the past fires on the next scheduler run
    pub scheduled_at: Option<i64>,
    /// Append to the owner's queue instead of publishing now
    pub defer: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub post: Post,
    /// Present only when the post was published immediately
    pub results: Option<Vec<DispatchResult>>,
}

impl PostingService {
    pub fn new(posts: Arc<dyn PostStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { posts, dispatcher }
    }

    /// Store a post and, unless scheduled or deferred, publish it right away
    pub async fn submit(&self, owner_id: &str, request: PostRequest) -> Result<PostResponse> {
        let platforms = validate(&request)?;

        let mut post = Post::new(
            owner_id,
            request.content,
            request.media_type,
            request.media_url.filter(|url| !url.trim().is_empty()),
            &platforms,
        );

        if let Some(at) = request.scheduled_at {
            post.status = PostStatus::Scheduled;
            post.scheduled_at = Some(at);
            self.posts.create_post(&post).await?;
            info!(post_id = %post.id, scheduled_at = at, "Post scheduled");
            return Ok(PostResponse {
                post,
                results: None,
            });
        }

        if request.defer {
            post.status = PostStatus::Queued;
            post.queue_position = Some(self.posts.next_queue_position(owner_id).await?);
            self.posts.create_post(&post).await?;
            info!(post_id = %post.id, position = ?post.queue_position, "Post queued");
            return Ok(PostResponse {
                post,
                results: None,
            });
        }

        self.publish_now(post, platforms).await
    }

    /// Stored as DRAFT first so a crash mid-dispatch leaves a trace
    async fn publish_now(&self, mut post: Post, platforms: Vec<Platform>) -> Result<PostResponse> {
        self.posts.create_post(&post).await?;

        let request = DispatchRequest {
            content: post.content.clone(),
            platforms,
            media_type: post.media_type,
            media_url: post.media_url.clone(),
        };

        let results = match self.dispatcher.dispatch(&post.owner_id, &request).await {
            Ok(results) => results,
            Err(e) => {
                if let Err(store_err) = self
                    .posts
                    .update_status(&post.owner_id, &post.id, PostStatus::Failed)
                    .await
                {
                    warn!(post_id = %post.id, "Failed to mark post failed: {}", store_err);
                }
                return Err(e);
            }
        };

        post.status = if any_success(&results) {
            PostStatus::Published
        } else {
            PostStatus::Failed
        };
        // Results are returned even when the status write fails; the post
        // stays DRAFT
        if let Err(e) = self
            .posts
            .update_status(&post.owner_id, &post.id, post.status)
            .await
        {
            error!(post_id = %post.id, "Failed to record status {}: {}", post.status, e);
        }

        info!(post_id = %post.id, status = %post.status, "Post dispatched");

        Ok(PostResponse {
            post,
            results: Some(results),
        })
    }
}

/// Check a request and return its platform set with duplicates removed
fn validate(request: &PostRequest) -> Result<Vec<Platform>> {
    let has_media = request
        .media_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());

    if request.content.trim().is_empty() && !has_media {
        return Err(FanoutError::Validation(
            "Content or media is required".to_string(),
        ));
    }

    if request.media_type != MediaType::Text && !has_media {
        return Err(FanoutError::Validation(format!(
            "A media URL is required for {} posts",
            request.media_type.as_str()
        )));
    }

    if request.scheduled_at.is_some() && request.defer {
        return Err(FanoutError::Validation(
            "A post cannot be both scheduled and queued".to_string(),
        ));
    }

    let mut platforms = Vec::with_capacity(request.platforms.len());
    for platform in &request.platforms {
        if !platforms.contains(platform) {
            platforms.push(*platform);
        }
    }

    if platforms.is_empty() {
        return Err(FanoutError::Validation(
            "At least one platform is required".to_string(),
        ));
    }

    Ok(platforms)
}
