//! Scheduled post processing
//!
//! A run picks up every SCHEDULED post whose time has come, claims it, hands
//! it to the [`Dispatcher`] under its owner's accounts and records PUBLISHED
//! or FAILED. Posts are handled one after another; a problem with one post
//! never stops the run.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::dispatch::{any_success, DispatchRequest, Dispatcher};
use crate::error::Result;
use crate::store::PostStore;
use crate::types::{Post, PostStatus};

/// Summary of one scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerRun {
    /// Posts claimed and attempted, whatever their outcome
    pub processed_count: usize,
    pub published: usize,
    pub failed: usize,
}

pub struct Scheduler {
    posts: Arc<dyn PostStore>,
    dispatcher: Arc<Dispatcher>,
}

impl Scheduler {
    pub fn new(posts: Arc<dyn PostStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { posts, dispatcher }
    }

    /// Process everything due as of the current time
    pub async fn run_once(&self) -> Result<SchedulerRun> {
        self.run_at(chrono::Utc::now().timestamp()).await
    }

    /// Process everything due as of `now` (unix seconds)
    ///
    /// Returns `Err` only when the due posts cannot be listed.
    pub async fn run_at(&self, now: i64) -> Result<SchedulerRun> {
        let due = self.posts.list_due_posts(now).await?;
        if due.is_empty() {
            debug!("No posts due");
            return Ok(SchedulerRun::default());
        }
        info!("Found {} due posts", due.len());

        let mut run = SchedulerRun::default();

        for post in due {
            match self.posts.claim_post(&post.owner_id, &post.id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(post_id = %post.id, "Post already claimed, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(post_id = %post.id, "Failed to claim post: {}", e);
                    continue;
                }
            }

            run.processed_count += 1;
            let status = self.process(&post).await;
            match status {
                PostStatus::Published => run.published += 1,
                _ => run.failed += 1,
            }

            match self
                .posts
                .update_status(&post.owner_id, &post.id, status)
                .await
            {
                Ok(true) => {}
                Ok(false) => warn!(post_id = %post.id, "Post vanished before its status was recorded"),
                // Left in PROCESSING; never picked up again automatically
                Err(e) => error!(post_id = %post.id, "Failed to record status {}: {}", status, e),
            }
        }

        info!(
            processed = run.processed_count,
            published = run.published,
            failed = run.failed,
            "Scheduler run complete"
        );

        Ok(run)
    }

    /// Dispatch a claimed post and decide its final status
    async fn process(&self, post: &Post) -> PostStatus {
        let platforms = match post.target_platforms() {
            Ok(platforms) => platforms,
            Err(e) => {
                error!(post_id = %post.id, "Cannot decode platforms: {}", e);
                return PostStatus::Failed;
            }
        };

        let request = DispatchRequest {
            content: post.content.clone(),
            platforms,
            media_type: post.media_type,
            media_url: post.media_url.clone(),
        };

        match self.dispatcher.dispatch(&post.owner_id, &request).await {
            Ok(results) if any_success(&results) => PostStatus::Published,
            Ok(results) => {
                for result in &results {
                    debug!(
                        post_id = %post.id,
                        platform = result.platform.as_str(),
                        error = result.error.as_deref().unwrap_or(""),
                        "Platform failed"
                    );
                }
                PostStatus::Failed
            }
            Err(e) => {
                error!(post_id = %post.id, "Dispatch failed: {}", e);
                PostStatus::Failed
            }
        }
    }
}
