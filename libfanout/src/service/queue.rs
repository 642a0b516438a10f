//! Queue management: listing, reordering and removing deferred posts

use std::sync::Arc;
use tracing::info;

use crate::error::StoreError;
use crate::store::PostStore;
use crate::types::{Post, PostStats, QueueSlot};
use crate::{FanoutError, Result};

#[derive(Clone)]
pub struct QueueService {
    posts: Arc<dyn PostStore>,
}

impl QueueService {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }

    /// Queued posts of the owner in publish order
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Post>> {
        self.posts.list_queue(owner_id).await
    }

    /// Scheduled posts of the owner, soonest first
    pub async fn scheduled(&self, owner_id: &str) -> Result<Vec<Post>> {
        self.posts.list_scheduled(owner_id).await
    }

    /// Posts claimed by a scheduler run that never recorded an outcome
    pub async fn processing(&self, owner_id: &str) -> Result<Vec<Post>> {
        self.posts.list_processing(owner_id).await
    }

    /// Per-status totals across all of the owner's posts
    pub async fn stats(&self, owner_id: &str) -> Result<PostStats> {
        self.posts.count_by_status(owner_id).await
    }

    /// Apply a batch of position changes atomically
    pub async fn reorder(&self, owner_id: &str, slots: &[QueueSlot]) -> Result<()> {
        if slots.is_empty() {
            return Err(FanoutError::Validation(
                "Reorder needs at least one item".to_string(),
            ));
        }

        self.posts.reorder(owner_id, slots).await?;
        info!(owner_id, items = slots.len(), "Queue reordered");
        Ok(())
    }

    /// Exchange the positions of two queued posts
    pub async fn swap(&self, owner_id: &str, first_id: &str, second_id: &str) -> Result<()> {
        if first_id == second_id {
            return Err(FanoutError::Validation(
                "Cannot swap a post with itself".to_string(),
            ));
        }

        let first = self.queued(owner_id, first_id).await?;
        let second = self.queued(owner_id, second_id).await?;

        self.reorder(
            owner_id,
            &[
                QueueSlot {
                    id: first.id,
                    position: second.queue_position.unwrap_or_default(),
                },
                QueueSlot {
                    id: second.id,
                    position: first.queue_position.unwrap_or_default(),
                },
            ],
        )
        .await
    }

    /// Remove a queued post; returns `false` when the owner has no such post
    pub async fn delete(&self, owner_id: &str, post_id: &str) -> Result<bool> {
        let deleted = self.posts.delete_queued(owner_id, post_id).await?;
        if deleted {
            info!(owner_id, post_id, "Queued post deleted");
        }
        Ok(deleted)
    }

    async fn queued(&self, owner_id: &str, post_id: &str) -> Result<Post> {
        self.posts
            .get_post(owner_id, post_id)
            .await?
            .filter(|post| post.status == crate::types::PostStatus::Queued)
            .ok_or_else(|| {
                StoreError::ReorderRejected(format!(
                    "post {} is not queued for this owner",
                    post_id
                ))
                .into()
            })
    }
}
