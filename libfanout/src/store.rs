//! Storage seams for posts and connected accounts
//!
//! [`crate::Database`] implements both traits on SQLite. The dispatcher and
//! scheduler only see these traits, so tests can substitute stores that
//! fail on demand.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ConnectedAccount, Platform, Post, PostStats, PostStatus, QueueSlot};

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, post: &Post) -> Result<()>;

    /// Owner-scoped lookup; other owners' posts are invisible
    async fn get_post(&self, owner_id: &str, post_id: &str) -> Result<Option<Post>>;

    /// SCHEDULED posts with `scheduled_at <= now`, earliest first
    async fn list_due_posts(&self, now: i64) -> Result<Vec<Post>>;

    /// Move a post from SCHEDULED to PROCESSING
    ///
    /// Returns `false` when another run already claimed it or it is no
    /// longer scheduled.
    async fn claim_post(&self, owner_id: &str, post_id: &str) -> Result<bool>;

    /// Returns `false` when no post of this owner matched
    async fn update_status(&self, owner_id: &str, post_id: &str, status: PostStatus)
        -> Result<bool>;

    /// Apply all position changes or none
    ///
    /// Every slot must name a QUEUED post of `owner_id`.
    async fn reorder(&self, owner_id: &str, slots: &[QueueSlot]) -> Result<()>;

    /// QUEUED posts of the owner, by ascending position
    async fn list_queue(&self, owner_id: &str) -> Result<Vec<Post>>;

    /// SCHEDULED posts of the owner, by ascending `scheduled_at`
    async fn list_scheduled(&self, owner_id: &str) -> Result<Vec<Post>>;

    /// PROCESSING posts of the owner, oldest schedule first
    ///
    /// A post stays here when its run stopped before recording an outcome.
    async fn list_processing(&self, owner_id: &str) -> Result<Vec<Post>>;

    /// Number of the owner's posts in each status
    async fn count_by_status(&self, owner_id: &str) -> Result<PostStats>;

    /// One past the highest position in the owner's queue
    async fn next_queue_position(&self, owner_id: &str) -> Result<i64>;

    /// Delete a QUEUED post; returns `false` when nothing matched
    async fn delete_queued(&self, owner_id: &str, post_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Every account binding of the owner
    ///
    /// Disconnected bindings are included with `connected = false`; callers
    /// decide eligibility.
    async fn find_connected_accounts(&self, owner_id: &str) -> Result<Vec<ConnectedAccount>>;

    /// Insert or replace the owner's binding for `account.platform`
    async fn upsert_account(&self, account: &ConnectedAccount) -> Result<()>;

    /// Returns `false` when the owner had no account on that platform
    async fn disconnect_account(&self, owner_id: &str, platform: Platform) -> Result<bool>;
}
