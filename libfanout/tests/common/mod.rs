//! Store wrappers that delegate to SQLite but fail on demand

#![allow(dead_code)]

use async_trait::async_trait;
use libfanout::error::StoreError;
use libfanout::{
    AccountStore, ConnectedAccount, Database, FanoutError, Platform, Post, PostStats,
    PostStatus, PostStore, QueueSlot, Result,
};
use std::sync::Arc;

pub fn io_failure() -> FanoutError {
    StoreError::IoError(std::io::Error::new(std::io::ErrorKind::Other, "disk full")).into()
}

/// Can fail listing due posts or status writes
pub struct FlakyPosts {
    pub inner: Arc<Database>,
    pub fail_list: bool,
    pub fail_status: bool,
}

impl FlakyPosts {
    pub fn failing_status(inner: Arc<Database>) -> Self {
        Self {
            inner,
            fail_list: false,
            fail_status: true,
        }
    }
}

#[async_trait]
impl PostStore for FlakyPosts {
    async fn create_post(&self, post: &Post) -> Result<()> {
        self.inner.create_post(post).await
    }

    async fn get_post(&self, owner_id: &str, post_id: &str) -> Result<Option<Post>> {
        self.inner.get_post(owner_id, post_id).await
    }

    async fn list_due_posts(&self, now: i64) -> Result<Vec<Post>> {
        if self.fail_list {
            return Err(io_failure());
        }
        self.inner.list_due_posts(now).await
    }

    async fn claim_post(&self, owner_id: &str, post_id: &str) -> Result<bool> {
        self.inner.claim_post(owner_id, post_id).await
    }

    async fn update_status(
        &self,
        owner_id: &str,
        post_id: &str,
        status: PostStatus,
    ) -> Result<bool> {
        if self.fail_status {
            return Err(io_failure());
        }
        self.inner.update_status(owner_id, post_id, status).await
    }

    async fn reorder(&self, owner_id: &str, slots: &[QueueSlot]) -> Result<()> {
        self.inner.reorder(owner_id, slots).await
    }

    async fn list_queue(&self, owner_id: &str) -> Result<Vec<Post>> {
        self.inner.list_queue(owner_id).await
    }

    async fn list_scheduled(&self, owner_id: &str) -> Result<Vec<Post>> {
        self.inner.list_scheduled(owner_id).await
    }

    async fn list_processing(&self, owner_id: &str) -> Result<Vec<Post>> {
        self.inner.list_processing(owner_id).await
    }

    async fn count_by_status(&self, owner_id: &str) -> Result<PostStats> {
        self.inner.count_by_status(owner_id).await
    }

    async fn next_queue_position(&self, owner_id: &str) -> Result<i64> {
        self.inner.next_queue_position(owner_id).await
    }

    async fn delete_queued(&self, owner_id: &str, post_id: &str) -> Result<bool> {
        self.inner.delete_queued(owner_id, post_id).await
    }
}

/// Account lookups for `fail_owner` return an I/O error
pub struct BrokenAccounts {
    pub inner: Arc<Database>,
    pub fail_owner: String,
}

#[async_trait]
impl AccountStore for BrokenAccounts {
    async fn find_connected_accounts(&self, owner_id: &str) -> Result<Vec<ConnectedAccount>> {
        if owner_id == self.fail_owner {
            return Err(io_failure());
        }
        self.inner.find_connected_accounts(owner_id).await
    }

    async fn upsert_account(&self, account: &ConnectedAccount) -> Result<()> {
        self.inner.upsert_account(account).await
    }

    async fn disconnect_account(&self, owner_id: &str, platform: Platform) -> Result<bool> {
        self.inner.disconnect_account(owner_id, platform).await
    }
}
