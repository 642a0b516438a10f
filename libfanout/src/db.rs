//! SQLite storage for posts and connected accounts

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, StoreError};
use crate::store::{AccountStore, PostStore};
use crate::types::{ConnectedAccount, MediaType, Platform, Post, PostStats, PostStatus, QueueSlot};

const POST_COLUMNS: &str = "id, owner_id, content, media_type, media_url, platforms, \
                            scheduled_at, queue_position, status, created_at";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::IoError)?;
        }

        // mode=rwc creates the file on first use
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(StoreError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StoreError::MigrationError)?;

        Ok(Self { pool })
    }
}

fn row_to_post(row: &SqliteRow) -> Result<Post> {
    let id: String = row.get("id");
    let media_type: String = row.get("media_type");
    let status: String = row.get("status");

    let corrupt = |reason: String| StoreError::Corrupt {
        id: id.clone(),
        reason,
    };

    let media_type: MediaType = media_type
        .parse()
        .map_err(|_| corrupt(format!("unknown media type {}", media_type)))?;
    let status: PostStatus = status
        .parse()
        .map_err(|_| corrupt(format!("unknown status {}", status)))?;

    Ok(Post {
        id: id.clone(),
        owner_id: row.get("owner_id"),
        content: row.get("content"),
        media_type,
        media_url: row.get("media_url"),
        platforms: row.get("platforms"),
        scheduled_at: row.get("scheduled_at"),
        queue_position: row.get("queue_position"),
        status,
        created_at: row.get("created_at"),
    })
}

fn row_to_account(row: &SqliteRow) -> Result<ConnectedAccount> {
    let platform: String = row.get("platform");
    let platform: Platform = platform.parse().map_err(|_| StoreError::Corrupt {
        id: format!("account {}", row.get::<i64, _>("id")),
        reason: format!("unknown platform {}", platform),
    })?;

    let mut account = ConnectedAccount::new(
        row.get::<String, _>("owner_id").as_str(),
        platform,
        row.get("access_token"),
    );
    account.connected = row.get::<i64, _>("connected") != 0;
    account.refresh_token = row.get("refresh_token");
    account.auth_data = row.get("auth_data");
    account.platform_user = row.get("platform_user");
    account.updated_at = row.get("updated_at");
    Ok(account)
}

#[async_trait]
impl PostStore for Database {
    async fn create_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, owner_id, content, media_type, media_url, platforms,
                               scheduled_at, queue_position, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.owner_id)
        .bind(&post.content)
        .bind(post.media_type.as_str())
        .bind(&post.media_url)
        .bind(&post.platforms)
        .bind(post.scheduled_at)
        .bind(post.queue_position)
        .bind(post.status.as_str())
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::SqlxError)?;

        Ok(())
    }

    async fn get_post(&self, owner_id: &str, post_id: &str) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = ? AND owner_id = ?", POST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(post_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::SqlxError)?;

        row.as_ref().map(row_to_post).transpose()
    }

    async fn list_due_posts(&self, now: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts \
             WHERE status = 'scheduled' AND scheduled_at IS NOT NULL AND scheduled_at <= ? \
             ORDER BY scheduled_at ASC, created_at ASC",
            POST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::SqlxError)?;

        rows.iter().map(row_to_post).collect()
    }

    async fn claim_post(&self, owner_id: &str, post_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET status = 'processing'
            WHERE id = ? AND owner_id = ? AND status = 'scheduled'
            "#,
        )
        .bind(post_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_status(
        &self,
        owner_id: &str,
        post_id: &str,
        status: PostStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET status = ? WHERE id = ? AND owner_id = ?")
            .bind(status.as_str())
            .bind(post_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, owner_id: &str, slots: &[QueueSlot]) -> Result<()> {
        let mut seen = HashSet::new();
        for slot in slots {
            if !seen.insert(slot.id.as_str()) {
                return Err(StoreError::ReorderRejected(format!(
                    "post {} appears more than once",
                    slot.id
                ))
                .into());
            }
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::SqlxError)?;

        for slot in slots {
            let result = sqlx::query(
                r#"
                UPDATE posts SET queue_position = ?
                WHERE id = ? AND owner_id = ? AND status = 'queued'
                "#,
            )
            .bind(slot.position)
            .bind(&slot.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::SqlxError)?;

            if result.rows_affected() != 1 {
                tx.rollback().await.map_err(StoreError::SqlxError)?;
                return Err(StoreError::ReorderRejected(format!(
                    "post {} is not queued for this owner",
                    slot.id
                ))
                .into());
            }
        }

        tx.commit().await.map_err(StoreError::SqlxError)?;
        Ok(())
    }

    async fn list_queue(&self, owner_id: &str) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE owner_id = ? AND status = 'queued' \
             ORDER BY queue_position ASC, created_at ASC",
            POST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::SqlxError)?;

        rows.iter().map(row_to_post).collect()
    }

    async fn list_scheduled(&self, owner_id: &str) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE owner_id = ? AND status = 'scheduled' \
             ORDER BY scheduled_at ASC",
            POST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::SqlxError)?;

        rows.iter().map(row_to_post).collect()
    }

    async fn list_processing(&self, owner_id: &str) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE owner_id = ? AND status = 'processing' \
             ORDER BY scheduled_at ASC, created_at ASC",
            POST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::SqlxError)?;

        rows.iter().map(row_to_post).collect()
    }

    async fn count_by_status(&self, owner_id: &str) -> Result<PostStats> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS total FROM posts WHERE owner_id = ? GROUP BY status",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::SqlxError)?;

        let mut stats = PostStats::default();
        for row in &rows {
            let status: String = row.get("status");
            let status: PostStatus = status.parse().map_err(|_| StoreError::Corrupt {
                id: format!("owner {}", owner_id),
                reason: format!("unknown status {}", status),
            })?;
            stats.add(status, row.get("total"));
        }
        Ok(stats)
    }

    async fn next_queue_position(&self, owner_id: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(MAX(queue_position), 0) + 1 AS next_position
            FROM posts WHERE owner_id = ? AND status = 'queued'
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::SqlxError)?;

        Ok(row.get("next_position"))
    }

    async fn delete_queued(&self, owner_id: &str, post_id: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM posts WHERE id = ? AND owner_id = ? AND status = 'queued'")
                .bind(post_id)
                .bind(owner_id)
                .execute(&self.pool)
                .await
                .map_err(StoreError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountStore for Database {
    async fn find_connected_accounts(&self, owner_id: &str) -> Result<Vec<ConnectedAccount>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, platform, connected, access_token, refresh_token,
                   auth_data, platform_user, updated_at
            FROM connected_accounts WHERE owner_id = ?
            ORDER BY platform ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::SqlxError)?;

        rows.iter().map(row_to_account).collect()
    }

    async fn upsert_account(&self, account: &ConnectedAccount) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO connected_accounts (owner_id, platform, connected, access_token,
                                            refresh_token, auth_data, platform_user, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (owner_id, platform) DO UPDATE SET
                connected = excluded.connected,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                auth_data = excluded.auth_data,
                platform_user = excluded.platform_user,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&account.owner_id)
        .bind(account.platform.as_str())
        .bind(account.connected as i64)
        .bind(account.token())
        .bind(&account.refresh_token)
        .bind(&account.auth_data)
        .bind(&account.platform_user)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::SqlxError)?;

        Ok(())
    }

    async fn disconnect_account(&self, owner_id: &str, platform: Platform) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE connected_accounts SET connected = 0, updated_at = ?
            WHERE owner_id = ? AND platform = ?
            "#,
        )
        .bind(chrono::Utc::now().timestamp())
        .bind(owner_id)
        .bind(platform.as_str())
        .execute(&self.pool)
        .await
        .map_err(StoreError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }
}
