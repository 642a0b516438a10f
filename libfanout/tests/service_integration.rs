//! Integration tests for FanoutService
//!
//! Exercises posting, queue management and account handling through the
//! facade, with simulated credentials and no provider latency.

mod common;

use common::FlakyPosts;
use libfanout::config::{DatabaseConfig, DispatchConfig, EndpointsConfig};
use libfanout::error::StoreError;
use libfanout::publishers::PublisherRegistry;
use libfanout::service::posting::{PostRequest, PostingService};
use libfanout::{
    AccountStore, Config, ConnectedAccount, Database, Dispatcher, FanoutError, FanoutService,
    MediaType, Platform, PostStatus, PostStore, QueueSlot, ACCOUNT_NOT_CONNECTED,
};
use std::sync::Arc;
use tempfile::TempDir;

async fn setup_test_service() -> (FanoutService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let mut config = Config::default_config();
    config.database = DatabaseConfig {
        path: db_path.to_str().unwrap().to_string(),
    };
    config.dispatch = DispatchConfig {
        timeout_secs: 5,
        simulated_latency: false,
    };

    let service = FanoutService::from_config(config).await.unwrap();
    (service, temp_dir)
}

fn text_post(content: &str, platforms: &[Platform]) -> PostRequest {
    PostRequest {
        content: content.to_string(),
        platforms: platforms.to_vec(),
        ..Default::default()
    }
}

fn queued_post(content: &str) -> PostRequest {
    PostRequest {
        defer: true,
        ..text_post(content, &[Platform::Twitter])
    }
}

#[tokio::test]
async fn test_immediate_post_publishes() {
    let (service, _temp_dir) = setup_test_service().await;
    service
        .accounts()
        .connect_simulated("alice", Platform::Twitter)
        .await
        .unwrap();
    service
        .accounts()
        .connect_simulated("alice", Platform::Facebook)
        .await
        .unwrap();

    let response = service
        .posting()
        .submit("alice", text_post("Hello", &[Platform::Twitter, Platform::Facebook]))
        .await
        .unwrap();

    let results = response.results.expect("immediate dispatch returns results");
    assert_eq!(results.len(), 2);
    assert!(results[0].external_post_id.as_deref().unwrap().starts_with("tweet_"));
    assert!(results[1].external_post_id.as_deref().unwrap().starts_with("fb_post_"));
    assert_eq!(response.post.status, PostStatus::Published);

    let stored = service
        .database()
        .get_post("alice", &response.post.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, PostStatus::Published);
}

#[tokio::test]
async fn test_immediate_post_without_accounts_fails() {
    let (service, _temp_dir) = setup_test_service().await;

    let response = service
        .posting()
        .submit("alice", text_post("Hello", &[Platform::Linkedin]))
        .await
        .unwrap();

    let results = response.results.unwrap();
    assert_eq!(results[0].error.as_deref(), Some(ACCOUNT_NOT_CONNECTED));
    assert_eq!(response.post.status, PostStatus::Failed);
}

#[tokio::test]
async fn test_scheduled_post_waits_for_scheduler() {
    let (service, _temp_dir) = setup_test_service().await;
    service
        .accounts()
        .connect_simulated("alice", Platform::Twitter)
        .await
        .unwrap();

    let past = chrono::Utc::now().timestamp() - 60;
    let response = service
        .posting()
        .submit(
            "alice",
            PostRequest {
                scheduled_at: Some(past),
                ..text_post("Later", &[Platform::Twitter])
            },
        )
        .await
        .unwrap();

    assert!(response.results.is_none());
    assert_eq!(response.post.status, PostStatus::Scheduled);

    let scheduled = service.queue().scheduled("alice").await.unwrap();
    assert_eq!(scheduled.len(), 1);

    let run = service.scheduler().run_once().await.unwrap();
    assert_eq!(run.processed_count, 1);

    let stored = service
        .database()
        .get_post("alice", &response.post.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, PostStatus::Published);
}

#[tokio::test]
async fn test_deferred_posts_append_to_queue() {
    let (service, _temp_dir) = setup_test_service().await;

    let first = service.posting().submit("alice", queued_post("one")).await.unwrap();
    let second = service.posting().submit("alice", queued_post("two")).await.unwrap();
    let other = service.posting().submit("bob", queued_post("bob's")).await.unwrap();

    assert_eq!(first.post.queue_position, Some(1));
    assert_eq!(second.post.queue_position, Some(2));
    assert_eq!(other.post.queue_position, Some(1));
    assert_eq!(first.post.status, PostStatus::Queued);

    let queue = service.queue().list("alice").await.unwrap();
    let contents: Vec<&str> = queue.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two"]);
}

#[tokio::test]
async fn test_swap_reorders_queue() {
    let (service, _temp_dir) = setup_test_service().await;
    let first = service.posting().submit("alice", queued_post("one")).await.unwrap();
    let second = service.posting().submit("alice", queued_post("two")).await.unwrap();

    service
        .queue()
        .swap("alice", &first.post.id, &second.post.id)
        .await
        .unwrap();

    let queue = service.queue().list("alice").await.unwrap();
    assert_eq!(queue[0].id, second.post.id);
    assert_eq!(queue[1].id, first.post.id);
}

#[tokio::test]
async fn test_reorder_with_foreign_post_changes_nothing() {
    let (service, _temp_dir) = setup_test_service().await;
    let mine = service.posting().submit("alice", queued_post("mine")).await.unwrap();
    let theirs = service.posting().submit("bob", queued_post("theirs")).await.unwrap();

    let result = service
        .queue()
        .reorder(
            "alice",
            &[
                QueueSlot { id: mine.post.id.clone(), position: 7 },
                QueueSlot { id: theirs.post.id.clone(), position: 8 },
            ],
        )
        .await;

    assert!(matches!(
        result,
        Err(FanoutError::Store(StoreError::ReorderRejected(_)))
    ));
    let queue = service.queue().list("alice").await.unwrap();
    assert_eq!(queue[0].queue_position, Some(1));
}

#[tokio::test]
async fn test_delete_is_owner_scoped() {
    let (service, _temp_dir) = setup_test_service().await;
    let post = service.posting().submit("alice", queued_post("mine")).await.unwrap();

    assert!(!service.queue().delete("bob", &post.post.id).await.unwrap());
    assert!(service.queue().delete("alice", &post.post.id).await.unwrap());
    assert!(service.queue().list("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_errors_store_nothing() {
    let (service, _temp_dir) = setup_test_service().await;

    let err = service
        .posting()
        .submit("alice", text_post("", &[Platform::Twitter]))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 3);

    let err = service
        .posting()
        .submit(
            "alice",
            PostRequest {
                media_type: MediaType::Image,
                ..text_post("Caption", &[Platform::Instagram])
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FanoutError::Validation(_)));

    assert!(service.queue().list("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_account_lifecycle() {
    let (service, _temp_dir) = setup_test_service().await;
    let accounts = service.accounts();

    accounts
        .connect("alice", Platform::Linkedin, "live-token".to_string(), Some("urn:li:person:1".to_string()))
        .await
        .unwrap();
    accounts.connect_simulated("alice", Platform::Linkedin).await.unwrap();

    let listed = accounts.list("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].simulated);
    assert!(listed[0].connected);

    assert!(accounts.disconnect("alice", Platform::Linkedin).await.unwrap());
    let listed = accounts.list("alice").await.unwrap();
    assert!(!listed[0].connected);

    assert!(!accounts.disconnect("alice", Platform::Twitter).await.unwrap());
}

#[tokio::test]
async fn test_immediate_post_returns_results_when_status_write_fails() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("flaky.db");
    let db = Arc::new(Database::new(db_path.to_str().unwrap()).await.unwrap());
    db.upsert_account(&ConnectedAccount::new(
        "alice",
        Platform::Twitter,
        "mock_alice_twitter".to_string(),
    ))
    .await
    .unwrap();

    let registry = PublisherRegistry::new(&EndpointsConfig::default(), false).unwrap();
    let posting = PostingService::new(
        Arc::new(FlakyPosts::failing_status(db.clone())),
        Arc::new(Dispatcher::new(db.clone(), registry)),
    );

    let response = posting
        .submit("alice", text_post("Hello anyway", &[Platform::Twitter]))
        .await
        .unwrap();

    let results = response.results.expect("immediate dispatch returns results");
    assert!(results[0].external_post_id.as_deref().unwrap().starts_with("tweet_"));
    assert_eq!(response.post.status, PostStatus::Published);

    let stored = db.get_post("alice", &response.post.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Draft);
}
