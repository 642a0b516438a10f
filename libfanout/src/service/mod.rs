//! Service layer for Fanout
//!
//! `FanoutService` wires the SQLite store, the publisher registry, the
//! dispatcher and the scheduler together and hands out the sub-services the
//! `fan-*` binaries work with:
//!
//! - `PostingService`: submit a post to publish now, schedule or queue
//! - `QueueService`: list, reorder, swap and delete queued posts
//! - `AccountService`: connect and disconnect platform accounts
//! - `Scheduler`: process due scheduled posts
//!
//! ```no_run
//! use libfanout::service::FanoutService;
//! use libfanout::service::posting::PostRequest;
//! use libfanout::Platform;
//!
//! # async fn example() -> libfanout::Result<()> {
//! let service = FanoutService::new().await?;
//!
//! let request = PostRequest {
//!     content: "Launching today".to_string(),
//!     platforms: vec![Platform::Twitter, Platform::Linkedin],
//!     ..Default::default()
//! };
//! let response = service.posting().submit("local", request).await?;
//! println!("{} is {}", response.post.id, response.post.status);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod posting;
pub mod queue;

use std::sync::Arc;
use std::time::Duration;

use self::accounts::AccountService;
use self::posting::PostingService;
use self::queue::QueueService;
use crate::error::ConfigError;
use crate::publishers::PublisherRegistry;
use crate::{Config, Database, Dispatcher, Result, Scheduler};

pub struct FanoutService {
    db: Arc<Database>,
    config: Arc<Config>,
    posting: PostingService,
    queue: QueueService,
    accounts: AccountService,
    scheduler: Scheduler,
}

impl FanoutService {
    /// Build from the default config location, or built-in defaults when
    /// there is no config file
    pub async fn new() -> Result<Self> {
        let config = Config::load_or_default()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> Result<Self> {
        let db_path = crate::config::resolve_db_path(Some(&config.database.path))?;
        let db_path_str = db_path
            .to_str()
            .ok_or_else(|| ConfigError::MissingField("Invalid database path".to_string()))?;
        let db = Arc::new(Database::new(db_path_str).await?);

        let publishers =
            PublisherRegistry::new(&config.endpoints, config.dispatch.simulated_latency)?;

        Ok(Self::with_parts(db, publishers, config))
    }

    /// Assemble from an open database and a prepared registry
    pub fn with_parts(db: Arc<Database>, publishers: PublisherRegistry, config: Config) -> Self {
        let dispatcher = Arc::new(
            Dispatcher::new(db.clone(), publishers)
                .with_timeout(Duration::from_secs(config.dispatch.timeout_secs)),
        );

        let posting = PostingService::new(db.clone(), Arc::clone(&dispatcher));
        let queue = QueueService::new(db.clone());
        let accounts = AccountService::new(db.clone());
        let scheduler = Scheduler::new(db.clone(), dispatcher);

        Self {
            db,
            config: Arc::new(config),
            posting,
            queue,
            accounts,
            scheduler,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn posting(&self) -> &PostingService {
        &self.posting
    }

    pub fn queue(&self) -> &QueueService {
        &self.queue
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
