//! Fanout - multi-platform social publishing and scheduling
//!
//! This library provides the dispatch-and-scheduling engine behind the
//! `fan-*` tools: platform publishers, the dispatch coordinator, the
//! scheduler, and the SQLite-backed post lifecycle store.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod publishers;
pub mod scheduler;
pub mod scheduling;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use dispatch::{DispatchRequest, DispatchResult, Dispatcher};
pub use error::{FanoutError, PublishError, Result, ACCOUNT_NOT_CONNECTED};
pub use scheduler::{Scheduler, SchedulerRun};
pub use service::FanoutService;
pub use store::{AccountStore, PostStore};
pub use types::{
    ConnectedAccount, MediaType, Platform, Post, PostStats, PostStatus, QueueSlot,
};
