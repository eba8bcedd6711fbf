//! Core engine for OTOS, a chat-driven task tracker with scoring.
//! This crate is the single source of truth for task lifecycle, score and
//! rank invariants; chat transports call into [`Engine`].

pub mod clock;
pub mod config;
pub mod db;
pub mod digest;
pub mod input;
pub mod logging;
pub mod messenger;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use db::{open_db, open_db_in_memory, DbError, Store};
pub use digest::{format_digest, DigestJob, DigestReport, DigestSchedule};
pub use input::{parse_action, parse_task_message, Action, ActionParseError, ActionVerb, TaskDraft};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use messenger::{DeliveryError, Messenger};
pub use model::rank::Rank;
pub use model::task::{InvalidTask, NewTask, Priority, Task, TaskField, TaskId, TaskStatus};
pub use model::user::{ExternalId, User, UserId};
pub use repo::{RepoError, RepoResult};
pub use service::{
    rank_of, ActionOutcome, BroadcastReport, Completion, DailySummary, Deletion, Engine,
    EngineError, EngineResult, Profile,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
