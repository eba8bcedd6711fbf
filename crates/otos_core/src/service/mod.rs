//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the registry, ledger, scoring and
//!   daily reporting use-cases.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Each public operation runs in a single store transaction, so a score
//!   delta is only ever applied together with the task transition that
//!   caused it.
//! - Expected outcomes are `EngineError` variants; only
//!   `EngineError::Persistence` signals an unexpected failure.

mod broadcast;
mod engine;
mod ledger;
mod registry;
mod report;
mod scoring;

pub use broadcast::BroadcastReport;
pub use engine::{Engine, EngineError, EngineResult};
pub use ledger::{ActionOutcome, Completion, Deletion};
pub use registry::Profile;
pub use report::DailySummary;
pub use scoring::rank_of;
