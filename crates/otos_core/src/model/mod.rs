//! Domain model for users, tasks and ranks.
//!
//! # Invariants
//! - At most one user per external identity.
//! - A task belongs to exactly one user and ownership never transfers.
//! - Deleted tasks are physically removed; only `pending` and `done` are
//!   representable states.

pub mod rank;
pub mod task;
pub mod user;
