//! User registry use-cases.

use super::engine::{require_user, Engine, EngineError, EngineResult};
use super::scoring::rank_of;
use crate::model::rank::Rank;
use crate::model::user::{ExternalId, User};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Read model for the profile screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: String,
    pub score: i64,
    pub rank: Rank,
    pub joined_at: DateTime<Utc>,
    pub pending_count: u64,
}

impl Engine {
    /// Registers a new user with score 0.
    ///
    /// Fails with `AlreadyRegistered` when the identity is known.
    pub fn register(&self, external_id: ExternalId, display_name: &str) -> EngineResult<User> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(EngineError::EmptyDisplayName);
        }

        let joined_at = self.now();
        let user = self.store().with_tx(|tx| -> EngineResult<User> {
            let repo = SqliteUserRepository::new(tx);
            if repo.get_by_external_id(external_id)?.is_some() {
                return Err(EngineError::AlreadyRegistered(external_id));
            }
            Ok(repo.create_user(external_id, display_name, joined_at)?)
        })?;

        info!("event=user_register module=registry status=ok external_id={external_id}");
        Ok(user)
    }

    pub fn lookup(&self, external_id: ExternalId) -> EngineResult<Option<User>> {
        self.store().with_conn(|conn| -> EngineResult<Option<User>> {
            Ok(SqliteUserRepository::new(conn).get_by_external_id(external_id)?)
        })
    }

    pub fn profile(&self, external_id: ExternalId) -> EngineResult<Profile> {
        let profile = self.store().with_conn(|conn| -> EngineResult<Profile> {
            let user = require_user(conn, external_id)?;
            let pending_count = SqliteTaskRepository::new(conn).count_pending(user.id)?;
            Ok(Profile {
                rank: rank_of(user.score),
                display_name: user.display_name,
                score: user.score,
                joined_at: user.joined_at,
                pending_count,
            })
        })?;

        debug!("event=user_profile module=registry status=ok external_id={external_id}");
        Ok(profile)
    }
}
