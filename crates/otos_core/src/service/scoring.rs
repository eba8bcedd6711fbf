//! Score accounting and rank derivation.

use super::engine::{Engine, EngineResult};
use crate::model::rank::Rank;
use crate::model::user::UserId;
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use log::debug;
use rusqlite::Connection;

/// Maps a cumulative score to its rank tier.
pub fn rank_of(score: i64) -> Rank {
    Rank::for_score(score)
}

impl Engine {
    /// Atomically adds `delta` to the user's score and returns the new score.
    ///
    /// No bounds are applied; the score may go negative.
    pub fn adjust_score(&self, user_id: UserId, delta: i64) -> EngineResult<i64> {
        self.store()
            .with_tx(|tx| apply_score_delta(tx, user_id, delta))
    }
}

/// Applies a score delta inside the caller's transaction.
pub(crate) fn apply_score_delta(conn: &Connection, user_id: UserId, delta: i64) -> EngineResult<i64> {
    let score = SqliteUserRepository::new(conn).add_score(user_id, delta)?;
    debug!(
        "event=score_adjust module=scoring status=ok user_id={} delta={delta} score={score}",
        user_id.0
    );
    Ok(score)
}
