//! Engine configuration.
//!
//! Defaults reproduce the production rules: a 30 minute completion gate, a
//! 2 point deletion penalty and a digest at 00:25 Tehran time (UTC+03:30,
//! no daylight saving).

use crate::model::user::ExternalId;
use chrono::{Duration, FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPLETION_GATE_MINUTES: i64 = 30;
pub const DEFAULT_DELETE_PENALTY: i64 = 2;
pub const DEFAULT_UTC_OFFSET_SECONDS: i32 = 3 * 3600 + 30 * 60;
pub const DEFAULT_DIGEST_TIME: &str = "00:25";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum task age before it may be completed.
    pub completion_gate_minutes: i64,
    /// Points removed from the owner when a task is deleted.
    pub delete_penalty: i64,
    /// The one timezone used for every "today" computation.
    pub utc_offset_seconds: i32,
    /// Local wall-clock time of the daily digest, `HH:MM`.
    pub digest_time: String,
    /// Whether the digest covers the previous local day (a run shortly after
    /// midnight) or the day it fires on (an evening run).
    pub digest_reports_previous_day: bool,
    /// Identity allowed to broadcast. `None` disables broadcasting.
    pub admin: Option<ExternalId>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            completion_gate_minutes: DEFAULT_COMPLETION_GATE_MINUTES,
            delete_penalty: DEFAULT_DELETE_PENALTY,
            utc_offset_seconds: DEFAULT_UTC_OFFSET_SECONDS,
            digest_time: DEFAULT_DIGEST_TIME.to_string(),
            digest_reports_previous_day: true,
            admin: None,
        }
    }
}

/// Configuration value that cannot be turned into runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("utc offset `{0}` seconds is out of range")]
    InvalidOffset(i32),
    #[error("digest time `{0}` must be HH:MM")]
    InvalidDigestTime(String),
    #[error("completion gate must not be negative, got {0} minutes")]
    NegativeGate(i64),
    #[error("delete penalty must not be negative, got {0}")]
    NegativePenalty(i64),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.offset()?;
        self.digest_at()?;
        if self.completion_gate_minutes < 0 {
            return Err(ConfigError::NegativeGate(self.completion_gate_minutes));
        }
        if self.delete_penalty < 0 {
            return Err(ConfigError::NegativePenalty(self.delete_penalty));
        }
        Ok(())
    }

    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_seconds)
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_seconds))
    }

    pub fn digest_at(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.digest_time.trim(), "%H:%M")
            .map_err(|_| ConfigError::InvalidDigestTime(self.digest_time.clone()))
    }

    pub fn completion_gate(&self) -> Duration {
        Duration::minutes(self.completion_gate_minutes)
    }
}
