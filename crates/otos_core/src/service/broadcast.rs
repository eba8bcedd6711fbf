//! Administrator broadcast.

use super::engine::{Engine, EngineError, EngineResult};
use crate::messenger::Messenger;
use crate::model::user::ExternalId;
use log::{info, warn};
use std::sync::Arc;

/// Per-recipient delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl Engine {
    /// Sends `text` to every registered user on behalf of the administrator.
    ///
    /// Delivery is best-effort: failures are logged and counted per
    /// recipient and never abort the fan-out.
    pub async fn broadcast(
        self: &Arc<Self>,
        sender: ExternalId,
        text: &str,
        messenger: &dyn Messenger,
    ) -> EngineResult<BroadcastReport> {
        if self.config().admin != Some(sender) {
            return Err(EngineError::NotAdmin(sender));
        }

        let recipients = self
            .run_blocking(|engine| engine.all_registered_users())
            .await?;
        let mut report = BroadcastReport::default();
        for recipient in recipients {
            match messenger.send(recipient, text).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!("event=broadcast_send module=broadcast status=error recipient={recipient} error={err}");
                    report.failed += 1;
                }
            }
        }

        info!(
            "event=broadcast module=broadcast status=ok delivered={} failed={}",
            report.delivered, report.failed
        );
        Ok(report)
    }
}
