//! Outbound push-message seam towards the chat transport.

use crate::model::user::ExternalId;
use async_trait::async_trait;

/// Delivery failure for one recipient. Never aborts a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery to {recipient} failed: {reason}")]
pub struct DeliveryError {
    pub recipient: ExternalId,
    pub reason: String,
}

impl DeliveryError {
    pub fn new(recipient: ExternalId, reason: impl Into<String>) -> Self {
        Self {
            recipient,
            reason: reason.into(),
        }
    }
}

/// Sends a text message to a user, e.g. through the bot API.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, recipient: ExternalId, text: &str) -> Result<(), DeliveryError>;
}
