use std::time::Duration;

use leadscout_core::{DispatchLedger, EnrichmentResult, ErrorKind};
use scout_logging::{scout_info, scout_warn};
use thiserror::Error;

pub const MISSING_RECIPIENT: &str = "No email address provided";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub sender_display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::DispatchFailure
    }
}

/// Delivers one message. Transport and credentials are the implementor's
/// concern.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError>;
}

/// Messages for every successful enrichment result, in order.
pub fn outbound_messages(results: &[EnrichmentResult], sender_display_name: &str) -> Vec<OutboundMessage> {
    results
        .iter()
        .filter(|result| result.is_success())
        .map(|result| OutboundMessage {
            recipient: result.recipient.clone().unwrap_or_default(),
            subject: result.subject.clone(),
            body: result.body.clone(),
            sender_display_name: sender_display_name.to_string(),
        })
        .collect()
}

/// Send messages one at a time, waiting `delay` between sends. A failed
/// message never stops the ones after it.
pub async fn dispatch_all(
    dispatcher: &dyn Dispatcher,
    messages: &[OutboundMessage],
    delay: Duration,
) -> DispatchLedger {
    let mut ledger = DispatchLedger::new(messages.len());
    for (index, message) in messages.iter().enumerate() {
        let recipient = message.recipient.trim();
        if recipient.is_empty() {
            scout_warn!("Skipping message {}: {}", index + 1, MISSING_RECIPIENT);
            ledger.record_failed(recipient, MISSING_RECIPIENT);
            continue;
        }

        match dispatcher.send(message).await {
            Ok(()) => ledger.record_sent(recipient, "Sent"),
            Err(err) => {
                scout_warn!("Sending to {} failed ({}): {}", recipient, err.kind(), err);
                ledger.record_failed(recipient, err.to_string());
            }
        }

        let last = index + 1 == messages.len();
        if !last && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    scout_info!(
        "Dispatch finished: {} sent, {} failed of {}",
        ledger.sent,
        ledger.failed,
        ledger.total
    );
    ledger
}
