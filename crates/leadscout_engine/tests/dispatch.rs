mod common;

use std::sync::Mutex;
use std::time::Duration;

use leadscout_core::{DispatchStatus, EnrichmentFailure, EnrichmentResult, ErrorKind};
use leadscout_engine::{
    dispatch_all, outbound_messages, DispatchError, Dispatcher, OutboundMessage, MISSING_RECIPIENT,
};
use pretty_assertions::assert_eq;
use tokio::time::Instant;

use common::init_logging;

/// Records when each recipient was sent to and rejects one address.
struct RecordingDispatcher {
    started: Instant,
    reject: &'static str,
    sends: Mutex<Vec<(String, Duration)>>,
}

impl RecordingDispatcher {
    fn new(reject: &'static str) -> Self {
        init_logging();
        Self {
            started: Instant::now(),
            reject,
            sends: Mutex::new(Vec::new()),
        }
    }

    fn sends(&self) -> Vec<(String, Duration)> {
        self.sends.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError> {
        self.sends
            .lock()
            .unwrap()
            .push((message.recipient.clone(), self.started.elapsed()));
        if message.recipient == self.reject {
            return Err(DispatchError::Rejected("mailbox unavailable".to_string()));
        }
        Ok(())
    }
}

fn message(recipient: &str) -> OutboundMessage {
    OutboundMessage {
        recipient: recipient.to_string(),
        subject: "Hello".to_string(),
        body: "Saw your post".to_string(),
        sender_display_name: "Studio".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn delays_only_between_sends_and_failures_do_not_stop() {
    let dispatcher = RecordingDispatcher::new("b@x.io");
    let messages = vec![message("a@x.io"), message("b@x.io"), message("c@x.io")];
    let started = Instant::now();

    let ledger = dispatch_all(&dispatcher, &messages, Duration::from_secs(3)).await;

    assert_eq!(
        dispatcher.sends(),
        vec![
            ("a@x.io".to_string(), Duration::ZERO),
            ("b@x.io".to_string(), Duration::from_secs(3)),
            ("c@x.io".to_string(), Duration::from_secs(6)),
        ]
    );
    assert_eq!(started.elapsed(), Duration::from_secs(6));
    assert_eq!((ledger.total, ledger.sent, ledger.failed), (3, 2, 1));
    assert!(ledger.is_complete());
    assert_eq!(ledger.entries[1].status, DispatchStatus::Failed);
    assert_eq!(ledger.entries[1].message, "mailbox unavailable");
}

#[tokio::test(start_paused = true)]
async fn empty_recipient_fails_without_a_send() {
    let dispatcher = RecordingDispatcher::new("");
    let messages = vec![message("  "), message("a@x.io")];

    let ledger = dispatch_all(&dispatcher, &messages, Duration::from_secs(3)).await;

    assert_eq!(dispatcher.sends().len(), 1);
    assert_eq!(ledger.entries[0].status, DispatchStatus::Failed);
    assert_eq!(ledger.entries[0].message, MISSING_RECIPIENT);
    assert_eq!(ledger.entries[1].status, DispatchStatus::Sent);
    assert_eq!((ledger.sent, ledger.failed), (1, 1));
}

#[test]
fn outbound_messages_skip_failed_results() {
    let ok = EnrichmentResult {
        item_id: "urn:1".to_string(),
        recipient: Some("a@x.io".to_string()),
        subject: "Hi".to_string(),
        body: "Body".to_string(),
        attempts: 1,
        failure: None,
    };
    let failed = EnrichmentResult {
        item_id: "urn:2".to_string(),
        recipient: Some("b@x.io".to_string()),
        subject: String::new(),
        body: String::new(),
        attempts: 3,
        failure: Some(EnrichmentFailure {
            kind: ErrorKind::RateLimited,
            message: "rate limited".to_string(),
            raw_payload: None,
        }),
    };

    let messages = outbound_messages(&[ok, failed], "Studio");

    assert_eq!(
        messages,
        vec![OutboundMessage {
            recipient: "a@x.io".to_string(),
            subject: "Hi".to_string(),
            body: "Body".to_string(),
            sender_display_name: "Studio".to_string(),
        }]
    );
}
