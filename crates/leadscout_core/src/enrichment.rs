use crate::{Entry, ErrorKind, GeneratedText};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub raw_payload: Option<String>,
}

/// Outcome of enriching one entry. Retries never mutate a result; each
/// entry gets exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub item_id: String,
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
    pub attempts: u32,
    pub failure: Option<EnrichmentFailure>,
}

impl EnrichmentResult {
    pub fn success(entry: &Entry, text: GeneratedText, attempts: u32) -> Self {
        Self {
            item_id: entry.record().item_id.clone(),
            recipient: entry.recipient().map(str::to_owned),
            subject: text.subject,
            body: text.body,
            attempts,
            failure: None,
        }
    }

    pub fn failed(entry: &Entry, failure: EnrichmentFailure, attempts: u32) -> Self {
        Self {
            item_id: entry.record().item_id.clone(),
            recipient: entry.recipient().map(str::to_owned),
            subject: String::new(),
            body: String::new(),
            attempts,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}
