use std::sync::Arc;
use std::time::Duration;

use leadscout_core::{
    BackoffPolicy, EnrichmentFailure, EnrichmentResult, Entry, ErrorKind, GeneratedText, Record,
    RateState, ReplyError,
};
use scout_logging::{scout_info, scout_warn};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("rate limited by generation service: {0}")]
    RateLimited(String),
    #[error("generation service returned status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("generation service returned no content")]
    EmptyReply,
    #[error(transparent)]
    Malformed(#[from] ReplyError),
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::RateLimited(_))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::RateLimited(_) => ErrorKind::RateLimited,
            GenerationError::Malformed(_) => ErrorKind::MalformedResponse,
            _ => ErrorKind::GenerationError,
        }
    }

    fn into_failure(self) -> EnrichmentFailure {
        let kind = self.kind();
        let message = self.to_string();
        let raw_payload = match self {
            GenerationError::Malformed(reply) => Some(reply.raw),
            GenerationError::RateLimited(body) if !body.is_empty() => Some(body),
            _ => None,
        };
        EnrichmentFailure {
            kind,
            message,
            raw_payload,
        }
    }
}

/// Text generation backend: one record in, one subject and body out.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, record: &Record) -> Result<GeneratedText, GenerationError>;
}

/// Sequential enrichment with backoff shared across every record of a run.
pub struct EnrichmentOrchestrator {
    generator: Arc<dyn Generator>,
    policy: BackoffPolicy,
    rate: RateState,
    request_gap: Duration,
}

impl EnrichmentOrchestrator {
    pub fn new(generator: Arc<dyn Generator>, policy: BackoffPolicy) -> Self {
        let rate = RateState::new(&policy);
        Self {
            generator,
            policy,
            rate,
            request_gap: Duration::ZERO,
        }
    }

    /// Pause between consecutive records of a batch.
    pub fn with_request_gap(mut self, request_gap: Duration) -> Self {
        self.request_gap = request_gap;
        self
    }

    pub fn rate_state(&self) -> &RateState {
        &self.rate
    }

    /// Produce exactly one result for `entry`, retrying rate-limited
    /// attempts up to the policy's attempt limit.
    pub async fn enrich(&mut self, entry: &Entry) -> EnrichmentResult {
        let record = entry.record();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.generator.generate(record).await {
                Ok(text) => {
                    self.rate.on_success(&self.policy);
                    return EnrichmentResult::success(entry, text, attempts);
                }
                Err(err) if err.is_rate_limited() => {
                    let step = self.rate.on_rate_limited(&self.policy);
                    scout_warn!(
                        "Rate limited on {} (attempt {}/{}), waiting {:?}",
                        record.item_id,
                        attempts,
                        max_attempts,
                        step.wait
                    );
                    tokio::time::sleep(step.wait).await;
                    if let Some(cooldown) = step.cooldown {
                        scout_warn!("Repeated rate limiting, cooling down for {:?}", cooldown);
                        tokio::time::sleep(cooldown).await;
                    }
                    if attempts >= max_attempts {
                        return EnrichmentResult::failed(entry, err.into_failure(), attempts);
                    }
                }
                Err(err) => {
                    self.rate.on_other_error(&self.policy);
                    scout_warn!("Generation failed for {}: {}", record.item_id, err);
                    return EnrichmentResult::failed(entry, err.into_failure(), attempts);
                }
            }
        }
    }

    /// Enrich entries in order, reporting each result as soon as it exists.
    /// Each batch is a new run and starts from the base delay.
    pub async fn enrich_batch<F>(&mut self, entries: &[Entry], mut on_result: F) -> Vec<EnrichmentResult>
    where
        F: FnMut(&EnrichmentResult) + Send,
    {
        self.rate = RateState::new(&self.policy);
        let mut results = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if index > 0 && !self.request_gap.is_zero() {
                tokio::time::sleep(self.request_gap).await;
            }
            let result = self.enrich(entry).await;
            on_result(&result);
            results.push(result);
        }
        let succeeded = results.iter().filter(|result| result.is_success()).count();
        scout_info!(
            "Enriched {} entries: {} succeeded, {} failed",
            results.len(),
            succeeded,
            results.len() - succeeded
        );
        results
    }
}
