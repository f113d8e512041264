//! Leadscout core: pure data model and state machines.
mod accumulator;
mod enrichment;
mod error;
mod ledger;
mod rate;
mod record;
mod reply;
mod session;
mod stall;
mod termination;

pub use accumulator::Accumulator;
pub use enrichment::{EnrichmentFailure, EnrichmentResult};
pub use error::ErrorKind;
pub use ledger::{DispatchEntry, DispatchLedger, DispatchStatus};
pub use rate::{BackoffPolicy, BackoffStep, RateState};
pub use record::{Entry, EntryId, HarvestMode, Lead, Record, UNKNOWN_AUTHOR};
pub use reply::{parse_generated_text, strip_wrapping, GeneratedText, ReplyError};
pub use session::DiscoverySession;
pub use stall::{StallDetector, StallSignal, LEADING_IDS, STALL_THRESHOLD};
pub use termination::{ExhaustReason, StepCheck, Termination};
