//! Leadscout engine: browser-driven discovery, enrichment and dispatch.
mod chat;
mod contacts;
mod context;
mod discovery;
mod dispatch;
mod engine;
mod enrich;
mod extract;
mod schedule;
mod session;
mod types;
mod webdriver;

pub use chat::{ChatCompletionClient, ChatSettings, CONTENT_PLACEHOLDER};
pub use contacts::{find_emails, find_websites};
pub use context::RunContext;
pub use discovery::{DiscoveryLoop, DiscoveryOutcome, DiscoverySettings};
pub use dispatch::{
    dispatch_all, outbound_messages, DispatchError, Dispatcher, OutboundMessage, MISSING_RECIPIENT,
};
pub use engine::{EngineHandle, EngineParts, EngineSettings, PauseControl};
pub use enrich::{EnrichmentOrchestrator, GenerationError, Generator};
pub use extract::{ExtractError, FeedItem, RecordExtractor, SelectorExtractor, SelectorPolicy};
pub use schedule::{
    KeywordReport, KeywordScheduler, ResultsSnapshot, RunSummary, SchedulerSettings,
    SharedResults, StopReason, MAX_WORKERS,
};
pub use session::{BrowserSession, ElementHandle, SessionError, SessionFactory};
pub use types::{ChannelProgressSink, EngineEvent, HarvestEvent, NullProgressSink, ProgressSink};
pub use webdriver::{WebDriverPool, WebDriverSession, WebDriverSettings};
