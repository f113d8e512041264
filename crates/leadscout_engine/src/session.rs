use std::sync::Arc;

use leadscout_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("browser session is no longer alive")]
    Dead,
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("no element matches {0}")]
    NoSuchElement(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("webdriver error (status {status}): {message}")]
    Protocol { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("no spare browser session left for a new worker")]
    PoolExhausted,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::SessionLost
    }
}

/// Opaque reference to an element inside the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub id: String,
}

/// A logged-in browser the engine drives. Creation, login and teardown are
/// handled elsewhere.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, SessionError>;

    /// Markup of the page as currently rendered.
    async fn current_dom(&self) -> Result<String, SessionError>;

    async fn find_element(&self, css: &str) -> Result<ElementHandle, SessionError>;

    async fn is_alive(&self) -> bool;
}

/// Hands out browser sessions to discovery workers.
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    /// The operator's own session, used for sequential scans.
    fn primary(&self) -> Arc<dyn BrowserSession>;

    /// A separate session seeded with the primary session's cookies.
    /// The two diverge from then on; nothing is shared afterwards.
    async fn fork(&self) -> Result<Arc<dyn BrowserSession>, SessionError>;
}
