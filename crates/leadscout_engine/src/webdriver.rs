//! Browser sessions over the W3C WebDriver HTTP protocol.
//!
//! Sessions are created and logged in by whoever runs the driver; this
//! module only attaches to them by id.
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use scout_logging::{scout_debug, scout_info, scout_warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{BrowserSession, ElementHandle, SessionError, SessionFactory};

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebDriverSettings {
    pub server_url: String,
    pub primary_session: String,
    /// Pre-created sessions handed to concurrent workers.
    pub spare_sessions: Vec<String>,
    /// Page opened in a spare session before cookies are copied into it.
    pub cookie_origin: String,
    pub request_timeout: Duration,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9515".to_string(),
            primary_session: String::new(),
            spare_sessions: Vec::new(),
            cookie_origin: "https://www.linkedin.com".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct WebDriverSession {
    http: reqwest::Client,
    server_url: String,
    session_id: String,
}

impl WebDriverSession {
    pub fn attach(
        http: reqwest::Client,
        server_url: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/session/{}/{}", self.server_url, self.session_id, command)
    }

    async fn get(&self, command: &str) -> Result<Value, SessionError> {
        let response = self
            .http
            .get(self.endpoint(command))
            .send()
            .await
            .map_err(|err| SessionError::Network(err.to_string()))?;
        read_value(response).await
    }

    async fn post(&self, command: &str, body: Value) -> Result<Value, SessionError> {
        let response = self
            .http
            .post(self.endpoint(command))
            .json(&body)
            .send()
            .await
            .map_err(|err| SessionError::Network(err.to_string()))?;
        read_value(response).await
    }

    pub async fn cookies(&self) -> Result<Vec<Value>, SessionError> {
        match self.get("cookie").await? {
            Value::Array(cookies) => Ok(cookies),
            other => Err(SessionError::Protocol {
                status: 200,
                message: format!("expected a cookie list, got {other}"),
            }),
        }
    }

    pub async fn add_cookie(&self, cookie: Value) -> Result<(), SessionError> {
        self.post("cookie", json!({ "cookie": cookie })).await?;
        Ok(())
    }
}

async fn read_value(response: reqwest::Response) -> Result<Value, SessionError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| SessionError::Network(err.to_string()))?;
    let envelope: Envelope = serde_json::from_str(&text).map_err(|err| SessionError::Protocol {
        status: status.as_u16(),
        message: format!("unreadable reply: {err}"),
    })?;
    if status.is_success() {
        return Ok(envelope.value);
    }
    let wire: Option<WireError> = serde_json::from_value(envelope.value).ok();
    Err(match wire {
        Some(wire) => match wire.error.as_str() {
            "invalid session id" | "no such window" => SessionError::Dead,
            "no such element" => SessionError::NoSuchElement(wire.message),
            "javascript error" => SessionError::Script(wire.message),
            _ => SessionError::Protocol {
                status: status.as_u16(),
                message: format!("{}: {}", wire.error, wire.message),
            },
        },
        None => SessionError::Protocol {
            status: status.as_u16(),
            message: text,
        },
    })
}

#[async_trait::async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.post("url", json!({ "url": url }))
            .await
            .map(|_| ())
            .map_err(|err| match err {
                SessionError::Dead => SessionError::Dead,
                other => SessionError::Navigation {
                    url: url.to_string(),
                    message: other.to_string(),
                },
            })
    }

    async fn execute_script(&self, script: &str) -> Result<Value, SessionError> {
        self.post("execute/sync", json!({ "script": script, "args": [] }))
            .await
    }

    async fn current_dom(&self) -> Result<String, SessionError> {
        match self.get("source").await? {
            Value::String(source) => Ok(source),
            other => Err(SessionError::Protocol {
                status: 200,
                message: format!("expected page source, got {other}"),
            }),
        }
    }

    async fn find_element(&self, css: &str) -> Result<ElementHandle, SessionError> {
        let value = self
            .post("element", json!({ "using": "css selector", "value": css }))
            .await?;
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementHandle { id: id.to_string() })
            .ok_or_else(|| SessionError::NoSuchElement(css.to_string()))
    }

    async fn is_alive(&self) -> bool {
        self.get("url").await.is_ok()
    }
}

/// The operator's session plus a stack of spare sessions for workers.
pub struct WebDriverPool {
    primary: Arc<WebDriverSession>,
    spares: Mutex<Vec<WebDriverSession>>,
    cookie_origin: String,
}

impl WebDriverPool {
    pub fn new(settings: &WebDriverSettings) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SessionError::Network(err.to_string()))?;
        let primary = WebDriverSession::attach(
            http.clone(),
            settings.server_url.as_str(),
            settings.primary_session.as_str(),
        );
        // Handed out from the end, so reverse to keep configuration order.
        let spares = settings
            .spare_sessions
            .iter()
            .rev()
            .map(|id| WebDriverSession::attach(http.clone(), settings.server_url.as_str(), id.as_str()))
            .collect();
        Ok(Self {
            primary: Arc::new(primary),
            spares: Mutex::new(spares),
            cookie_origin: settings.cookie_origin.clone(),
        })
    }

    pub fn spare_count(&self) -> usize {
        self.spares.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn take_spare(&self) -> Option<WebDriverSession> {
        self.spares
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }
}

#[async_trait::async_trait]
impl SessionFactory for WebDriverPool {
    fn primary(&self) -> Arc<dyn BrowserSession> {
        self.primary.clone()
    }

    async fn fork(&self) -> Result<Arc<dyn BrowserSession>, SessionError> {
        let spare = self.take_spare().ok_or(SessionError::PoolExhausted)?;
        let cookies = self.primary.cookies().await?;
        spare.navigate(&self.cookie_origin).await?;

        let mut copied = 0;
        for cookie in cookies {
            let name = cookie
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            match spare.add_cookie(cookie).await {
                Ok(()) => copied += 1,
                Err(err) => scout_debug!("Cookie {} not copied: {}", name, err),
            }
        }
        if copied == 0 {
            scout_warn!("No cookies copied into session {}", spare.session_id());
        }
        scout_info!(
            "Forked session {} with {} cookies",
            spare.session_id(),
            copied
        );
        Ok(Arc::new(spare))
    }
}
