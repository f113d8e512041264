#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use leadscout_core::{GeneratedText, Record};
use leadscout_engine::{
    BrowserSession, ElementHandle, GenerationError, Generator, HarvestEvent, ProgressSink,
    SessionError, SessionFactory,
};
use serde_json::Value;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(scout_logging::initialize_for_tests);
}

/// A feed post in the markup shape the default selector policy expects.
pub fn post(id: &str, author: &str, body: &str) -> String {
    let slug = author.to_lowercase().replace(' ', "-");
    format!(
        r#"<div data-urn="{id}"><span class="update-components-actor__name">{author}</span><a href="/in/{slug}/">profile</a><span class="update-components-text">{body}</span></div>"#
    )
}

/// A page listing one post per id, authored by `Author <id>`.
pub fn feed(ids: &[&str]) -> String {
    let posts: String = ids
        .iter()
        .map(|id| post(id, &format!("Author {id}"), &format!("Post body {id}")))
        .collect();
    page(&posts)
}

pub fn page(items: &str) -> String {
    format!("<html><body><main>{items}</main></body></html>")
}

/// Pages served for URLs containing `needle`. Each scroll moves one page on,
/// staying on the last page once reached.
#[derive(Debug, Clone)]
pub struct Route {
    pub needle: String,
    pub pages: Vec<String>,
    /// Session reports dead once this many scrolls happened on the route.
    pub dies_after: Option<usize>,
}

impl Route {
    pub fn new(needle: &str, pages: Vec<String>) -> Self {
        Self {
            needle: needle.to_string(),
            pages,
            dies_after: None,
        }
    }

    pub fn dying_after(mut self, scrolls: usize) -> Self {
        self.dies_after = Some(scrolls);
        self
    }
}

#[derive(Debug, Default)]
struct BrowserState {
    route: Option<usize>,
    position: usize,
    scrolls: usize,
    navigations: Vec<String>,
    scripts: Vec<String>,
}

#[derive(Debug)]
pub struct ScriptedBrowser {
    routes: Vec<Route>,
    state: Mutex<BrowserState>,
}

impl ScriptedBrowser {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes,
            state: Mutex::new(BrowserState::default()),
        }
    }

    pub fn single(pages: Vec<String>) -> Self {
        Self::new(vec![Route::new("", pages)])
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().unwrap().scripts.clone()
    }

    fn route(&self, state: &BrowserState) -> Option<&Route> {
        state.route.and_then(|index| self.routes.get(index))
    }
}

#[async_trait::async_trait]
impl BrowserSession for ScriptedBrowser {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        state.route = self.routes.iter().position(|route| url.contains(&route.needle));
        state.position = 0;
        state.scrolls = 0;
        match state.route {
            Some(_) => Ok(()),
            None => Err(SessionError::Navigation {
                url: url.to_string(),
                message: "no route".to_string(),
            }),
        }
    }

    async fn execute_script(&self, script: &str) -> Result<Value, SessionError> {
        let mut state = self.state.lock().unwrap();
        state.scripts.push(script.to_string());
        if script.starts_with("window.scrollTo") {
            state.scrolls += 1;
            let last = self
                .route(&state)
                .map(|route| route.pages.len().saturating_sub(1))
                .unwrap_or(0);
            state.position = (state.position + 1).min(last);
        }
        Ok(Value::Null)
    }

    async fn current_dom(&self) -> Result<String, SessionError> {
        let state = self.state.lock().unwrap();
        let route = self.route(&state).ok_or(SessionError::Dead)?;
        Ok(route.pages.get(state.position).cloned().unwrap_or_default())
    }

    async fn find_element(&self, css: &str) -> Result<ElementHandle, SessionError> {
        Err(SessionError::NoSuchElement(css.to_string()))
    }

    async fn is_alive(&self) -> bool {
        let state = self.state.lock().unwrap();
        match self.route(&state).and_then(|route| route.dies_after) {
            Some(limit) => state.scrolls < limit,
            None => true,
        }
    }
}

/// Session that is gone for good: every call fails.
#[derive(Debug, Default)]
pub struct DeadBrowser {
    navigations: Mutex<Vec<String>>,
}

impl DeadBrowser {
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BrowserSession for DeadBrowser {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.navigations.lock().unwrap().push(url.to_string());
        Err(SessionError::Dead)
    }

    async fn execute_script(&self, _script: &str) -> Result<Value, SessionError> {
        Err(SessionError::Dead)
    }

    async fn current_dom(&self) -> Result<String, SessionError> {
        Err(SessionError::Dead)
    }

    async fn find_element(&self, _css: &str) -> Result<ElementHandle, SessionError> {
        Err(SessionError::Dead)
    }

    async fn is_alive(&self) -> bool {
        false
    }
}

/// Factory whose forks are taken from a fixed list of browsers, last first.
pub struct FakeFactory {
    pub primary: Arc<ScriptedBrowser>,
    forks: Mutex<Vec<Arc<dyn BrowserSession>>>,
}

impl FakeFactory {
    pub fn new(primary: Arc<ScriptedBrowser>, forks: Vec<Arc<ScriptedBrowser>>) -> Self {
        let forks = forks
            .into_iter()
            .map(|fork| fork as Arc<dyn BrowserSession>)
            .collect();
        Self::with_sessions(primary, forks)
    }

    pub fn with_sessions(primary: Arc<ScriptedBrowser>, forks: Vec<Arc<dyn BrowserSession>>) -> Self {
        Self {
            primary,
            forks: Mutex::new(forks),
        }
    }
}

#[async_trait::async_trait]
impl SessionFactory for FakeFactory {
    fn primary(&self) -> Arc<dyn BrowserSession> {
        self.primary.clone()
    }

    async fn fork(&self) -> Result<Arc<dyn BrowserSession>, SessionError> {
        let fork = self
            .forks
            .lock()
            .unwrap()
            .pop()
            .ok_or(SessionError::PoolExhausted)?;
        Ok(fork)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<HarvestEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<HarvestEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: HarvestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Generator answering from a script; once the script runs out every call
/// succeeds.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<GeneratedText, GenerationError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<GeneratedText, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, record: &Record) -> Result<GeneratedText, GenerationError> {
        self.calls.lock().unwrap().push(record.item_id.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(text("Hello", "Nice post")))
    }
}

pub fn text(subject: &str, body: &str) -> GeneratedText {
    GeneratedText {
        subject: subject.to_string(),
        body: body.to_string(),
    }
}
