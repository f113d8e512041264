use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use leadscout_core::{BackoffPolicy, HarvestMode};
use leadscout_engine::{
    ChatSettings, DiscoverySettings, EngineSettings, SchedulerSettings, SelectorPolicy,
    WebDriverSettings,
};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "leadscout.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Posts,
    Leads,
}

impl From<Mode> for HarvestMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Posts => HarvestMode::Posts,
            Mode::Leads => HarvestMode::Leads,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub keywords: Vec<String>,
    pub mode: Mode,
    pub max_items: usize,
    pub max_steps: u32,
    pub step_delay_ms: u64,
    pub concurrent: bool,
    pub max_workers: usize,
    pub run_target: Option<usize>,
    pub time_budget_secs: Option<u64>,
    pub keep_raw_markup: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            mode: Mode::Posts,
            max_items: 30,
            max_steps: 20,
            step_delay_ms: 2_000,
            concurrent: false,
            max_workers: 2,
            run_target: None,
            time_budget_secs: None,
            keep_raw_markup: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    pub server_url: String,
    pub primary_session: String,
    pub spare_sessions: Vec<String>,
    pub cookie_origin: String,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        let defaults = WebDriverSettings::default();
        Self {
            server_url: defaults.server_url,
            primary_session: defaults.primary_session,
            spare_sessions: defaults.spare_sessions,
            cookie_origin: defaults.cookie_origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub prompt_template: Option<String>,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
    pub cooldown_after: u32,
    pub cooldown_secs: u64,
    pub max_attempts: u32,
    pub request_gap_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let chat = ChatSettings::default();
        let backoff = BackoffPolicy::default();
        Self {
            enabled: false,
            endpoint: chat.endpoint,
            model: chat.model,
            api_key_env: "GROQ_API_KEY".to_string(),
            max_tokens: chat.max_tokens,
            temperature: chat.temperature,
            prompt_template: None,
            base_delay_secs: backoff.base_delay.as_secs(),
            max_delay_secs: backoff.max_delay.as_secs(),
            cooldown_after: backoff.cooldown_after,
            cooldown_secs: backoff.cooldown.as_secs(),
            max_attempts: backoff.max_attempts,
            request_gap_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub output_dir: PathBuf,
    pub discovery: DiscoveryConfig,
    pub webdriver: WebDriverConfig,
    pub generation: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output_dir: PathBuf::from("output"),
            discovery: DiscoveryConfig::default(),
            webdriver: WebDriverConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read a RON config; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::read(path)?.unwrap_or_default())
    }

    /// Like [`AppConfig::load`], but `None` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };
        ron::from_str(&content)
            .map(Some)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    pub fn api_key(&self) -> Result<String> {
        let name = &self.generation.api_key_env;
        std::env::var(name).with_context(|| format!("environment variable {name} is not set"))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let discovery = &self.discovery;
        let generation = &self.generation;
        EngineSettings {
            discovery: DiscoverySettings {
                mode: discovery.mode.into(),
                max_items: discovery.max_items,
                max_steps: discovery.max_steps,
                step_delay: Duration::from_millis(discovery.step_delay_ms),
                ..DiscoverySettings::default()
            },
            scheduler: SchedulerSettings {
                concurrent: discovery.concurrent,
                max_workers: discovery.max_workers,
                run_target: discovery.run_target,
            },
            backoff: BackoffPolicy {
                base_delay: Duration::from_secs(generation.base_delay_secs),
                max_delay: Duration::from_secs(generation.max_delay_secs),
                cooldown_after: generation.cooldown_after,
                cooldown: Duration::from_secs(generation.cooldown_secs),
                max_attempts: generation.max_attempts,
            },
            request_gap: Duration::from_millis(generation.request_gap_ms),
            time_budget: discovery.time_budget_secs.map(Duration::from_secs),
        }
    }

    pub fn chat_settings(&self, api_key: String) -> ChatSettings {
        let generation = &self.generation;
        let defaults = ChatSettings::default();
        ChatSettings {
            endpoint: generation.endpoint.clone(),
            model: generation.model.clone(),
            api_key,
            max_tokens: generation.max_tokens,
            temperature: generation.temperature,
            user_prompt_template: generation
                .prompt_template
                .clone()
                .unwrap_or(defaults.user_prompt_template.clone()),
            ..defaults
        }
    }

    pub fn webdriver_settings(&self) -> WebDriverSettings {
        let webdriver = &self.webdriver;
        WebDriverSettings {
            server_url: webdriver.server_url.clone(),
            primary_session: webdriver.primary_session.clone(),
            spare_sessions: webdriver.spare_sessions.clone(),
            cookie_origin: webdriver.cookie_origin.clone(),
            ..WebDriverSettings::default()
        }
    }

    pub fn selector_policy(&self) -> SelectorPolicy {
        SelectorPolicy {
            keep_raw_markup: self.discovery.keep_raw_markup,
            ..SelectorPolicy::default()
        }
    }
}
