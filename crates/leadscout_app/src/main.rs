use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use leadscout_app::config::{AppConfig, DEFAULT_CONFIG_FILE};
use leadscout_app::export::{save_run, ExportedRun};
use leadscout_app::runner;
use leadscout_engine::{
    ChatCompletionClient, EngineHandle, EngineParts, SelectorExtractor, WebDriverPool,
};
use scout_logging::{scout_info, LogDestination};

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let found = AppConfig::read(&config_path)?;
    let config = found.clone().unwrap_or_default();
    scout_logging::initialize(LogDestination::default(), config.log_level());
    match found {
        Some(_) => scout_info!("Starting leadscout with {:?}", config_path),
        None => scout_info!("No config at {:?}, using defaults", config_path),
    }

    if config.discovery.keywords.is_empty() {
        bail!("no keywords configured in {}", config_path.display());
    }
    if config.webdriver.primary_session.is_empty() {
        bail!("webdriver.primary_session must name a logged-in browser session");
    }

    let api_key = if config.generation.enabled {
        config.api_key()?
    } else {
        String::new()
    };
    let parts = EngineParts {
        sessions: Arc::new(WebDriverPool::new(&config.webdriver_settings())?),
        extractor: Arc::new(SelectorExtractor::new(config.selector_policy())?),
        generator: Arc::new(ChatCompletionClient::new(config.chat_settings(api_key))?),
    };
    let handle = EngineHandle::new(config.engine_settings(), parts)
        .context("starting the engine runtime")?;

    runner::spawn_pause_watcher(handle.pause_control());
    scout_info!("Type `pause` and Enter to stop after the current scroll");

    let report = runner::run(
        &handle,
        config.discovery.keywords.clone(),
        config.generation.enabled,
    )?;

    let finished = Utc::now();
    let exported = ExportedRun::new(&report.summary, &report.messages, finished);
    let path = save_run(&config.output_dir, &exported, finished)?;
    scout_info!("Saved {} entries to {:?}", exported.entries.len(), path);
    Ok(())
}
