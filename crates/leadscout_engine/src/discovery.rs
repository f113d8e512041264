use std::time::Duration;

use leadscout_core::{
    DiscoverySession, Entry, ExhaustReason, HarvestMode, Termination, LEADING_IDS,
};
use rand::Rng;
use scout_logging::{scout_debug, scout_info, scout_warn};
use url::Url;

use crate::{BrowserSession, HarvestEvent, ProgressSink, RecordExtractor, RunContext, SessionError};

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    pub search_url: String,
    pub sort_by: Option<String>,
    pub mode: HarvestMode,
    pub max_items: usize,
    pub max_steps: u32,
    /// Base wait after each scroll; the actual wait is jittered by ±20%.
    pub step_delay: Duration,
    /// Per-step scroll distance range in pixels, multiplied by the step number.
    pub scroll_min: u32,
    pub scroll_max: u32,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            search_url: "https://www.linkedin.com/search/results/content/".to_string(),
            sort_by: Some("date_posted".to_string()),
            mode: HarvestMode::Posts,
            max_items: 30,
            max_steps: 20,
            step_delay: Duration::from_secs(2),
            scroll_min: 300,
            scroll_max: 1000,
        }
    }
}

impl DiscoverySettings {
    pub fn search_url_for(&self, keyword: &str) -> Result<String, SessionError> {
        let mut params = vec![("keywords", keyword)];
        if let Some(sort_by) = self.sort_by.as_deref() {
            params.push(("sortBy", sort_by));
        }
        Url::parse_with_params(&self.search_url, &params)
            .map(String::from)
            .map_err(|err| SessionError::Navigation {
                url: self.search_url.clone(),
                message: err.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub keyword: String,
    pub termination: Termination,
    pub collected: Vec<Entry>,
    pub steps: u32,
    pub records_scanned: usize,
    /// Set when the session failed; `collected` still holds partial results.
    pub error: Option<SessionError>,
}

impl DiscoveryOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Scroll-and-extract loop for one keyword on one browser session.
pub struct DiscoveryLoop<'a> {
    browser: &'a dyn BrowserSession,
    extractor: &'a dyn RecordExtractor,
    settings: &'a DiscoverySettings,
    ctx: &'a RunContext,
    sink: &'a dyn ProgressSink,
}

impl<'a> DiscoveryLoop<'a> {
    pub fn new(
        browser: &'a dyn BrowserSession,
        extractor: &'a dyn RecordExtractor,
        settings: &'a DiscoverySettings,
        ctx: &'a RunContext,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            browser,
            extractor,
            settings,
            ctx,
            sink,
        }
    }

    pub async fn run(&self, mut session: DiscoverySession) -> DiscoveryOutcome {
        let keyword = session.keyword().to_string();
        scout_info!(
            "Scanning \"{}\" (target {}, max {} steps)",
            keyword,
            session.target(),
            self.settings.max_steps
        );
        self.sink.emit(HarvestEvent::SessionStarted {
            keyword: keyword.clone(),
        });

        let (termination, error) = match self.scan(&mut session).await {
            Ok(termination) => (termination, None),
            Err(err) => {
                scout_warn!("Scan of \"{}\" aborted: {}", keyword, err);
                (Termination::Exhausted(ExhaustReason::Error), Some(err))
            }
        };

        scout_info!(
            "Finished \"{}\": {} after {} steps, {} collected",
            keyword,
            termination,
            session.scroll_step(),
            session.collected().len()
        );
        self.sink.emit(HarvestEvent::SessionFinished {
            keyword: keyword.clone(),
            termination,
            collected: session.collected().len(),
        });

        DiscoveryOutcome {
            keyword,
            termination,
            steps: session.scroll_step(),
            records_scanned: session.records_scanned(),
            error,
            collected: session.into_collected(),
        }
    }

    async fn scan(&self, session: &mut DiscoverySession) -> Result<Termination, SessionError> {
        let url = self.settings.search_url_for(session.keyword())?;
        self.browser.navigate(&url).await?;
        tokio::time::sleep(self.settings.step_delay).await;

        // Prime the stall detector with the page as first rendered.
        let dom = self.browser.current_dom().await?;
        let leading = leading_ids(self.extractor, &dom);
        session.observe_leading(&leading);

        loop {
            let check = session.check(
                self.ctx.is_paused(),
                self.ctx.timed_out(),
                self.settings.max_steps,
            );
            if let Some(termination) = check {
                return Ok(termination);
            }
            self.step(session).await?;
        }
    }

    async fn step(&self, session: &mut DiscoverySession) -> Result<(), SessionError> {
        if !self.browser.is_alive().await {
            return Err(SessionError::Dead);
        }
        session.begin_step();
        let step = session.scroll_step();

        let offset = scroll_offset(step, self.settings.scroll_min, self.settings.scroll_max);
        self.browser
            .execute_script(&format!("window.scrollTo(0, {offset});"))
            .await?;
        tokio::time::sleep(jittered(self.settings.step_delay)).await;
        self.expand_truncated().await;

        let dom = self.browser.current_dom().await?;
        let items = self.extractor.split(&dom);
        let leading: Vec<&str> = items
            .iter()
            .take(LEADING_IDS)
            .map(|item| item.item_id.as_str())
            .collect();
        let signal = session.observe_leading(&leading);
        if signal.is_stale {
            scout_debug!(
                "\"{}\" step {}: feed unchanged ({} in a row)",
                session.keyword(),
                step,
                signal.consecutive_stale_count
            );
        }

        let keyword = session.keyword().to_string();
        let before = session.collected().len();
        let new_items = session.ingest(
            items.iter().map(|item| (item.item_id.clone(), item)),
            |item| self.extractor.extract(item, &keyword),
        );
        for entry in &session.collected()[before..] {
            self.sink.emit(HarvestEvent::Collected {
                keyword: keyword.clone(),
                entry: entry.clone(),
            });
        }

        scout_debug!(
            "\"{}\" step {}: {} items on page, {} new, {} collected",
            keyword,
            step,
            items.len(),
            new_items,
            session.collected().len()
        );
        self.sink.emit(HarvestEvent::StepCompleted {
            keyword,
            step,
            new_items,
            collected: session.collected().len(),
        });
        Ok(())
    }

    /// Best effort: a missing toggle or a failing click never ends the scan.
    async fn expand_truncated(&self) {
        let (Some(selector), Some(script)) =
            (self.extractor.expand_selector(), self.extractor.expand_script())
        else {
            return;
        };
        if self.browser.find_element(selector).await.is_err() {
            return;
        }
        if let Err(err) = self.browser.execute_script(script).await {
            scout_debug!("Expanding truncated posts failed: {}", err);
        }
    }
}

fn leading_ids(extractor: &dyn RecordExtractor, dom: &str) -> Vec<String> {
    extractor
        .split(dom)
        .into_iter()
        .take(LEADING_IDS)
        .map(|item| item.item_id)
        .collect()
}

fn scroll_offset(step: u32, min: u32, max: u32) -> u64 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    let distance = rand::rng().random_range(low..=high);
    u64::from(distance) * u64::from(step)
}

fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(rand::rng().random_range(0.8..=1.2))
}
