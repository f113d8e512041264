use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use leadscout_core::{Accumulator, DiscoverySession, Entry, ErrorKind, HarvestMode, Termination};
use scout_logging::{scout_error, scout_info, scout_warn};
use tokio::task::JoinSet;

use crate::{
    BrowserSession, DiscoveryLoop, DiscoveryOutcome, DiscoverySettings, HarvestEvent,
    ProgressSink, RecordExtractor, RunContext, SessionError, SessionFactory,
};

/// Hard upper bound on concurrent discovery workers.
pub const MAX_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub concurrent: bool,
    pub max_workers: usize,
    /// Unique entries wanted across all keywords.
    pub run_target: Option<usize>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            concurrent: false,
            max_workers: 2,
            run_target: None,
        }
    }
}

impl SchedulerSettings {
    pub fn worker_count(&self, keywords: usize) -> usize {
        self.max_workers.clamp(1, MAX_WORKERS).min(keywords)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordReport {
    pub keyword: String,
    pub termination: Termination,
    pub collected: usize,
    /// Entries that survived cross-keyword deduplication.
    pub merged: usize,
    pub steps: u32,
    pub records_scanned: usize,
    pub error: Option<SessionError>,
}

impl KeywordReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(SessionError::kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Paused,
    TargetReached(usize),
    TimeLimit,
    KeywordsDone,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Paused => write!(f, "paused by operator"),
            StopReason::TargetReached(target) => write!(f, "reached target of {target} unique entries"),
            StopReason::TimeLimit => write!(f, "hit the time limit"),
            StopReason::KeywordsDone => write!(f, "ran out of posts for every keyword"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reports: Vec<KeywordReport>,
    /// Keywords never started because the run stopped first.
    pub skipped: Vec<String>,
    pub entries: Vec<Entry>,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsSnapshot {
    /// Entries collected so far, before cross-keyword deduplication.
    pub live: Vec<Entry>,
    pub merged: Vec<Entry>,
    pub reports: Vec<KeywordReport>,
}

#[derive(Debug, Default)]
struct ResultsInner {
    live: Vec<Entry>,
    merged: Accumulator,
    reports: Vec<KeywordReport>,
}

/// Results of one run, readable by a monitor while workers append.
#[derive(Debug, Default)]
pub struct SharedResults {
    inner: Mutex<ResultsInner>,
}

impl SharedResults {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ResultsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ResultsSnapshot {
        let inner = self.lock();
        ResultsSnapshot {
            live: inner.live.clone(),
            merged: inner.merged.entries().to_vec(),
            reports: inner.reports.clone(),
        }
    }

    pub fn merged_len(&self) -> usize {
        self.lock().merged.len()
    }

    pub fn known_emails(&self) -> Vec<String> {
        self.lock().merged.lead_emails().cloned().collect()
    }

    fn push_live(&self, entry: Entry) {
        self.lock().live.push(entry);
    }

    fn merge(&self, outcome: DiscoveryOutcome) -> KeywordReport {
        let mut inner = self.lock();
        let collected = outcome.collected.len();
        let merged = inner.merged.merge(outcome.collected);
        let report = KeywordReport {
            keyword: outcome.keyword,
            termination: outcome.termination,
            collected,
            merged,
            steps: outcome.steps,
            records_scanned: outcome.records_scanned,
            error: outcome.error,
        };
        inner.reports.push(report.clone());
        report
    }

    fn merged_entries(&self) -> Vec<Entry> {
        self.lock().merged.entries().to_vec()
    }

    fn reports(&self) -> Vec<KeywordReport> {
        self.lock().reports.clone()
    }
}

/// Forwards events to the caller's sink and keeps live entries.
struct RecordingSink<'a> {
    results: &'a SharedResults,
    outer: &'a dyn ProgressSink,
}

impl ProgressSink for RecordingSink<'_> {
    fn emit(&self, event: HarvestEvent) {
        if let HarvestEvent::Collected { entry, .. } = &event {
            self.results.push_live(entry.clone());
        }
        self.outer.emit(event);
    }
}

struct ScanShared {
    sessions: Arc<dyn SessionFactory>,
    extractor: Arc<dyn RecordExtractor>,
    discovery: DiscoverySettings,
    settings: SchedulerSettings,
    sink: Arc<dyn ProgressSink>,
}

impl ScanShared {
    /// Target for the next session, or `None` once the run target is met.
    fn session_target(&self, results: &SharedResults) -> Option<usize> {
        let max_items = self.discovery.max_items;
        match self.settings.run_target {
            None => Some(max_items),
            Some(run_target) => {
                let remaining = run_target.saturating_sub(results.merged_len());
                (remaining > 0).then(|| remaining.min(max_items))
            }
        }
    }

    fn should_stop(&self, results: &SharedResults, ctx: &RunContext) -> bool {
        ctx.is_paused() || ctx.timed_out() || self.session_target(results).is_none()
    }

    async fn scan(
        &self,
        browser: &dyn BrowserSession,
        keyword: String,
        target: usize,
        results: &SharedResults,
        ctx: &RunContext,
    ) -> KeywordReport {
        let mut session = DiscoverySession::new(keyword, self.discovery.mode, target);
        if self.discovery.mode == HarvestMode::Leads {
            session = session.with_known_emails(results.known_emails());
        }
        let sink = RecordingSink {
            results,
            outer: self.sink.as_ref(),
        };
        let outcome = DiscoveryLoop::new(browser, self.extractor.as_ref(), &self.discovery, ctx, &sink)
            .run(session)
            .await;
        let report = results.merge(outcome);
        if let (Some(err), Some(kind)) = (&report.error, report.error_kind()) {
            scout_warn!("Keyword \"{}\" incomplete ({}): {}", report.keyword, kind, err);
        }
        report
    }
}

/// Runs discovery over a keyword list, sequentially or with a bounded
/// worker pool, and merges everything into one accumulator.
pub struct KeywordScheduler {
    shared: Arc<ScanShared>,
}

impl KeywordScheduler {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        extractor: Arc<dyn RecordExtractor>,
        discovery: DiscoverySettings,
        settings: SchedulerSettings,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            shared: Arc::new(ScanShared {
                sessions,
                extractor,
                discovery,
                settings,
                sink,
            }),
        }
    }

    pub async fn run(
        &self,
        keywords: Vec<String>,
        ctx: &RunContext,
        results: Arc<SharedResults>,
    ) -> RunSummary {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|keyword| keyword.trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        let workers = self.shared.settings.worker_count(keywords.len());
        scout_info!(
            "Harvesting {} keywords ({})",
            keywords.len(),
            if self.shared.settings.concurrent && workers > 1 {
                format!("{workers} workers")
            } else {
                "sequential".to_string()
            }
        );

        let skipped = if self.shared.settings.concurrent && workers > 1 {
            self.run_concurrent(keywords, workers, ctx, &results).await
        } else {
            self.run_sequential(keywords, ctx, &results).await
        };

        let summary = RunSummary {
            reports: results.reports(),
            entries: results.merged_entries(),
            stop_reason: self.stop_reason(ctx, &results),
            skipped,
            elapsed: ctx.elapsed(),
        };
        scout_info!(
            "Harvest stopped: {}. {} unique entries, {} keywords skipped",
            summary.stop_reason,
            summary.entries.len(),
            summary.skipped.len()
        );
        summary
    }

    async fn run_sequential(
        &self,
        keywords: Vec<String>,
        ctx: &RunContext,
        results: &SharedResults,
    ) -> Vec<String> {
        let browser = self.shared.sessions.primary();
        let mut queue: VecDeque<String> = keywords.into();
        while let Some(keyword) = queue.pop_front() {
            let target = match self.shared.session_target(results) {
                Some(target) if !ctx.is_paused() && !ctx.timed_out() => target,
                _ => {
                    queue.push_front(keyword);
                    break;
                }
            };
            self.shared
                .scan(browser.as_ref(), keyword, target, results, ctx)
                .await;
        }
        queue.into()
    }

    async fn run_concurrent(
        &self,
        keywords: Vec<String>,
        workers: usize,
        ctx: &RunContext,
        results: &Arc<SharedResults>,
    ) -> Vec<String> {
        let queue = Arc::new(Mutex::new(VecDeque::from(keywords)));
        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            tasks.spawn(run_worker(
                worker,
                Arc::clone(&self.shared),
                Arc::clone(&queue),
                Arc::clone(results),
                ctx.clone(),
            ));
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                scout_error!("Discovery worker panicked: {}", err);
            }
        }
        let mut remaining = queue.lock().unwrap_or_else(PoisonError::into_inner);
        let skipped: Vec<String> = remaining.drain(..).collect();
        skipped
    }

    fn stop_reason(&self, ctx: &RunContext, results: &SharedResults) -> StopReason {
        let merged = results.merged_len();
        let timed_out = results
            .reports()
            .iter()
            .any(|report| report.termination == Termination::TimedOut);
        if ctx.is_paused() {
            StopReason::Paused
        } else if let Some(target) = self.shared.settings.run_target.filter(|target| merged >= *target) {
            StopReason::TargetReached(target)
        } else if ctx.timed_out() || timed_out {
            StopReason::TimeLimit
        } else {
            StopReason::KeywordsDone
        }
    }
}

/// One worker: fork a session, then take keywords off the queue until it is
/// empty or the run stops. A session that died is replaced by a new fork;
/// without one the worker quits and leaves the queue to the others.
async fn run_worker(
    worker: usize,
    shared: Arc<ScanShared>,
    queue: Arc<Mutex<VecDeque<String>>>,
    results: Arc<SharedResults>,
    ctx: RunContext,
) {
    let Some(mut browser) = fork_session(worker, &shared).await else {
        return;
    };

    loop {
        if shared.should_stop(&results, &ctx) {
            break;
        }
        let Some(keyword) = pop_keyword(&queue) else {
            break;
        };
        let Some(target) = shared.session_target(&results) else {
            push_back_keyword(&queue, keyword);
            break;
        };
        let report = shared
            .scan(browser.as_ref(), keyword, target, &results, &ctx)
            .await;
        if report.error.is_some() && !browser.is_alive().await {
            scout_warn!("Worker {} lost its browser session, forking a new one", worker);
            match fork_session(worker, &shared).await {
                Some(fresh) => browser = fresh,
                None => return,
            }
        }
    }
}

async fn fork_session(worker: usize, shared: &ScanShared) -> Option<Arc<dyn BrowserSession>> {
    match shared.sessions.fork().await {
        Ok(browser) => Some(browser),
        Err(err) => {
            scout_error!("Worker {} could not get a browser session: {}", worker, err);
            None
        }
    }
}

fn pop_keyword(queue: &Mutex<VecDeque<String>>) -> Option<String> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

fn push_back_keyword(queue: &Mutex<VecDeque<String>>, keyword: String) {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push_front(keyword);
}
