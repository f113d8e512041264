use std::io;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use leadscout_core::{BackoffPolicy, Entry};
use scout_logging::scout_info;
use tokio_util::sync::CancellationToken;

use crate::{
    ChannelProgressSink, DiscoverySettings, EngineEvent, EnrichmentOrchestrator, Generator,
    KeywordScheduler, RecordExtractor, ResultsSnapshot, RunContext, SchedulerSettings,
    SessionFactory, SharedResults,
};

enum EngineCommand {
    Harvest { keywords: Vec<String> },
    Enrich { entries: Vec<Entry> },
}

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub discovery: DiscoverySettings,
    pub scheduler: SchedulerSettings,
    pub backoff: BackoffPolicy,
    /// Pause between consecutive generation requests.
    pub request_gap: Duration,
    pub time_budget: Option<Duration>,
}

/// Collaborators the engine drives.
pub struct EngineParts {
    pub sessions: Arc<dyn SessionFactory>,
    pub extractor: Arc<dyn RecordExtractor>,
    pub generator: Arc<dyn Generator>,
}

#[derive(Default)]
struct RunState {
    pause: Option<CancellationToken>,
    results: Arc<SharedResults>,
}

/// Background worker thread with its own runtime. Commands run one at a
/// time, in the order they were sent.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    state: Arc<Mutex<RunState>>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings, parts: EngineParts) -> io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let state = Arc::new(Mutex::new(RunState::default()));

        let worker_state = Arc::clone(&state);
        thread::spawn(move || {
            let sink = Arc::new(ChannelProgressSink::new(event_tx.clone()));
            let scheduler = KeywordScheduler::new(
                parts.sessions,
                parts.extractor,
                settings.discovery.clone(),
                settings.scheduler.clone(),
                sink,
            );
            let mut orchestrator = EnrichmentOrchestrator::new(parts.generator, settings.backoff.clone())
                .with_request_gap(settings.request_gap);

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Harvest { keywords } => {
                        let pause = CancellationToken::new();
                        let results = Arc::new(SharedResults::new());
                        {
                            let mut state = lock(&worker_state);
                            state.pause = Some(pause.clone());
                            state.results = Arc::clone(&results);
                        }
                        let ctx = RunContext::with_pause(pause, settings.time_budget);
                        let summary = runtime.block_on(scheduler.run(keywords, &ctx, results));
                        lock(&worker_state).pause = None;
                        let _ = event_tx.send(EngineEvent::HarvestFinished(summary));
                    }
                    EngineCommand::Enrich { entries } => {
                        let tx = event_tx.clone();
                        let results = runtime.block_on(orchestrator.enrich_batch(&entries, |result| {
                            let _ = tx.send(EngineEvent::Enriched(result.clone()));
                        }));
                        let succeeded = results.iter().filter(|result| result.is_success()).count();
                        let _ = event_tx.send(EngineEvent::EnrichmentFinished {
                            succeeded,
                            failed: results.len() - succeeded,
                        });
                    }
                }
            }
            scout_info!("Engine command channel closed, worker exiting");
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            state,
        })
    }

    pub fn harvest(&self, keywords: Vec<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Harvest { keywords });
    }

    pub fn enrich(&self, entries: Vec<Entry>) {
        let _ = self.cmd_tx.send(EngineCommand::Enrich { entries });
    }

    /// Ask the running harvest to stop at its next step boundary.
    pub fn pause(&self) {
        self.pause_control().pause();
    }

    /// Pause switch that can be moved to another thread.
    pub fn pause_control(&self) -> PauseControl {
        PauseControl {
            state: Arc::clone(&self.state),
        }
    }

    /// Partial or final results of the latest harvest.
    pub fn results(&self) -> ResultsSnapshot {
        let results = Arc::clone(&lock(&self.state).results);
        results.snapshot()
    }

    /// Blocks for the next event; `None` once the worker thread is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

#[derive(Clone)]
pub struct PauseControl {
    state: Arc<Mutex<RunState>>,
}

impl PauseControl {
    pub fn pause(&self) {
        if let Some(pause) = &lock(&self.state).pause {
            scout_info!("Pause requested, stopping at the next step boundary");
            pause.cancel();
        }
    }
}

fn lock(state: &Mutex<RunState>) -> std::sync::MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
