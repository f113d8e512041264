use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Run-wide controls handed to every component.
///
/// Pause, time budget and count targets are only honoured at step
/// boundaries; nothing interrupts a step in progress.
#[derive(Debug, Clone)]
pub struct RunContext {
    pause: CancellationToken,
    started: Instant,
    time_budget: Option<Duration>,
}

impl RunContext {
    pub fn new(time_budget: Option<Duration>) -> Self {
        Self::with_pause(CancellationToken::new(), time_budget)
    }

    /// Use a pause flag owned by an external controller.
    pub fn with_pause(pause: CancellationToken, time_budget: Option<Duration>) -> Self {
        Self {
            pause,
            started: Instant::now(),
            time_budget,
        }
    }

    pub fn pause(&self) {
        self.pause.cancel();
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_cancelled()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    pub fn timed_out(&self) -> bool {
        self.time_budget
            .is_some_and(|budget| self.elapsed() >= budget)
    }
}
