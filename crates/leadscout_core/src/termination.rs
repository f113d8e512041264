use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    StepLimit,
    Stall,
    Error,
}

/// Final state of a discovery session. All variants are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Paused,
    Satisfied,
    TimedOut,
    Exhausted(ExhaustReason),
}

impl Termination {
    /// Whether the keyword ran to a normal end rather than failing mid-way.
    pub fn is_complete(self) -> bool {
        !matches!(self, Termination::Exhausted(ExhaustReason::Error))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Paused => write!(f, "paused"),
            Termination::Satisfied => write!(f, "satisfied"),
            Termination::TimedOut => write!(f, "timed out"),
            Termination::Exhausted(ExhaustReason::StepLimit) => {
                write!(f, "exhausted (step limit)")
            }
            Termination::Exhausted(ExhaustReason::Stall) => write!(f, "exhausted (stalled feed)"),
            Termination::Exhausted(ExhaustReason::Error) => write!(f, "exhausted (session error)"),
        }
    }
}

/// Snapshot of everything the step-boundary check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCheck {
    pub paused: bool,
    pub collected: usize,
    pub target: usize,
    pub timed_out: bool,
    pub scroll_step: u32,
    pub max_steps: u32,
    pub stalled: bool,
}

impl StepCheck {
    /// Terminal transition for this boundary, in priority order:
    /// pause, target, time budget, step limit, stall.
    pub fn evaluate(&self) -> Option<Termination> {
        if self.paused {
            Some(Termination::Paused)
        } else if self.collected >= self.target {
            Some(Termination::Satisfied)
        } else if self.timed_out {
            Some(Termination::TimedOut)
        } else if self.scroll_step >= self.max_steps {
            Some(Termination::Exhausted(ExhaustReason::StepLimit))
        } else if self.stalled {
            Some(Termination::Exhausted(ExhaustReason::Stall))
        } else {
            None
        }
    }
}
