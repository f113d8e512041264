use std::sync::mpsc;

use leadscout_core::{EnrichmentResult, Entry, Termination};

use crate::RunSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    SessionStarted {
        keyword: String,
    },
    StepCompleted {
        keyword: String,
        step: u32,
        new_items: usize,
        collected: usize,
    },
    Collected {
        keyword: String,
        entry: Entry,
    },
    SessionFinished {
        keyword: String,
        termination: Termination,
        collected: usize,
    },
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    Harvest(HarvestEvent),
    HarvestFinished(RunSummary),
    Enriched(EnrichmentResult),
    EnrichmentFinished { succeeded: usize, failed: usize },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: HarvestEvent) {}
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: HarvestEvent) {
        let _ = self.tx.send(EngineEvent::Harvest(event));
    }
}
