use std::io::{self, BufRead};
use std::thread;

use anyhow::{bail, Result};
use leadscout_core::EnrichmentResult;
use leadscout_engine::{EngineEvent, EngineHandle, HarvestEvent, PauseControl, RunSummary};
use scout_logging::{scout_debug, scout_info, scout_warn};

#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub messages: Vec<EnrichmentResult>,
}

pub fn is_pause_command(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "p" | "pause")
}

/// Typing `pause` on stdin stops the harvest at its next step boundary.
pub fn spawn_pause_watcher(control: PauseControl) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if is_pause_command(&line) {
                control.pause();
            }
        }
    });
}

/// Harvest every keyword, then optionally enrich what was found.
pub fn run(handle: &EngineHandle, keywords: Vec<String>, enrich: bool) -> Result<RunReport> {
    handle.harvest(keywords);
    let summary = loop {
        match handle.recv() {
            Some(EngineEvent::Harvest(event)) => log_harvest_event(&event),
            Some(EngineEvent::HarvestFinished(summary)) => break summary,
            Some(_) => {}
            None => bail!("engine stopped before the harvest finished"),
        }
    };
    log_summary(&summary);

    let mut messages = Vec::new();
    if enrich && !summary.entries.is_empty() {
        handle.enrich(summary.entries.clone());
        loop {
            match handle.recv() {
                Some(EngineEvent::Enriched(result)) => {
                    match &result.failure {
                        None => scout_info!("Drafted message for {}", result.item_id),
                        Some(failure) => scout_warn!(
                            "No message for {} after {} attempts: {} ({})",
                            result.item_id,
                            result.attempts,
                            failure.kind,
                            failure.message
                        ),
                    }
                    messages.push(result);
                }
                Some(EngineEvent::EnrichmentFinished { succeeded, failed }) => {
                    scout_info!("Enrichment done: {} drafted, {} failed", succeeded, failed);
                    break;
                }
                Some(_) => {}
                None => bail!("engine stopped before enrichment finished"),
            }
        }
    }

    Ok(RunReport { summary, messages })
}

fn log_harvest_event(event: &HarvestEvent) {
    match event {
        HarvestEvent::SessionStarted { keyword } => scout_info!("Searching \"{}\"", keyword),
        HarvestEvent::StepCompleted {
            keyword,
            step,
            new_items,
            collected,
        } => scout_debug!(
            "\"{}\" scroll {}: {} new, {} so far",
            keyword,
            step,
            new_items,
            collected
        ),
        HarvestEvent::Collected { .. } => {}
        HarvestEvent::SessionFinished {
            keyword,
            termination,
            collected,
        } => scout_info!("\"{}\" {} with {} entries", keyword, termination, collected),
    }
}

fn log_summary(summary: &RunSummary) {
    for report in &summary.reports {
        match &report.error {
            None => scout_info!(
                "{}: {} collected, {} unique, {} scrolls",
                report.keyword,
                report.collected,
                report.merged,
                report.steps
            ),
            Some(err) => scout_warn!(
                "{}: incomplete after {} scrolls ({}), kept {} entries",
                report.keyword,
                report.steps,
                err,
                report.collected
            ),
        }
    }
    if !summary.skipped.is_empty() {
        scout_info!("Skipped keywords: {}", summary.skipped.join(", "));
    }
    scout_info!(
        "Stopped: {}. Found {} unique entries in {:.0?}",
        summary.stop_reason,
        summary.entries.len(),
        summary.elapsed
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_commands_are_case_insensitive() {
        assert!(is_pause_command("pause"));
        assert!(is_pause_command("  P \n"));
        assert!(!is_pause_command("play"));
    }
}
