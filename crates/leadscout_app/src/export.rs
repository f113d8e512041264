use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use leadscout_core::{EnrichmentResult, Entry};
use leadscout_engine::RunSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub keyword: String,
    pub item_id: String,
    pub author: String,
    pub profile_url: String,
    /// Set for leads; posts carry every address in `emails`.
    pub email: Option<String>,
    pub emails: Vec<String>,
    pub websites: Vec<String>,
    pub text: String,
}

impl From<&Entry> for ExportedEntry {
    fn from(entry: &Entry) -> Self {
        let record = entry.record();
        Self {
            keyword: record.keyword.clone(),
            item_id: record.item_id.clone(),
            author: record.author.clone(),
            profile_url: record.profile_url.clone(),
            email: match entry {
                Entry::Lead(lead) => Some(lead.email.clone()),
                Entry::Post(_) => None,
            },
            emails: record.emails.iter().cloned().collect(),
            websites: record.websites.iter().cloned().collect(),
            text: record.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub item_id: String,
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
    pub attempts: u32,
    pub error: Option<String>,
}

impl From<&EnrichmentResult> for ExportedMessage {
    fn from(result: &EnrichmentResult) -> Self {
        Self {
            item_id: result.item_id.clone(),
            recipient: result.recipient.clone(),
            subject: result.subject.clone(),
            body: result.body.clone(),
            attempts: result.attempts,
            error: result
                .failure
                .as_ref()
                .map(|failure| format!("{}: {}", failure.kind, failure.message)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedRun {
    pub finished_utc: String,
    pub stop_reason: String,
    pub skipped_keywords: Vec<String>,
    pub entries: Vec<ExportedEntry>,
    pub messages: Vec<ExportedMessage>,
}

impl ExportedRun {
    pub fn new(summary: &RunSummary, messages: &[EnrichmentResult], finished: DateTime<Utc>) -> Self {
        Self {
            finished_utc: finished.to_rfc3339(),
            stop_reason: summary.stop_reason.to_string(),
            skipped_keywords: summary.skipped.clone(),
            entries: summary.entries.iter().map(ExportedEntry::from).collect(),
            messages: messages.iter().map(ExportedMessage::from).collect(),
        }
    }
}

/// Write the run to `<output_dir>/leadscout-<timestamp>.ron`.
pub fn save_run(output_dir: &Path, run: &ExportedRun, finished: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output dir {}", output_dir.display()))?;
    let path = output_dir.join(format!("leadscout-{}.ron", finished.format("%Y%m%dT%H%M%SZ")));
    let content = ron::ser::to_string_pretty(run, ron::ser::PrettyConfig::new())
        .context("serializing run results")?;
    fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn load_run(path: &Path) -> Result<ExportedRun> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ron::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
