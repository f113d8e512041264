use std::collections::HashSet;

use crate::{Entry, HarvestMode, Lead, Record, StallDetector, StallSignal, StepCheck, Termination};

/// State of one keyword scan.
///
/// `seen_ids` only grows and `collected` never holds two entries with the
/// same identity. A session is consumed when its loop ends; continuing a
/// keyword needs a fresh session.
#[derive(Debug, Clone)]
pub struct DiscoverySession {
    keyword: String,
    mode: HarvestMode,
    target: usize,
    seen_ids: HashSet<String>,
    known_emails: HashSet<String>,
    collected: Vec<Entry>,
    scroll_step: u32,
    records_scanned: usize,
    stall: StallDetector,
}

impl DiscoverySession {
    pub fn new(keyword: impl Into<String>, mode: HarvestMode, target: usize) -> Self {
        Self {
            keyword: keyword.into(),
            mode,
            target,
            seen_ids: HashSet::new(),
            known_emails: HashSet::new(),
            collected: Vec::new(),
            scroll_step: 0,
            records_scanned: 0,
            stall: StallDetector::new(),
        }
    }

    /// Emails already claimed by earlier sessions of the same run.
    pub fn with_known_emails<I>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.known_emails.extend(emails);
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn mode(&self) -> HarvestMode {
        self.mode
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn scroll_step(&self) -> u32 {
        self.scroll_step
    }

    pub fn records_scanned(&self) -> usize {
        self.records_scanned
    }

    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }

    pub fn collected(&self) -> &[Entry] {
        &self.collected
    }

    pub fn into_collected(self) -> Vec<Entry> {
        self.collected
    }

    pub fn is_satisfied(&self) -> bool {
        self.collected.len() >= self.target
    }

    pub fn begin_step(&mut self) {
        self.scroll_step += 1;
    }

    /// Feed the leading identifiers of the current page to the stall detector.
    pub fn observe_leading<S: AsRef<str>>(&mut self, leading_ids: &[S]) -> StallSignal {
        self.stall.observe(leading_ids)
    }

    /// Step-boundary check; see [`StepCheck::evaluate`] for the priority order.
    pub fn check(&self, paused: bool, timed_out: bool, max_steps: u32) -> Option<Termination> {
        StepCheck {
            paused,
            collected: self.collected.len(),
            target: self.target,
            timed_out,
            scroll_step: self.scroll_step,
            max_steps,
            stalled: self.stall.is_exhausted(),
        }
        .evaluate()
    }

    /// Extract and collect every item not seen before, in page order.
    ///
    /// Stops as soon as the target is reached; items after that point are
    /// left unseen. Returns the number of new items scanned.
    pub fn ingest<T, I, F>(&mut self, items: I, mut extract: F) -> usize
    where
        I: IntoIterator<Item = (String, T)>,
        F: FnMut(T) -> Record,
    {
        let mut scanned = 0;
        for (item_id, item) in items {
            if self.is_satisfied() {
                break;
            }
            if !self.seen_ids.insert(item_id) {
                continue;
            }
            scanned += 1;
            self.records_scanned += 1;
            let record = extract(item);
            self.accept(record);
        }
        scanned
    }

    fn accept(&mut self, record: Record) {
        match self.mode {
            HarvestMode::Posts => self.collected.push(Entry::Post(record)),
            HarvestMode::Leads => {
                for email in &record.emails {
                    if self.is_satisfied() {
                        break;
                    }
                    if self.known_emails.insert(email.clone()) {
                        self.collected.push(Entry::Lead(Lead {
                            email: email.clone(),
                            record: record.clone(),
                        }));
                    }
                }
            }
        }
    }
}
