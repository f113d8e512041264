use std::collections::HashSet;

use crate::Entry;

/// Run-wide results, deduplicated across keywords.
///
/// Posts are keyed by `(profile_url, text)`, leads by email; the first entry
/// seen for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    entries: Vec<Entry>,
    post_keys: HashSet<(String, String)>,
    lead_emails: HashSet<String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the entry was new.
    pub fn insert(&mut self, entry: Entry) -> bool {
        let fresh = match &entry {
            Entry::Post(record) => self.post_keys.insert(record.cross_session_key()),
            Entry::Lead(lead) => self.lead_emails.insert(lead.email.clone()),
        };
        if fresh {
            self.entries.push(entry);
        }
        fresh
    }

    /// Merge a batch of entries, returning how many were new.
    pub fn merge<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = Entry>,
    {
        entries
            .into_iter()
            .map(|entry| self.insert(entry))
            .filter(|fresh| *fresh)
            .count()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lead_emails(&self) -> impl Iterator<Item = &String> {
        self.lead_emails.iter()
    }
}
