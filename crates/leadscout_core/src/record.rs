use std::collections::BTreeSet;

use crate::ErrorKind;

/// Author placeholder used when the author could not be read.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One extracted feed post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Feed-assigned identity of the item the record was extracted from.
    pub item_id: String,
    pub author: String,
    pub profile_url: String,
    pub emails: BTreeSet<String>,
    pub websites: BTreeSet<String>,
    pub text: String,
    pub raw_markup: Option<String>,
    pub keyword: String,
}

impl Record {
    /// Identity used to deduplicate records collected by different sessions.
    pub fn cross_session_key(&self) -> (String, String) {
        (self.profile_url.clone(), self.text.clone())
    }

    /// Whether any field fell back to a placeholder during extraction.
    pub fn is_degraded(&self) -> bool {
        self.author == UNKNOWN_AUTHOR || self.profile_url.is_empty()
    }

    pub fn degradation(&self) -> Option<ErrorKind> {
        self.is_degraded().then_some(ErrorKind::ExtractionDegraded)
    }

    /// Content handed to text generation: raw markup when retained, else text.
    pub fn prompt_content(&self) -> &str {
        match self.raw_markup.as_deref() {
            Some(markup) if !markup.trim().is_empty() => markup,
            _ => &self.text,
        }
    }
}

/// A record keyed by one discovered contact email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub email: String,
    pub record: Record,
}

/// What a discovery session collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarvestMode {
    /// One entry per distinct feed item.
    #[default]
    Posts,
    /// One entry per distinct email address.
    Leads,
}

/// Identity of a collected entry within one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryId {
    Item(String),
    Email(String),
}

/// A collected post or lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Post(Record),
    Lead(Lead),
}

impl Entry {
    pub fn record(&self) -> &Record {
        match self {
            Entry::Post(record) => record,
            Entry::Lead(lead) => &lead.record,
        }
    }

    pub fn id(&self) -> EntryId {
        match self {
            Entry::Post(record) => EntryId::Item(record.item_id.clone()),
            Entry::Lead(lead) => EntryId::Email(lead.email.clone()),
        }
    }

    /// Address outreach for this entry goes to, if any.
    pub fn recipient(&self) -> Option<&str> {
        match self {
            Entry::Post(record) => record.emails.iter().next().map(String::as_str),
            Entry::Lead(lead) => Some(lead.email.as_str()),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.record().keyword
    }
}
