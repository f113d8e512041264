#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub recipient: String,
    pub status: DispatchStatus,
    pub message: String,
}

/// Per-recipient record of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchLedger {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub entries: Vec<DispatchEntry>,
}

impl DispatchLedger {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_sent(&mut self, recipient: impl Into<String>, message: impl Into<String>) {
        self.sent += 1;
        self.entries.push(DispatchEntry {
            recipient: recipient.into(),
            status: DispatchStatus::Sent,
            message: message.into(),
        });
    }

    pub fn record_failed(&mut self, recipient: impl Into<String>, message: impl Into<String>) {
        self.failed += 1;
        self.entries.push(DispatchEntry {
            recipient: recipient.into(),
            status: DispatchStatus::Failed,
            message: message.into(),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.sent + self.failed == self.total
    }
}
