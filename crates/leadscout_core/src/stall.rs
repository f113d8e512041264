/// Number of leading identifiers compared per scroll step.
pub const LEADING_IDS: usize = 3;

/// Consecutive stale observations after which the feed counts as exhausted.
pub const STALL_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallSignal {
    pub is_stale: bool,
    pub consecutive_stale_count: u32,
    pub exhausted: bool,
}

/// Detects a feed that keeps showing the same leading items after scrolling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallDetector {
    previous: Option<Vec<String>>,
    stale_count: u32,
    threshold: u32,
}

impl Default for StallDetector {
    fn default() -> Self {
        Self::with_threshold(STALL_THRESHOLD)
    }
}

impl StallDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(threshold: u32) -> Self {
        Self {
            previous: None,
            stale_count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Compare the leading identifiers of this step against the previous step.
    ///
    /// Only the first [`LEADING_IDS`] entries are considered; comparison is
    /// exact and order-sensitive. The first observation is never stale.
    pub fn observe<S: AsRef<str>>(&mut self, leading_ids: &[S]) -> StallSignal {
        let current: Vec<String> = leading_ids
            .iter()
            .take(LEADING_IDS)
            .map(|id| id.as_ref().to_owned())
            .collect();

        let is_stale = self.previous.as_ref() == Some(&current);
        if is_stale {
            self.stale_count += 1;
        } else {
            self.stale_count = 0;
        }
        self.previous = Some(current);
        self.signal(is_stale)
    }

    pub fn is_exhausted(&self) -> bool {
        self.stale_count >= self.threshold
    }

    pub fn stale_count(&self) -> u32 {
        self.stale_count
    }

    fn signal(&self, is_stale: bool) -> StallSignal {
        StallSignal {
            is_stale,
            consecutive_stale_count: self.stale_count,
            exhausted: self.is_exhausted(),
        }
    }
}
