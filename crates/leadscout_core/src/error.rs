use std::fmt;

/// Failure taxonomy shared by every component.
///
/// None of these abort a run; each degrades to a partial result plus a
/// diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Browser session unusable; ends the current keyword only.
    SessionLost,
    /// A record field fell back to a placeholder.
    ExtractionDegraded,
    RateLimited,
    GenerationError,
    MalformedResponse,
    DispatchFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::SessionLost => "session lost",
            ErrorKind::ExtractionDegraded => "extraction degraded",
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::GenerationError => "generation error",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::DispatchFailure => "dispatch failure",
        };
        f.write_str(label)
    }
}
