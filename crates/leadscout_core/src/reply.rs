use serde::Deserialize;
use thiserror::Error;

/// Outreach text produced for one record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedText {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed generation reply: {reason}")]
pub struct ReplyError {
    pub reason: String,
    /// The reply as received, kept for diagnostics.
    pub raw: String,
}

/// Parse a generation reply into a subject/body pair.
///
/// The reply must hold a single JSON object with exactly the string fields
/// `subject` and `body`. Code fences and leading labels such as `json` or
/// `Here is the email:` are stripped first.
pub fn parse_generated_text(raw: &str) -> Result<GeneratedText, ReplyError> {
    let candidate = strip_wrapping(raw);
    serde_json::from_str(candidate).map_err(|err| ReplyError {
        reason: err.to_string(),
        raw: raw.to_string(),
    })
}

/// Remove code fences, a leading `json` label, and any prose around the object.
pub fn strip_wrapping(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
        if let Some(end) = text.rfind("```") {
            text = &text[..end];
        }
    }
    text = text.trim();

    if text.get(..4).is_some_and(|label| label.eq_ignore_ascii_case("json")) {
        text = text[4..].trim_start().trim_start_matches(':').trim();
    }

    if !text.starts_with('{') {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if start < end {
                text = &text[start..=end];
            }
        }
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language_tag() {
        assert_eq!(strip_wrapping("```json\n{}\n```"), "{}");
        assert_eq!(strip_wrapping("```\n{}\n```"), "{}");
        assert_eq!(strip_wrapping("{}"), "{}");
    }

    #[test]
    fn strips_label_and_prose() {
        assert_eq!(strip_wrapping("JSON: {\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_wrapping("Here is the email: {\"a\":1} Thanks!"), "{\"a\":1}");
    }

    #[test]
    fn leaves_text_without_object_alone() {
        assert_eq!(strip_wrapping("  no object here "), "no object here");
    }
}
