//! Contact pattern matching over free text and markup.
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern")
});

static WEBSITE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(https?://[\w.-]+(?:/[\w.-]*)*|www\.[\w.-]+(?:/[\w.-]*)*)").expect("website pattern")
});

// Asset names such as `logo@2x.png` look like addresses.
const ASSET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

pub fn find_emails(haystack: &str) -> BTreeSet<String> {
    EMAIL_PATTERN
        .find_iter(haystack)
        .map(|found| found.as_str())
        .filter(|email| {
            let lower = email.to_ascii_lowercase();
            !ASSET_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
        })
        .map(str::to_owned)
        .collect()
}

/// Website-like substrings, minus any whose host is (a subdomain of) one of
/// `ignored_hosts`.
pub fn find_websites(haystack: &str, ignored_hosts: &[String]) -> BTreeSet<String> {
    WEBSITE_PATTERN
        .find_iter(haystack)
        .map(|found| found.as_str().trim_end_matches(['.', '-']))
        .filter(|site| !site.is_empty() && !is_ignored(site, ignored_hosts))
        .map(str::to_owned)
        .collect()
}

fn is_ignored(site: &str, ignored_hosts: &[String]) -> bool {
    let Some(host) = host_of(site) else {
        return false;
    };
    ignored_hosts.iter().any(|ignored| {
        let ignored = ignored.trim().to_ascii_lowercase();
        host == ignored || host.ends_with(&format!(".{ignored}"))
    })
}

fn host_of(site: &str) -> Option<String> {
    let lower = site.to_ascii_lowercase();
    let absolute = if lower.starts_with("http://") || lower.starts_with("https://") {
        lower
    } else {
        format!("http://{lower}")
    };
    let parsed = Url::parse(&absolute).ok()?;
    parsed.host_str().map(str::to_owned)
}
