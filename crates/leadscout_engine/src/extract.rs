use ego_tree::NodeRef;
use leadscout_core::{ErrorKind, Record, UNKNOWN_AUTHOR};
use scout_logging::scout_debug;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::contacts::{find_emails, find_websites};

/// Where a feed keeps each field. Selectors in a list are tried in order and
/// the first one yielding non-empty text wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorPolicy {
    pub item_selector: String,
    pub id_attribute: String,
    pub author_selectors: Vec<String>,
    /// Substring identifying a profile link.
    pub profile_marker: String,
    /// Origin used to absolutize relative profile links.
    pub site_origin: String,
    pub body_selectors: Vec<String>,
    /// Toggle that reveals truncated post text, if the feed has one.
    pub expand_selector: Option<String>,
    pub expand_script: Option<String>,
    /// Hosts that never count as a lead website (the feed's own links).
    pub ignored_website_hosts: Vec<String>,
    pub keep_raw_markup: bool,
}

impl Default for SelectorPolicy {
    fn default() -> Self {
        Self {
            item_selector: "div[data-urn]".to_string(),
            id_attribute: "data-urn".to_string(),
            author_selectors: vec![
                "span[class*='actor__name']".to_string(),
                "span[class*='actor__title'] span[dir='ltr']".to_string(),
            ],
            profile_marker: "/in/".to_string(),
            site_origin: "https://www.linkedin.com".to_string(),
            body_selectors: vec![
                "span[class*='update-components-text']".to_string(),
                "div[class*='feed-shared-text']".to_string(),
                "div[class*='feed-shared-update-v2']".to_string(),
            ],
            expand_selector: Some("button[class*='see-more']".to_string()),
            expand_script: Some(
                "document.querySelectorAll(\"button[class*='see-more']\")\
                 .forEach(function (b) { try { b.click(); } catch (e) {} });"
                    .to_string(),
            ),
            ignored_website_hosts: vec![
                "linkedin.com".to_string(),
                "licdn.com".to_string(),
                "w3.org".to_string(),
            ],
            keep_raw_markup: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// One top-level feed item cut out of a page snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub item_id: String,
    pub markup: String,
}

pub trait RecordExtractor: Send + Sync {
    /// Top-level items of a page in document order. Items without an id
    /// are skipped and nested matches belong to their outermost item.
    fn split(&self, dom: &str) -> Vec<FeedItem>;

    /// Never fails: missing fields degrade to placeholders.
    fn extract(&self, item: &FeedItem, keyword: &str) -> Record;

    fn expand_selector(&self) -> Option<&str> {
        None
    }

    fn expand_script(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug)]
pub struct SelectorExtractor {
    policy: SelectorPolicy,
    item: Selector,
    author: Vec<Selector>,
    body: Vec<Selector>,
    anchor: Selector,
}

impl SelectorExtractor {
    pub fn new(policy: SelectorPolicy) -> Result<Self, ExtractError> {
        let item = compile(&policy.item_selector)?;
        let author = policy
            .author_selectors
            .iter()
            .map(|css| compile(css))
            .collect::<Result<Vec<_>, _>>()?;
        let body = policy
            .body_selectors
            .iter()
            .map(|css| compile(css))
            .collect::<Result<Vec<_>, _>>()?;
        let anchor = compile("a[href]")?;
        Ok(Self {
            policy,
            item,
            author,
            body,
            anchor,
        })
    }

    pub fn policy(&self) -> &SelectorPolicy {
        &self.policy
    }

    fn profile_url(&self, fragment: &Html) -> Option<String> {
        let href = fragment
            .select(&self.anchor)
            .filter_map(|anchor| anchor.value().attr("href"))
            .find(|href| href.contains(&self.policy.profile_marker))?;
        if href.starts_with("http://") || href.starts_with("https://") {
            return Some(href.to_string());
        }
        let origin = Url::parse(&self.policy.site_origin).ok()?;
        origin.join(href).ok().map(String::from)
    }
}

impl RecordExtractor for SelectorExtractor {
    fn split(&self, dom: &str) -> Vec<FeedItem> {
        let document = Html::parse_document(dom);
        let mut items = Vec::new();
        for element in document.select(&self.item) {
            let nested = element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| self.item.matches(&ancestor));
            if nested {
                continue;
            }
            let Some(item_id) = element
                .value()
                .attr(&self.policy.id_attribute)
                .map(str::trim)
                .filter(|id| !id.is_empty())
            else {
                continue;
            };
            items.push(FeedItem {
                item_id: item_id.to_string(),
                markup: element.html(),
            });
        }
        items
    }

    fn extract(&self, item: &FeedItem, keyword: &str) -> Record {
        let fragment = Html::parse_fragment(&item.markup);

        let author = first_text(&fragment, &self.author).unwrap_or_else(|| {
            scout_debug!("{} on item {}: no author", ErrorKind::ExtractionDegraded, item.item_id);
            UNKNOWN_AUTHOR.to_string()
        });
        let profile_url = self.profile_url(&fragment).unwrap_or_else(|| {
            scout_debug!(
                "{} on item {}: no profile link",
                ErrorKind::ExtractionDegraded,
                item.item_id
            );
            String::new()
        });
        let text = first_text(&fragment, &self.body)
            .unwrap_or_else(|| node_text(*fragment.root_element()));

        let mut emails = find_emails(&text);
        emails.extend(find_emails(&item.markup));
        let ignored = &self.policy.ignored_website_hosts;
        let mut websites = find_websites(&text, ignored);
        websites.extend(find_websites(&item.markup, ignored));

        Record {
            item_id: item.item_id.clone(),
            author,
            profile_url,
            emails,
            websites,
            text,
            raw_markup: self.policy.keep_raw_markup.then(|| item.markup.clone()),
            keyword: keyword.to_string(),
        }
    }

    fn expand_selector(&self) -> Option<&str> {
        self.policy.expand_selector.as_deref()
    }

    fn expand_script(&self) -> Option<&str> {
        self.policy.expand_script.as_deref()
    }
}

fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|err| ExtractError::InvalidSelector {
        selector: css.to_string(),
        message: err.to_string(),
    })
}

fn first_text(fragment: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        fragment
            .select(selector)
            .map(|element| node_text(*element))
            .find(|text| !text.is_empty())
    })
}

/// Visible text of a subtree, one space between text runs.
fn node_text(node: NodeRef<'_, Node>) -> String {
    let mut parts = Vec::new();
    for descendant in node.descendants() {
        if let Node::Text(text) = descendant.value() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }
    parts.join(" ")
}
