//! Reader for Blogger Atom exports.
//!
//! The export is a flat `<feed>` of `<entry>` elements; it is scanned with
//! tolerant patterns rather than a full XML parser.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use blogport_logging::{blogport_debug, blogport_info, blogport_warn};
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::decode::{decode_export, DecodeError};
use crate::normalize::attribute;

const DEFAULT_BLOG_TITLE: &str = "My Blog";
const DEFAULT_AUTHOR: &str = "Author";
const MIN_CONTENT_CHARS: usize = 10;
/// Titles that belong to theme/template entries rather than posts.
const THEME_TITLE_PREFIXES: &[&str] = &["Layout:", "Post:", "Markup:"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("no <feed> element found in export")]
    MissingFeed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogInfo {
    pub title: String,
    pub author_name: String,
    pub author_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPost {
    /// Numeric suffix of the Atom id, used to tell posts apart in logs.
    pub id: String,
    pub title: String,
    pub published: DateTime<Utc>,
    pub tags: Vec<String>,
    pub content_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogExport {
    pub info: BlogInfo,
    pub posts: Vec<BlogPost>,
    /// Entries that were not posts: comments, settings, templates, stubs.
    pub skipped: usize,
}

fn element(name: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{name}\b[^>]*>(.*?)</{name}\s*>"))
        .expect("hardcoded regex is valid")
}

static FEED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<feed\b").expect("hardcoded regex is valid"));
static ENTRY: LazyLock<Regex> = LazyLock::new(|| element("entry"));
static TITLE: LazyLock<Regex> = LazyLock::new(|| element("title"));
static ID: LazyLock<Regex> = LazyLock::new(|| element("id"));
static PUBLISHED: LazyLock<Regex> = LazyLock::new(|| element("published"));
static CONTENT: LazyLock<Regex> = LazyLock::new(|| element("content"));
static AUTHOR: LazyLock<Regex> = LazyLock::new(|| element("author"));
static NAME: LazyLock<Regex> = LazyLock::new(|| element("name"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| element("email"));
static CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<category\b([^>]*)>").expect("hardcoded regex is valid"));
static IN_REPLY_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<thr:in-reply-to\b").expect("hardcoded regex is valid"));

/// Reads and decodes an export file from disk.
pub fn read_export(path: &Path) -> Result<BlogExport, ExportError> {
    let bytes = fs::read(path)?;
    let decoded = decode_export(&bytes)?;
    blogport_debug!(
        "Decoded export {:?} as {}",
        path,
        decoded.encoding_label
    );
    parse_export(&decoded.text)
}

pub fn parse_export(xml: &str) -> Result<BlogExport, ExportError> {
    let feed_start = FEED.find(xml).ok_or(ExportError::MissingFeed)?.start();
    let feed = &xml[feed_start..];
    let header_end = ENTRY.find(feed).map_or(feed.len(), |m| m.start());
    let info = parse_info(&feed[..header_end]);

    let mut posts = Vec::new();
    let mut skipped = 0;
    for (index, caps) in ENTRY.captures_iter(feed).enumerate() {
        let entry = caps.get(1).map_or("", |m| m.as_str());
        match parse_post(entry, index) {
            Some(post) => posts.push(post),
            None => skipped += 1,
        }
    }

    blogport_info!(
        "Export '{}': {} posts, {} other entries skipped",
        info.title,
        posts.len(),
        skipped
    );
    Ok(BlogExport {
        info,
        posts,
        skipped,
    })
}

fn parse_info(header: &str) -> BlogInfo {
    let title = text_of(&TITLE, header)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_BLOG_TITLE.to_string());
    let author = AUTHOR
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str());
    let author_name = text_of(&NAME, author)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
    let author_email = text_of(&EMAIL, author).unwrap_or_default();

    BlogInfo {
        title,
        author_name,
        author_email,
    }
}

fn parse_post(entry: &str, index: usize) -> Option<BlogPost> {
    let terms: Vec<String> = CATEGORY
        .captures_iter(entry)
        .filter_map(|caps| attribute(caps.get(1)?.as_str(), "term"))
        .map(|term| html_escape::decode_html_entities(term).into_owned())
        .collect();

    if !terms.iter().any(|term| term.contains("kind#post")) {
        return None;
    }
    if IN_REPLY_TO.is_match(entry) {
        return None;
    }

    let id = text_of(&ID, entry)
        .and_then(|id| id.rsplit('-').next().map(str::to_string))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("post-{index}"));

    let title = text_of(&TITLE, entry).filter(|t| !t.is_empty())?;
    if THEME_TITLE_PREFIXES
        .iter()
        .any(|prefix| title.starts_with(prefix))
    {
        blogport_debug!("Skipping theme entry {}: {}", id, title);
        return None;
    }

    let content_html = text_of(&CONTENT, entry).unwrap_or_default();
    if content_html.trim().chars().count() < MIN_CONTENT_CHARS {
        blogport_warn!("Skipping post {} with no real content", id);
        return None;
    }

    let published = text_of(&PUBLISHED, entry)
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let tags = terms
        .into_iter()
        .filter(|term| !term.is_empty() && !term.contains("kind#"))
        .collect();

    Some(BlogPost {
        id,
        title,
        published,
        tags,
        content_html,
    })
}

/// Text content of the first `regex` element in `fragment`, XML-unescaped.
fn text_of(regex: &Regex, fragment: &str) -> Option<String> {
    let raw = regex.captures(fragment)?.get(1)?.as_str().trim();
    let raw = raw
        .strip_prefix("<![CDATA[")
        .and_then(|inner| inner.strip_suffix("]]>"))
        .map(|inner| inner.to_string())
        .unwrap_or_else(|| html_escape::decode_html_entities(raw).into_owned());
    Some(raw.trim().to_string())
}
