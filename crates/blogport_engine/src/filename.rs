use chrono::NaiveDate;
use url::Url;

const DEFAULT_EXTENSION: &str = ".jpg";
/// Longest extension (dot included) taken from a URL before falling back.
const MAX_EXTENSION_LEN: usize = 5;
const UNTITLED: &str = "untitled";

/// Lowercase slug: every run of non-alphanumeric characters becomes a single `-`,
/// with separators trimmed from both ends.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Deterministic asset name: `{slug(seed)}-{sequence}{ext}`.
pub fn asset_filename(naming_seed: &str, sequence: u32, url: &str) -> String {
    let mut stem = slugify(naming_seed);
    if stem.is_empty() {
        stem = UNTITLED.to_string();
    }
    format!("{stem}-{sequence}{}", url_extension(url))
}

/// `YYYY-MM-DD-{slug}.md`, the Jekyll post naming convention.
pub fn post_filename(date: NaiveDate, title: &str) -> String {
    let mut slug = slugify(title);
    if slug.is_empty() {
        slug = UNTITLED.to_string();
    }
    format!("{}-{slug}.md", date.format("%Y-%m-%d"))
}

fn url_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative references: drop query and fragment by hand.
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    let ext = match last_segment.rfind('.') {
        // A leading dot is a hidden file name, not an extension.
        Some(idx) if idx > 0 => &last_segment[idx..],
        _ => "",
    };
    if ext.len() <= 1 || ext.len() > MAX_EXTENSION_LEN {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext.to_string()
    }
}
