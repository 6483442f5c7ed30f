//! Pattern-based HTML to Markdown normalization.
//!
//! Each pass is a full scan-and-substitute over the output of the previous one,
//! so the order of [`normalize`] matters: later passes assume the tag forms
//! handled earlier are already gone. Unbalanced tags are never an error; an
//! opener without its closer is left alone and removed by the final strip.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::persist::PersistError;
use crate::relocate::{is_data_uri, ImageRelocator};

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("hardcoded regex is valid")
}

static COMMENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)<!--.*?-->"));
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<style\b[^>]*>.*?</style\s*>"));
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<script\b[^>]*>.*?</script\s*>"));

/// Deepest level first so an outer heading never swallows an inner rewrite.
static HEADINGS: LazyLock<Vec<(usize, Regex)>> = LazyLock::new(|| {
    (1..=6)
        .rev()
        .map(|level| {
            (
                level,
                pattern(&format!(r"(?is)<h{level}\b[^>]*>(.*?)</h{level}\s*>")),
            )
        })
        .collect()
});

static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<p\b[^>]*>(.*?)</p\s*>"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<br\s*/?>"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<b\b[^>]*>(.*?)</b\s*>"));
static STRONG: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<strong\b[^>]*>(.*?)</strong\s*>"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<i\b[^>]*>(.*?)</i\s*>"));
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<em\b[^>]*>(.*?)</em\s*>"));
static LINK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<a\b([^>]*)>(.*?)</a\s*>"));
static IMAGE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<img\b([^>]*)>"));
static UNORDERED_LIST: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<ul\b[^>]*>(.*?)</ul\s*>"));
static ORDERED_LIST: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<ol\b[^>]*>(.*?)</ol\s*>"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<li\b[^>]*>(.*?)</li\s*>"));
static PREFORMATTED: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<pre\b([^>]*)>(.*?)</pre\s*>"));
static CODE_OPEN: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<code\b([^>]*)>"));
static CODE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<code\b[^>]*>(.*?)</code\s*>"));
static BLOCKQUOTE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<blockquote\b[^>]*>(.*?)</blockquote\s*>"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"<[^>]*>"));
static EXTRA_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| pattern(r"\n{3,}"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});

const BULLET: &str = "* ";
const FENCE: &str = "```";

/// Converts a post body from HTML to Markdown.
///
/// Every `<img>` with a non-inline source is handed to `relocator` together with
/// its 1-based position among such images; the returned reference replaces the
/// source URL. A relocator error aborts the whole conversion.
pub fn normalize<R>(raw: &str, relocator: &mut R) -> Result<String, PersistError>
where
    R: ImageRelocator + ?Sized,
{
    let content = strip_non_content(raw);
    let content = convert_headings(&content);
    let content = convert_inline(&content);
    let content = convert_links(&content);
    let content = convert_images(&content, relocator)?;
    let content = convert_lists(&content);
    let content = convert_code_blocks(&content);
    let content = CODE.replace_all(&content, "`${1}`");
    let content = convert_blockquotes(&content);
    Ok(finish(&content))
}

fn strip_non_content(content: &str) -> String {
    let content = COMMENT.replace_all(content, "");
    let content = STYLE_BLOCK.replace_all(&content, "");
    SCRIPT_BLOCK.replace_all(&content, "").into_owned()
}

fn convert_headings(content: &str) -> String {
    let mut content = content.to_string();
    for (level, regex) in HEADINGS.iter() {
        let replacement = format!("\n\n{} ${{1}}\n\n", "#".repeat(*level));
        content = regex.replace_all(&content, replacement.as_str()).into_owned();
    }
    content
}

fn convert_inline(content: &str) -> String {
    let content = PARAGRAPH.replace_all(content, "\n\n${1}\n\n");
    let content = LINE_BREAK.replace_all(&content, "\n");
    let content = BOLD.replace_all(&content, "**${1}**");
    let content = STRONG.replace_all(&content, "**${1}**");
    let content = ITALIC.replace_all(&content, "*${1}*");
    EMPHASIS.replace_all(&content, "*${1}*").into_owned()
}

fn convert_links(content: &str) -> String {
    LINK.replace_all(content, |caps: &Captures| {
        let attrs = group(caps, 1);
        let text = group(caps, 2);
        match attribute(attrs, "href") {
            Some(href) => format!("[{text}]({href})"),
            None => text.to_string(),
        }
    })
    .into_owned()
}

/// The sequence counter lives here, threaded through the scan in document order.
fn convert_images<R>(content: &str, relocator: &mut R) -> Result<String, PersistError>
where
    R: ImageRelocator + ?Sized,
{
    let mut output = String::with_capacity(content.len());
    let mut last_end = 0;
    let mut sequence = 0u32;

    for caps in IMAGE.captures_iter(content) {
        let Some(tag) = caps.get(0) else { continue };
        let attrs = group(&caps, 1);
        let Some(src) = attribute(attrs, "src").map(str::trim).filter(|s| !s.is_empty()) else {
            // Nothing to point at; the final strip drops the tag.
            continue;
        };

        output.push_str(&content[last_end..tag.start()]);
        last_end = tag.end();

        let reference = if is_data_uri(src) {
            src.to_string()
        } else {
            sequence += 1;
            relocator.relocate_image(src, sequence)?
        };
        let alt = attribute(attrs, "alt").unwrap_or_default();
        output.push_str(&format!("![{alt}]({reference})"));
    }

    output.push_str(&content[last_end..]);
    Ok(output)
}

fn convert_lists(content: &str) -> String {
    let content = UNORDERED_LIST.replace_all(content, |caps: &Captures| {
        render_list(group(caps, 1), |_| BULLET.to_string())
    });
    ORDERED_LIST
        .replace_all(&content, |caps: &Captures| {
            render_list(group(caps, 1), |index| format!("{}. ", index + 1))
        })
        .into_owned()
}

/// One line per `<li>`; source numbering is ignored.
fn render_list(items_html: &str, marker: impl Fn(usize) -> String) -> String {
    let mut output = String::from("\n");
    for (index, caps) in LIST_ITEM.captures_iter(items_html).enumerate() {
        let item = join_lines(group(&caps, 1));
        output.push_str(&marker(index));
        output.push_str(&item);
        output.push('\n');
    }
    output.push('\n');
    output
}

fn join_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn convert_code_blocks(content: &str) -> String {
    PREFORMATTED
        .replace_all(content, |caps: &Captures| {
            let pre_attrs = group(caps, 1);
            let inner = group(caps, 2);

            let language = class_language(pre_attrs).or_else(|| {
                CODE_OPEN
                    .captures(inner)
                    .and_then(|code| class_language(group(&code, 1)))
            });
            let code = CODE.replace_all(inner, "${1}");
            let code = code.trim();

            format!(
                "\n{FENCE}{lang}\n{code}\n{FENCE}\n",
                lang = language.unwrap_or_default()
            )
        })
        .into_owned()
}

/// Language named by a `language-*` or `lang-*` class, if any.
pub(crate) fn class_language(attrs: &str) -> Option<&str> {
    attribute(attrs, "class")?.split_whitespace().find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
            .filter(|lang| !lang.is_empty())
    })
}

fn convert_blockquotes(content: &str) -> String {
    BLOCKQUOTE
        .replace_all(content, |caps: &Captures| {
            let mut output = String::from("\n");
            for line in group(caps, 1).trim().lines().map(str::trim) {
                if line.is_empty() {
                    continue;
                }
                output.push_str("> ");
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
            output
        })
        .into_owned()
}

fn finish(content: &str) -> String {
    let content = ANY_TAG.replace_all(content, "");
    let content = EXTRA_BLANK_LINES.replace_all(&content, "\n\n");
    let content: Cow<'_, str> = html_escape::decode_html_entities(&content);
    content.trim().to_string()
}

/// Value of attribute `name` within a tag's attribute text.
///
/// Attribute order does not matter; single, double and unquoted values work.
pub(crate) fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    ATTRIBUTE.captures_iter(attrs).find_map(|caps| {
        let key = caps.get(1)?;
        if !key.as_str().eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|value| value.as_str())
    })
}

fn group<'a>(caps: &Captures<'a>, index: usize) -> &'a str {
    caps.get(index).map_or("", |m| m.as_str())
}
