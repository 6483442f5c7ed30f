use chrono::{DateTime, Utc};

const DELIMITER: &str = "---";
const FALLBACK_TAG: &str = "uncategorized";

/// Builds a Jekyll post: YAML front matter followed by the Markdown body.
pub fn build_post_document(
    title: &str,
    published: &DateTime<Utc>,
    tags: &[String],
    body_markdown: &str,
) -> String {
    let tag_lines = if tags.is_empty() {
        format!("  - \"{FALLBACK_TAG}\"")
    } else {
        tags.iter()
            .map(|tag| format!("  - \"{}\"", yaml_escape(tag)))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let frontmatter = format!(
        "---\ntitle: \"{title}\"\ndate: {date}\ntags:\n{tags}\n---\n\n",
        title = yaml_title(title),
        date = published.format("%Y-%m-%d %H:%M:%S +0000"),
        tags = tag_lines,
    );
    format!(
        "{frontmatter}{body}",
        frontmatter = frontmatter,
        body = body_markdown
    )
}

/// Quotes are escaped; colons become `&#58;` so themes render them literally.
fn yaml_title(title: &str) -> String {
    yaml_escape(title).replace(':', "&#58;")
}

/// Escapes text for use inside a double-quoted YAML scalar.
fn yaml_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Splits `---`-delimited front matter from the body.
///
/// Returns `("", text)` when the text does not open with a complete block.
pub fn split_front_matter(text: &str) -> (&str, &str) {
    let Some(rest) = text.strip_prefix(DELIMITER) else {
        return ("", text);
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return ("", text);
    };
    let Some(idx) = rest.find("\n---") else {
        return ("", text);
    };
    let end = text.len() - rest.len() + idx + "\n---".len();
    (&text[..end], &text[end..])
}
