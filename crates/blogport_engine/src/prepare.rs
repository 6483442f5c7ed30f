//! Cleanup applied to exported post HTML before it is normalized.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex, RegexBuilder};

use crate::normalize::class_language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    Python,
    Java,
    Html,
    C,
    Cpp,
    Php,
    Sql,
}

impl Language {
    pub fn class_name(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Html => "html",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Php => "php",
            Language::Sql => "sql",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Ordered detection rules; the first match wins.
static LANGUAGE_RULES: LazyLock<Vec<(Language, Regex)>> = LazyLock::new(|| {
    let rule = |language: Language, source: &str, case_insensitive: bool| {
        let regex = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()
            .expect("hardcoded regex is valid");
        (language, regex)
    };
    vec![
        rule(Language::JavaScript, r"\b(function|var|let|const)\s|=>\s", false),
        rule(Language::Python, r"\b(def|class|import|from)\b|if __name__", false),
        rule(Language::Java, r"\b(public|private|class|void|String)\s", false),
        rule(Language::Html, r"(<|&lt;)(html|div|span|p>|p&gt;|a\s)", true),
        rule(Language::C, r"#include|\bint\s+main\b|\bprintf\b|\bscanf\b", false),
        rule(Language::Cpp, r"\bnamespace\b|\busing\s+std\b|\btemplate\b|\bcout\b", false),
        rule(Language::Php, r"\$|\bfunction\b|\becho\b|<\?php|&lt;\?php", false),
        rule(Language::Sql, r"\b(select|from|where|insert|update|delete)\b", true),
    ]
});

/// Guesses a code block's language from keywords in its content.
///
/// Advisory only: explicit `language-*` classes always take precedence.
pub fn detect_language(code: &str) -> Option<Language> {
    LANGUAGE_RULES
        .iter()
        .find(|(_, regex)| regex.is_match(code))
        .map(|(language, _)| *language)
}

static PREFORMATTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b([^>]*)>(.*?)</pre\s*>").expect("hardcoded regex is valid")
});
static CODE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<code\b([^>]*)>").expect("hardcoded regex is valid"));
static BARE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br>").expect("hardcoded regex is valid"));
static STYLE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+style\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("hardcoded regex is valid")
});
static PRESENTATION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:font|span|div)\b[^>]*>").expect("hardcoded regex is valid")
});

/// Cleans exported HTML: closes bare `<br>`, tags unlabeled code blocks with a
/// detected language, drops inline styles and unwraps `font`/`span`/`div`.
pub fn prepare_markup(raw: &str) -> String {
    let content = BARE_BREAK.replace_all(raw, "<br />");
    let content = annotate_code_languages(&content);
    let content = STYLE_ATTRIBUTE.replace_all(&content, "");
    PRESENTATION_TAG.replace_all(&content, "").into_owned()
}

/// Adds `class="language-X"` to `<pre>` blocks that carry no language class.
pub fn annotate_code_languages(content: &str) -> String {
    PREFORMATTED
        .replace_all(content, |caps: &Captures| {
            let block = caps.get(0).map_or("", |m| m.as_str());
            let pre_attrs = caps.get(1).map_or("", |m| m.as_str());
            let inner = caps.get(2).map_or("", |m| m.as_str());

            let code_attrs = CODE_OPEN
                .captures(inner)
                .and_then(|code| code.get(1))
                .map(|m| m.as_str());
            let labeled = class_language(pre_attrs).is_some()
                || code_attrs.and_then(class_language).is_some();
            if labeled {
                return block.to_string();
            }

            match detect_language(inner) {
                Some(language) => {
                    let class = format!(r#" class="language-{language}""#);
                    if code_attrs.is_some() {
                        insert_after_tag_name(block, "<code", &class)
                    } else {
                        insert_after_tag_name(block, "<pre", &class)
                    }
                }
                None => block.to_string(),
            }
        })
        .into_owned()
}

fn insert_after_tag_name(block: &str, tag: &str, insertion: &str) -> String {
    let lower = block.to_ascii_lowercase();
    match lower.find(tag) {
        Some(idx) => {
            let at = idx + tag.len();
            format!("{}{insertion}{}", &block[..at], &block[at..])
        }
        None => block.to_string(),
    }
}
