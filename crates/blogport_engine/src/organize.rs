//! Buckets dated post files into `YYYY/MM/` directories with archive indexes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use blogport_logging::{blogport_info, blogport_warn};
use chrono::NaiveDate;
use regex::Regex;

use crate::persist::{ensure_output_dir, AtomicFileWriter};
use crate::pipeline::MigrateError;

static DATED_POST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})-(.*)\.(?:md|html)$")
        .expect("hardcoded regex is valid")
});
static YEAR_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("hardcoded regex is valid"));

const NAVIGATION_YML: &str = r#"# Main navigation links
main:
  - title: "Home"
    url: /
  - title: "Archives"
    url: /archives/
"#;

const ARCHIVES_PAGE: &str = r#"---
title: "Archives"
layout: archive
permalink: /archives/
author_profile: false
---

{% assign posts_by_year = site.posts | group_by_exp:"post", "post.date | date: '%Y'" %}
{% for year in posts_by_year %}
  <h2 id="{{ year.name }}">{{ year.name }}</h2>
  {% assign posts_by_month = year.items | group_by_exp:"post", "post.date | date: '%m'" %}
  {% for month in posts_by_month %}
    {% assign month_name = month.items[0].date | date: '%B' %}
    <h3 id="{{ year.name }}-{{ month.name }}">{{ month_name }}</h3>
    <ul>
      {% for post in month.items %}
        <li>
          <a href="{{ post.url }}">{{ post.title }}</a>
          <small>{{ post.date | format_date }}</small>
        </li>
      {% endfor %}
    </ul>
  {% endfor %}
{% endfor %}
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeSummary {
    pub moved: usize,
    /// `(year, month)` buckets that received posts, in order.
    pub months: Vec<(String, String)>,
    pub removed_leftovers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DatedPost {
    filename: String,
    /// `YYYY-MM-DD`, as written in the filename.
    date: String,
    slug: String,
}

/// Moves `YYYY-MM-DD-*.md|.html` files from `posts_dir` into `YYYY/MM/` and
/// writes year and month index pages plus the site navigation and archive page.
///
/// Existing four-digit year directories are rebuilt from scratch; post files
/// left in the root afterwards are removed.
pub fn organize_posts(posts_dir: &Path) -> Result<OrganizeSummary, MigrateError> {
    remove_year_dirs(posts_dir)?;

    let mut buckets: BTreeMap<(String, String), Vec<DatedPost>> = BTreeMap::new();
    for filename in post_files(posts_dir)? {
        let Some(caps) = DATED_POST.captures(&filename) else {
            continue;
        };
        let (year, month) = (caps[1].to_string(), caps[2].to_string());
        let date = format!("{year}-{month}-{}", &caps[3]);
        let slug = caps[4].to_string();
        buckets
            .entry((year, month))
            .or_default()
            .push(DatedPost {
                filename,
                date,
                slug,
            });
    }

    let mut summary = OrganizeSummary::default();
    for ((year, month), posts) in &buckets {
        let month_dir = posts_dir.join(year).join(month);
        ensure_output_dir(&month_dir)?;
        for post in posts {
            fs::rename(posts_dir.join(&post.filename), month_dir.join(&post.filename))?;
            blogport_info!("Moved {} to {}/{}/", post.filename, year, month);
            summary.moved += 1;
        }
    }

    for ((year, month), posts) in &buckets {
        write_year_index(posts_dir, year)?;
        write_month_index(posts_dir, year, month, posts)?;
        summary.months.push((year.clone(), month.clone()));
    }

    write_site_pages(posts_dir)?;

    for leftover in post_files(posts_dir)? {
        fs::remove_file(posts_dir.join(&leftover))?;
        blogport_warn!("Removed {} from root directory", leftover);
        summary.removed_leftovers += 1;
    }

    blogport_info!(
        "Organized {} posts into {} months",
        summary.moved,
        summary.months.len()
    );
    Ok(summary)
}

fn remove_year_dirs(posts_dir: &Path) -> Result<(), MigrateError> {
    for entry in fs::read_dir(posts_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() && YEAR_DIR.is_match(&name) {
            blogport_info!("Removing existing year directory: {}", name);
            fs::remove_dir_all(entry.path())?;
        }
    }
    Ok(())
}

/// Names of `.md`/`.html` files directly inside `dir`, sorted.
fn post_files(dir: &Path) -> Result<Vec<String>, MigrateError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".md") || name.ends_with(".html") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn month_name(year: &str, month: &str) -> String {
    let date = year
        .parse::<i32>()
        .ok()
        .zip(month.parse::<u32>().ok())
        .and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1));
    match date {
        Some(date) => date.format("%B").to_string(),
        None => month.to_string(),
    }
}

/// Existing year indexes are kept as they are.
fn write_year_index(posts_dir: &Path, year: &str) -> Result<(), MigrateError> {
    let year_dir = posts_dir.join(year);
    if year_dir.join("index.html").exists() {
        return Ok(());
    }

    let mut page = format!(
        "---\nlayout: archive\ntitle: \"Posts from {year}\"\npermalink: /{year}/\nauthor_profile: false\n---\n\n<h2>Archives for {year}</h2>\n\n<ul>\n"
    );
    for month in 1..=12u32 {
        let month = format!("{month:02}");
        if year_dir.join(&month).is_dir() {
            let name = month_name(year, &month);
            page.push_str(&format!(
                "  <li><a href=\"/{year}/{month}/\">{name}</a></li>\n"
            ));
        }
    }
    page.push_str("</ul>\n");

    AtomicFileWriter::new(year_dir).write("index.html", &page)?;
    Ok(())
}

fn write_month_index(
    posts_dir: &Path,
    year: &str,
    month: &str,
    posts: &[DatedPost],
) -> Result<(), MigrateError> {
    let name = month_name(year, month);
    let mut page = format!(
        "---\nlayout: archive\ntitle: \"Posts from {name} {year}\"\npermalink: /{year}/{month}/\nauthor_profile: false\n---\n\n<h2>Archives for {name} {year}</h2>\n\n<ul>\n"
    );
    for post in posts {
        let title = title_case(&post.slug.replace('-', " "));
        page.push_str(&format!(
            "  <li><a href=\"/{year}/{month}/{date}/{slug}/\">{title}</a></li>\n",
            date = post.date,
            slug = post.slug
        ));
    }
    page.push_str("</ul>\n");

    AtomicFileWriter::new(posts_dir.join(year).join(month)).write("index.html", &page)?;
    Ok(())
}

fn write_site_pages(posts_dir: &Path) -> Result<(), MigrateError> {
    let site_root = match posts_dir.parent() {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    AtomicFileWriter::new(site_root.join("_data")).write("navigation.yml", NAVIGATION_YML)?;
    AtomicFileWriter::new(site_root.join("_pages")).write("archives.md", ARCHIVES_PAGE)?;
    Ok(())
}

/// Uppercases the first letter of each word and lowercases the rest.
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
