use std::fs;
use std::path::{Path, PathBuf};

use blogport_logging::{blogport_debug, blogport_info, blogport_warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::blogger::{read_export, BlogExport, ExportError};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::filename::post_filename;
use crate::frontmatter::{build_post_document, split_front_matter};
use crate::normalize::normalize;
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::prepare::prepare_markup;
use crate::relocate::{AssetRelocator, DocumentAssets, KeepRemote, RelocateSettings};
use crate::types::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("http client error: {0}")]
    Client(#[from] FetchError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub posts_dir: PathBuf,
    pub image_dir: PathBuf,
    pub fetch: FetchSettings,
    pub relocate: RelocateSettings,
    /// Where to write a JSON summary of the run, if anywhere.
    pub manifest_path: Option<PathBuf>,
}

impl ConvertOptions {
    pub fn new(posts_dir: impl Into<PathBuf>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            image_dir: image_dir.into(),
            fetch: FetchSettings::default(),
            relocate: RelocateSettings::default(),
            manifest_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedPost {
    pub filename: String,
    pub title: String,
    pub date: String,
    pub images_localized: usize,
    pub images_remote: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub posts: Vec<ConvertedPost>,
    pub skipped_entries: usize,
    pub images_localized: usize,
    pub images_remote: usize,
}

/// Converts a Blogger export into Jekyll Markdown posts, downloading images.
pub fn convert_export(
    export_path: &Path,
    options: &ConvertOptions,
) -> Result<ConversionSummary, MigrateError> {
    let export = read_export(export_path)?;
    let fetcher = ReqwestFetcher::new(options.fetch.clone())?;
    convert_posts(&export, fetcher, options)
}

/// Writes one post file per entry of an already parsed export.
pub fn convert_posts<F: Fetcher>(
    export: &BlogExport,
    fetcher: F,
    options: &ConvertOptions,
) -> Result<ConversionSummary, MigrateError> {
    ensure_output_dir(&options.posts_dir)?;
    ensure_output_dir(&options.image_dir)?;

    let relocator = AssetRelocator::new(fetcher, options.relocate.clone());
    let writer = AtomicFileWriter::new(options.posts_dir.clone());
    let mut summary = ConversionSummary {
        skipped_entries: export.skipped,
        ..ConversionSummary::default()
    };

    for post in &export.posts {
        let prepared = prepare_markup(&post.content_html);
        let mut assets =
            DocumentAssets::new(&relocator, &options.image_dir, &post.title, &post.id);
        let body = normalize(&prepared, &mut assets)?;
        let stats = assets.stats();

        let document = build_post_document(&post.title, &post.published, &post.tags, &body);
        let filename = post_filename(post.published.date_naive(), &post.title);
        writer.write(&filename, &document)?;
        blogport_info!("Converted post: {}", post.title);

        summary.images_localized += stats.localized();
        summary.images_remote += stats.kept_remote;
        summary.posts.push(ConvertedPost {
            filename,
            title: post.title.clone(),
            date: post.published.to_rfc3339(),
            images_localized: stats.localized(),
            images_remote: stats.kept_remote,
        });
    }

    blogport_info!(
        "Converted {} posts to Jekyll format ({} images local, {} left remote)",
        summary.posts.len(),
        summary.images_localized,
        summary.images_remote
    );

    if let Some(path) = options.manifest_path.as_deref() {
        write_manifest(path, &summary)?;
    }
    Ok(summary)
}

fn write_manifest(path: &Path, summary: &ConversionSummary) -> Result<(), MigrateError> {
    let json = serde_json::to_string_pretty(summary)?;
    let (dir, name) = split_target(path)?;
    AtomicFileWriter::new(dir).write(&name, &json)?;
    blogport_debug!("Wrote manifest to {:?}", path);
    Ok(())
}

/// Rewrites every `.md` file under `posts_dir` from HTML to Markdown, keeping
/// its front matter. Image references are left as they are.
pub fn normalize_posts_in_place(posts_dir: &Path) -> Result<usize, MigrateError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(posts_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some("md")
        {
            files.push(entry.into_path());
        }
    }
    blogport_info!("Found {} markdown files to process", files.len());

    for path in &files {
        let content = fs::read_to_string(path)?;
        let (front_matter, body) = split_front_matter(&content);
        let markdown = normalize(body, &mut KeepRemote)?;
        let output = if front_matter.is_empty() {
            markdown
        } else {
            format!("{front_matter}\n\n{markdown}")
        };

        let (dir, name) = split_target(path)?;
        AtomicFileWriter::new(dir).write(&name, &output)?;
        blogport_debug!("Converted {:?} to pure markdown", path);
    }

    Ok(files.len())
}

fn split_target(path: &Path) -> Result<(PathBuf, String), MigrateError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);
    let Some(name) = name else {
        blogport_warn!("Not a file path: {:?}", path);
        return Err(MigrateError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        )));
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name))
}
