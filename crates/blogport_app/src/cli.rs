use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use blogport_engine::{
    convert_export, normalize_posts_in_place, organize_posts, read_export, render_site_config,
    AtomicFileWriter, ConvertOptions,
};
use blogport_logging::{blogport_debug, blogport_info};
use clap::{ArgAction, Parser, Subcommand};

use crate::logging;

/// Top-level CLI for the Blogger to Jekyll migrator.
#[derive(Debug, Parser)]
#[command(name = "blogport")]
#[command(about = "Migrate a Blogger export to a Jekyll site", long_about = None)]
pub struct Cli {
    /// More log output: -v for debug, -vv for trace.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write the log to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Convert every post in an export into a Markdown file with local images.
    Convert {
        /// Path to the Blogger Atom export (XML).
        export: PathBuf,

        /// Directory the post files are written to.
        #[arg(long, default_value = "_posts")]
        posts_dir: PathBuf,

        /// Directory downloaded images are written to.
        #[arg(long, default_value = "assets/images")]
        image_dir: PathBuf,

        /// URL path under which the image directory is published.
        #[arg(long, default_value = "/assets/images")]
        asset_prefix: String,

        /// Per-request timeout for image downloads.
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Pause after each image download.
        #[arg(long, default_value_t = 500)]
        delay_ms: u64,

        /// Write a JSON summary of the run to this path.
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Rewrite HTML bodies of existing post files as Markdown, in place.
    Markdown {
        /// Directory searched recursively for `.md` files.
        #[arg(default_value = "_posts")]
        posts_dir: PathBuf,
    },

    /// Move dated posts into year/month directories with archive pages.
    Organize {
        #[arg(default_value = "_posts")]
        posts_dir: PathBuf,
    },

    /// Generate a `_config.yml` from the blog's title and author.
    SiteConfig {
        /// Path to the Blogger Atom export (XML).
        export: PathBuf,

        #[arg(long, default_value = "_config.yml")]
        output: PathBuf,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.verbose, cli.log_file.as_deref());
    blogport_debug!("parsed arguments: {:?}", cli);
    cli.command.run()
}

impl CliCommand {
    pub fn run(self) -> Result<()> {
        match self {
            CliCommand::Convert {
                export,
                posts_dir,
                image_dir,
                asset_prefix,
                timeout_secs,
                delay_ms,
                manifest,
            } => {
                let mut options = ConvertOptions::new(posts_dir, image_dir);
                options.fetch.request_timeout = Duration::from_secs(timeout_secs);
                options.relocate.public_prefix = asset_prefix;
                options.relocate.fetch_delay = Duration::from_millis(delay_ms);
                options.manifest_path = manifest;

                let summary = convert_export(&export, &options)
                    .with_context(|| format!("converting {}", export.display()))?;
                blogport_info!(
                    "Done: {} posts, {} entries skipped, {} images local, {} remote",
                    summary.posts.len(),
                    summary.skipped_entries,
                    summary.images_localized,
                    summary.images_remote
                );
            }
            CliCommand::Markdown { posts_dir } => {
                let count = normalize_posts_in_place(&posts_dir)
                    .with_context(|| format!("rewriting posts in {}", posts_dir.display()))?;
                blogport_info!("Converted {} files to pure markdown", count);
            }
            CliCommand::Organize { posts_dir } => {
                organize_posts(&posts_dir)
                    .with_context(|| format!("organizing {}", posts_dir.display()))?;
            }
            CliCommand::SiteConfig { export, output } => {
                let blog = read_export(&export)
                    .with_context(|| format!("reading {}", export.display()))?;
                let config = render_site_config(&blog.info);
                write_output(&output, &config)?;
                blogport_info!("Wrote site configuration to {}", output.display());
            }
        }
        Ok(())
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    AtomicFileWriter::new(dir)
        .write(name, content)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
