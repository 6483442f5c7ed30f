//! Blogport engine: Blogger export to Jekyll conversion.
mod blogger;
mod decode;
mod fetch;
mod filename;
mod frontmatter;
mod normalize;
mod organize;
mod persist;
mod pipeline;
mod prepare;
mod relocate;
mod site_config;
mod types;

pub use blogger::{parse_export, read_export, BlogExport, BlogInfo, BlogPost, ExportError};
pub use decode::{decode_export, DecodeError, DecodedText};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use filename::{asset_filename, post_filename, slugify};
pub use frontmatter::{build_post_document, split_front_matter};
pub use normalize::normalize;
pub use organize::{organize_posts, OrganizeSummary};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{
    convert_export, convert_posts, normalize_posts_in_place, ConversionSummary, ConvertOptions,
    ConvertedPost, MigrateError,
};
pub use prepare::{annotate_code_languages, detect_language, prepare_markup, Language};
pub use relocate::{
    is_data_uri, AssetRelocator, DocumentAssets, ImageRelocator, KeepRemote, RelocateSettings,
    Relocated,
};
pub use site_config::render_site_config;
pub use types::{AssetOutcome, AssetStats, FailureKind, FetchError, FetchMetadata, FetchOutput};
