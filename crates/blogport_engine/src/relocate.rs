use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use blogport_logging::{blogport_debug, blogport_info, blogport_warn};

use crate::fetch::Fetcher;
use crate::filename::asset_filename;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::types::{AssetOutcome, AssetStats};

#[derive(Debug, Clone)]
pub struct RelocateSettings {
    /// URL path under which the destination directory is published.
    pub public_prefix: String,
    /// Pause after each network fetch. Cache hits and data URIs do not wait.
    pub fetch_delay: Duration,
}

impl Default for RelocateSettings {
    fn default() -> Self {
        Self {
            public_prefix: "/assets/images".to_string(),
            fetch_delay: Duration::from_millis(500),
        }
    }
}

/// Result of one relocation: the reference to substitute plus what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocated {
    pub reference: String,
    pub outcome: AssetOutcome,
}

pub fn is_data_uri(url: &str) -> bool {
    url.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Downloads remote images into a local directory under deterministic names.
pub struct AssetRelocator<F> {
    fetcher: F,
    settings: RelocateSettings,
}

impl<F: Fetcher> AssetRelocator<F> {
    pub fn new(fetcher: F, settings: RelocateSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &RelocateSettings {
        &self.settings
    }

    /// Returns the local reference for `url`, fetching it if needed.
    ///
    /// Fetch failures fall back to the original URL and are only logged.
    /// Errors writing into `destination_dir` are returned.
    pub fn relocate(
        &self,
        url: &str,
        destination_dir: &Path,
        naming_seed: &str,
        sequence: u32,
    ) -> Result<Relocated, PersistError> {
        if is_data_uri(url) {
            blogport_debug!("Leaving inline data URI in place (image {})", sequence);
            return Ok(Relocated {
                reference: url.to_string(),
                outcome: AssetOutcome::Inline,
            });
        }

        let filename = asset_filename(naming_seed, sequence, url);
        let reference = self.public_reference(&filename);
        let local_path = destination_dir.join(&filename);
        if local_path.exists() {
            blogport_debug!("Image already present: {:?}", local_path);
            return Ok(Relocated {
                reference,
                outcome: AssetOutcome::Cached,
            });
        }

        blogport_info!("Downloading image: {}", url);
        let output = match self.fetcher.fetch(url) {
            Ok(output) => output,
            Err(err) => {
                blogport_warn!("Error downloading image {}: {}", url, err);
                return Ok(Relocated {
                    reference: url.to_string(),
                    outcome: AssetOutcome::KeptRemote,
                });
            }
        };

        let writer = AtomicFileWriter::new(PathBuf::from(destination_dir));
        writer.write_bytes(&filename, &output.bytes)?;

        if !self.settings.fetch_delay.is_zero() {
            thread::sleep(self.settings.fetch_delay);
        }

        Ok(Relocated {
            reference,
            outcome: AssetOutcome::Fetched,
        })
    }

    fn public_reference(&self, filename: &str) -> String {
        let prefix = self.settings.public_prefix.trim_end_matches('/');
        format!("{prefix}/{filename}")
    }
}

/// Seam between the normalizer and whatever handles image references.
///
/// `sequence` starts at 1 and counts non-inline images in document order.
pub trait ImageRelocator {
    fn relocate_image(&mut self, url: &str, sequence: u32) -> Result<String, PersistError>;
}

impl<T> ImageRelocator for T
where
    T: FnMut(&str, u32) -> Result<String, PersistError>,
{
    fn relocate_image(&mut self, url: &str, sequence: u32) -> Result<String, PersistError> {
        self(url, sequence)
    }
}

/// Leaves every image reference untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepRemote;

impl ImageRelocator for KeepRemote {
    fn relocate_image(&mut self, url: &str, _sequence: u32) -> Result<String, PersistError> {
        Ok(url.to_string())
    }
}

/// An [`AssetRelocator`] bound to one document's destination and naming context.
pub struct DocumentAssets<'a, F> {
    relocator: &'a AssetRelocator<F>,
    destination_dir: &'a Path,
    naming_seed: &'a str,
    document_id: &'a str,
    stats: AssetStats,
}

impl<'a, F: Fetcher> DocumentAssets<'a, F> {
    pub fn new(
        relocator: &'a AssetRelocator<F>,
        destination_dir: &'a Path,
        naming_seed: &'a str,
        document_id: &'a str,
    ) -> Self {
        Self {
            relocator,
            destination_dir,
            naming_seed,
            document_id,
            stats: AssetStats::default(),
        }
    }

    pub fn stats(&self) -> AssetStats {
        self.stats
    }
}

impl<F: Fetcher> ImageRelocator for DocumentAssets<'_, F> {
    fn relocate_image(&mut self, url: &str, sequence: u32) -> Result<String, PersistError> {
        let relocated =
            self.relocator
                .relocate(url, self.destination_dir, self.naming_seed, sequence)?;
        if relocated.outcome == AssetOutcome::KeptRemote {
            blogport_warn!(
                "Post {}: image {} kept at remote URL {}",
                self.document_id,
                sequence,
                url
            );
        }
        self.stats.record(relocated.outcome);
        Ok(relocated.reference)
    }
}
