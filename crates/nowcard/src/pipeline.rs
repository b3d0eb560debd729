use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compositor::{encode_png, load_cover, CardContent, CardRenderer};
use image::ImageError;
use lookup::{
    CacheError, CardCache, MetadataFetcher, ThumbnailDownloader, TrackId, TrackMetadata,
};
use tempfile::TempPath;
use tracing::{debug, info, warn};

/// What a single invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutput {
    /// A card for this identifier already existed.
    Cached(PathBuf),
    /// A new card was rendered and saved.
    Rendered(PathBuf),
    /// The cover could not be obtained; callers should show this image URL.
    Fallback(String),
}

impl fmt::Display for CardOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardOutput::Cached(path) => write!(f, "cached {}", path.display()),
            CardOutput::Rendered(path) => write!(f, "rendered {}", path.display()),
            CardOutput::Fallback(url) => write!(f, "fallback {url}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("failed to create temporary file in {path}: {source}")]
    TempFile { path: PathBuf, source: io::Error },
    #[error("failed to encode card: {0}")]
    Encode(#[source] ImageError),
    #[error("failed to write card to {path}: {source}")]
    Save { path: PathBuf, source: io::Error },
    #[error("render task aborted: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

enum RenderStep {
    Saved(PathBuf),
    UnreadableCover(ImageError),
}

#[derive(Debug, Clone)]
pub struct CardPipeline {
    cache: CardCache,
    metadata: MetadataFetcher,
    downloader: ThumbnailDownloader,
    renderer: Arc<CardRenderer>,
}

impl CardPipeline {
    pub fn new(
        cache: CardCache,
        metadata: MetadataFetcher,
        downloader: ThumbnailDownloader,
        renderer: Arc<CardRenderer>,
    ) -> Self {
        Self {
            cache,
            metadata,
            downloader,
            renderer,
        }
    }

    pub async fn generate(&self, id: &TrackId) -> Result<CardOutput, PipelineError> {
        if let Some(path) = self.cache.resolve(id)? {
            info!(track = %id, path = %path.display(), "reusing cached card");
            return Ok(CardOutput::Cached(path));
        }
        self.cache.ensure_root()?;

        let metadata = self.metadata.fetch(id).await;
        let download = self.temp_file(&CardCache::temp_prefix(id), "")?;

        if let Err(err) = self
            .downloader
            .download(&metadata.thumbnail_url, &download)
            .await
        {
            warn!(
                track = %id,
                url = %metadata.thumbnail_url,
                error = %err,
                "thumbnail download failed"
            );
            discard(download);
            return Ok(self.fallback());
        }

        let step = self.render_in_background(id, metadata, &download).await;
        discard(download);

        match step? {
            RenderStep::Saved(path) => {
                info!(track = %id, path = %path.display(), "rendered card");
                Ok(CardOutput::Rendered(path))
            }
            RenderStep::UnreadableCover(err) => {
                warn!(track = %id, error = %err, "downloaded thumbnail is not a usable image");
                Ok(self.fallback())
            }
        }
    }

    fn fallback(&self) -> CardOutput {
        CardOutput::Fallback(self.metadata.default_image_url().to_string())
    }

    fn temp_file(&self, prefix: &str, suffix: &str) -> Result<TempPath, PipelineError> {
        tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(self.cache.root())
            .map(|file| file.into_temp_path())
            .map_err(|source| PipelineError::TempFile {
                path: self.cache.root().to_path_buf(),
                source,
            })
    }

    async fn render_in_background(
        &self,
        id: &TrackId,
        metadata: TrackMetadata,
        cover_path: &Path,
    ) -> Result<RenderStep, PipelineError> {
        let renderer = Arc::clone(&self.renderer);
        let cover_path = cover_path.to_path_buf();
        let root = self.cache.root().to_path_buf();
        let destination = self.cache.card_path(id);
        let prefix = format!(".{id}_card_");

        tokio::task::spawn_blocking(move || -> Result<RenderStep, PipelineError> {
            let cover = match load_cover(&cover_path) {
                Ok(cover) => cover,
                Err(err) => return Ok(RenderStep::UnreadableCover(err)),
            };
            let accent = renderer.accent(&cover);
            debug!(?accent, "extracted accent color");

            let duration = metadata.duration.to_string();
            let content = CardContent {
                title: &metadata.title,
                artist: &metadata.artist,
                duration: &duration,
            };
            let card = renderer.render(&content, &cover, accent);
            save_card(&card, &root, &prefix, &destination)?;
            Ok(RenderStep::Saved(destination))
        })
        .await?
    }
}

/// Writes the card next to its final location and renames it into place so
/// readers never observe a partial file.
fn save_card(
    card: &image::RgbaImage,
    root: &Path,
    prefix: &str,
    destination: &Path,
) -> Result<(), PipelineError> {
    let mut staged = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".png")
        .tempfile_in(root)
        .map_err(|source| PipelineError::TempFile {
            path: root.to_path_buf(),
            source,
        })?;

    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        encode_png(card, &mut writer).map_err(PipelineError::Encode)?;
        writer.flush().map_err(|source| PipelineError::Save {
            path: destination.to_path_buf(),
            source,
        })?;
    }

    staged
        .persist(destination)
        .map_err(|err| PipelineError::Save {
            path: destination.to_path_buf(),
            source: err.error,
        })?;
    Ok(())
}

fn discard(path: TempPath) {
    let shown = path.to_path_buf();
    match path.close() {
        Ok(()) => debug!(path = %shown.display(), "removed thumbnail download"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            debug!(path = %shown.display(), error = %err, "failed to remove thumbnail download")
        }
    }
}
