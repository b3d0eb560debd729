//! On-disk card cache. One rendered file per track identifier lives directly
//! under the cache root, next to short-lived cover downloads that are removed
//! once a render finishes.
//!
//! - `CardCache::resolve` answers "is there already a card for this id".
//! - `CardCache::card_path` and `temp_prefix` fix the naming scheme.
//! - `CardCache::discard` removes a transient file, swallowing failures.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::TrackId;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to inspect card cache at {path}: {source}")]
    Inspect { path: PathBuf, source: io::Error },
    #[error("cache entry at {0} is not a file")]
    NotAFile(PathBuf),
    #[error("failed to create card cache directory {path}: {source}")]
    CreateRoot { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone)]
pub struct CardCache {
    root: PathBuf,
}

impl CardCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root).map_err(|source| CacheError::CreateRoot {
            path: self.root.clone(),
            source,
        })
    }

    pub fn card_path(&self, id: &TrackId) -> PathBuf {
        self.root.join(format!("{id}_card.png"))
    }

    /// File-name prefix for the transient cover download of `id`.
    pub fn temp_prefix(id: &TrackId) -> String {
        format!("thumb_{id}_")
    }

    pub fn resolve(&self, id: &TrackId) -> Result<Option<PathBuf>, CacheError> {
        let path = self.card_path(id);
        let exists = path.try_exists().map_err(|source| CacheError::Inspect {
            path: path.clone(),
            source,
        })?;
        if !exists {
            debug!(track = %id, path = %path.display(), "no cached card");
            return Ok(None);
        }
        if !path.is_file() {
            return Err(CacheError::NotAFile(path));
        }
        debug!(track = %id, path = %path.display(), "cached card found");
        Ok(Some(path))
    }

    pub fn discard(path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed transient file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                debug!(path = %path.display(), error = %err, "failed to remove transient file")
            }
        }
    }
}
