mod cache;
mod download;
mod metadata;
mod remote;

pub use cache::{CacheError, CardCache};
pub use download::{DownloadError, ThumbnailDownloader};
pub use metadata::{
    classify_duration, normalize_title, DurationLabel, MetadataFetcher, TrackMetadata,
    FALLBACK_ARTIST, FALLBACK_TITLE, LIVE_LABEL, UNTITLED,
};
pub use remote::{
    Channel, FetchResponse, HttpFetch, LookupConfig, LookupError, ReqwestFetcher, SearchClient,
    SearchResponse, Thumbnail, UnavailableLookup, VideoLookup, VideoRecord,
};

use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("track identifier must not be empty")]
    Empty,
    #[error("unable to extract a track identifier from '{0}'")]
    Unrecognized(String),
    #[error("track identifier '{0}' contains characters outside [A-Za-z0-9_-]")]
    InvalidCharacters(String),
}

/// Opaque key naming one media item. Only `[A-Za-z0-9_-]` is accepted since
/// the identifier is embedded in cache file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if !id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(IdentifierError::InvalidCharacters(id));
        }
        Ok(Self(id))
    }

    /// Accepts a bare identifier or a watch/share URL.
    pub fn from_input(input: &str) -> Result<Self, IdentifierError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if !trimmed.contains("://") && !trimmed.contains('/') {
            return Self::new(trimmed);
        }

        let without_scheme = trimmed
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(trimmed);
        let (host_and_path, query) = match without_scheme.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_scheme, None),
        };
        let host_and_path = host_and_path.split('#').next().unwrap_or(host_and_path);

        if let Some(query) = query {
            let query = query.split('#').next().unwrap_or(query);
            let from_query = query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "v")
                .map(|(_, value)| value);
            if let Some(id) = from_query {
                return Self::new(id);
            }
        }

        let mut segments = host_and_path.split('/').filter(|s| !s.is_empty());
        let host = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();
        let candidate = match rest.as_slice() {
            [id] if host.ends_with("youtu.be") => Some(*id),
            ["shorts" | "embed" | "live", id, ..] => Some(*id),
            _ => None,
        };

        match candidate {
            Some(id) => Self::new(id),
            None => Err(IdentifierError::Unrecognized(trimmed.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_identifier() {
        assert_eq!(TrackId::from_input(" dQw4w9WgXcQ ").unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn parses_watch_url() {
        let id = TrackId::from_input("https://www.youtube.com/watch?v=abc_123-x&t=42").unwrap();
        assert_eq!(id.as_str(), "abc_123-x");
    }

    #[test]
    fn parses_short_links() {
        assert_eq!(
            TrackId::from_input("https://youtu.be/abc123?si=share").unwrap().as_str(),
            "abc123"
        );
        assert_eq!(
            TrackId::from_input("https://www.youtube.com/shorts/xyz789").unwrap().as_str(),
            "xyz789"
        );
    }

    #[test]
    fn rejects_path_like_identifiers() {
        assert_eq!(
            TrackId::new("../etc"),
            Err(IdentifierError::InvalidCharacters("../etc".into()))
        );
        assert_eq!(TrackId::from_input("   "), Err(IdentifierError::Empty));
        assert!(matches!(
            TrackId::from_input("https://example.net/about"),
            Err(IdentifierError::Unrecognized(_))
        ));
    }
}
