//! Turns a track identifier into display-ready metadata. The lookup service
//! is allowed to fail in any way; every failure collapses into the same set of
//! placeholder values so rendering can always proceed.
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::remote::{LookupError, VideoLookup, VideoRecord};
use crate::TrackId;

pub const FALLBACK_TITLE: &str = "Unknown Title";
pub const FALLBACK_ARTIST: &str = "Unknown Artist";
pub const UNTITLED: &str = "Untitled";
pub const LIVE_LABEL: &str = "LIVE ●";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationLabel {
    Timed(String),
    Live,
}

impl DurationLabel {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for DurationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timed(text) => f.write_str(text),
            Self::Live => f.write_str(LIVE_LABEL),
        }
    }
}

/// Absent durations and the service's live markers (compared
/// case-insensitively) classify as live.
pub fn classify_duration(raw: Option<&str>) -> DurationLabel {
    match raw {
        None => DurationLabel::Live,
        Some(text) => match text.to_lowercase().as_str() {
            "" | "live" | "live now" => DurationLabel::Live,
            _ => DurationLabel::Timed(text.to_string()),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub thumbnail_url: String,
    pub duration: DurationLabel,
}

impl TrackMetadata {
    pub fn fallback(default_image_url: &str) -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            artist: FALLBACK_ARTIST.to_string(),
            thumbnail_url: default_image_url.to_string(),
            duration: DurationLabel::Live,
        }
    }

    fn from_record(record: VideoRecord, default_image_url: &str) -> Result<Self, LookupError> {
        let title = normalize_title(record.title.as_deref().unwrap_or(UNTITLED));
        let thumbnail_url = match record.thumbnails {
            None => default_image_url.to_string(),
            Some(thumbnails) => {
                let first = thumbnails.into_iter().next().ok_or_else(|| {
                    LookupError::Malformed("thumbnail list is empty".to_string())
                })?;
                first
                    .url
                    .unwrap_or_else(|| default_image_url.to_string())
            }
        };
        let artist = record
            .channel
            .and_then(|channel| channel.name)
            .unwrap_or_else(|| FALLBACK_ARTIST.to_string());
        let duration = classify_duration(record.duration.as_deref());

        Ok(Self {
            title,
            artist,
            thumbnail_url,
            duration,
        })
    }
}

/// Collapses every run of non-word characters (anything but alphanumerics
/// and `_`) into one space, then title-cases the result.
pub fn normalize_title(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut in_gap = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            collapsed.push(ch);
            in_gap = false;
        } else if !in_gap {
            collapsed.push(' ');
            in_gap = true;
        }
    }
    title_case(&collapsed)
}

fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous_cased = false;
    for ch in input.chars() {
        let cased = ch.is_uppercase() || ch.is_lowercase();
        if cased {
            if previous_cased {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
        } else {
            output.push(ch);
        }
        previous_cased = cased;
    }
    output
}

#[derive(Clone)]
pub struct MetadataFetcher {
    lookup: Arc<dyn VideoLookup>,
    watch_base: String,
    default_image_url: String,
}

impl fmt::Debug for MetadataFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataFetcher")
            .field("lookup", &"dyn VideoLookup")
            .field("watch_base", &self.watch_base)
            .field("default_image_url", &self.default_image_url)
            .finish()
    }
}

impl MetadataFetcher {
    pub fn new(
        lookup: Arc<dyn VideoLookup>,
        watch_base: impl Into<String>,
        default_image_url: impl Into<String>,
    ) -> Self {
        Self {
            lookup,
            watch_base: watch_base.into(),
            default_image_url: default_image_url.into(),
        }
    }

    pub fn default_image_url(&self) -> &str {
        &self.default_image_url
    }

    pub fn watch_url(&self, id: &TrackId) -> String {
        format!("{}{}", self.watch_base, id)
    }

    /// Never fails: lookup errors are logged and replaced with placeholders.
    pub async fn fetch(&self, id: &TrackId) -> TrackMetadata {
        match self.try_fetch(id).await {
            Ok(metadata) => {
                debug!(track = %id, title = %metadata.title, "resolved track metadata");
                metadata
            }
            Err(LookupError::Unavailable) => {
                debug!(track = %id, "metadata lookup unavailable; using placeholders");
                TrackMetadata::fallback(&self.default_image_url)
            }
            Err(err @ (LookupError::InvalidEndpoint(_)
            | LookupError::Transport(_)
            | LookupError::Status(_)
            | LookupError::Malformed(_))) => {
                warn!(track = %id, error = %err, "metadata lookup failed; using placeholders");
                TrackMetadata::fallback(&self.default_image_url)
            }
        }
    }

    pub async fn try_fetch(&self, id: &TrackId) -> Result<TrackMetadata, LookupError> {
        let query = self.watch_url(id);
        let record = self
            .lookup
            .search(&query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::Malformed("empty result set".to_string()))?;
        TrackMetadata::from_record(record, &self.default_image_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{Channel, Thumbnail, UnavailableLookup};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const DEFAULT_IMAGE: &str = "https://cdn.example.net/default.png";

    struct RecordingLookup {
        response: Mutex<Option<Result<Vec<VideoRecord>, LookupError>>>,
        queries: Mutex<Vec<(String, usize)>>,
    }

    impl RecordingLookup {
        fn new(response: Result<Vec<VideoRecord>, LookupError>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl VideoLookup for RecordingLookup {
        async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoRecord>, LookupError> {
            self.queries.lock().unwrap().push((query.to_string(), limit));
            self.response
                .lock()
                .unwrap()
                .take()
                .expect("lookup queried more than once")
        }
    }

    fn fetcher(lookup: Arc<dyn VideoLookup>) -> MetadataFetcher {
        MetadataFetcher::new(lookup, "https://www.youtube.com/watch?v=", DEFAULT_IMAGE)
    }

    fn id() -> TrackId {
        TrackId::new("abc123").unwrap()
    }

    #[test]
    fn classifies_live_durations() {
        assert_eq!(classify_duration(None), DurationLabel::Live);
        assert_eq!(classify_duration(Some("")), DurationLabel::Live);
        assert_eq!(classify_duration(Some("live")), DurationLabel::Live);
        assert_eq!(classify_duration(Some("Live Now")), DurationLabel::Live);
        let timed = classify_duration(Some("3:45"));
        assert_eq!(timed, DurationLabel::Timed("3:45".into()));
        assert_eq!(timed.to_string(), "3:45");
    }

    #[test]
    fn normalizes_titles() {
        assert_eq!(
            normalize_title("never gonna give you up (official video)"),
            "Never Gonna Give You Up Official Video "
        );
        assert_eq!(normalize_title("AC/DC -- T.N.T."), "Ac Dc T N T ");
        assert_eq!(normalize_title("lo_fi beats"), "Lo_Fi Beats");
        assert_eq!(normalize_title("3am vibes"), "3Am Vibes");
    }

    #[tokio::test]
    async fn fetch_maps_first_result() {
        let lookup = RecordingLookup::new(Ok(vec![VideoRecord {
            title: Some("hello, world!!".into()),
            thumbnails: Some(vec![Thumbnail {
                url: Some("https://img.example.net/hq.jpg".into()),
            }]),
            channel: Some(Channel {
                name: Some("The Channel".into()),
            }),
            duration: Some("4:01".into()),
        }]));
        let metadata = fetcher(lookup.clone()).fetch(&id()).await;

        assert_eq!(metadata.title, "Hello World ");
        assert_eq!(metadata.artist, "The Channel");
        assert_eq!(metadata.thumbnail_url, "https://img.example.net/hq.jpg");
        assert_eq!(metadata.duration, DurationLabel::Timed("4:01".into()));
        assert_eq!(
            lookup.queries.lock().unwrap().as_slice(),
            &[("https://www.youtube.com/watch?v=abc123".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn missing_fields_use_field_defaults() {
        let lookup = RecordingLookup::new(Ok(vec![VideoRecord::default()]));
        let metadata = fetcher(lookup).fetch(&id()).await;
        assert_eq!(metadata.title, "Untitled");
        assert_eq!(metadata.artist, FALLBACK_ARTIST);
        assert_eq!(metadata.thumbnail_url, DEFAULT_IMAGE);
        assert!(metadata.duration.is_live());
    }

    #[tokio::test]
    async fn lookup_failure_yields_placeholders() {
        let lookup = RecordingLookup::new(Err(LookupError::Malformed("boom".into())));
        let metadata = fetcher(lookup).fetch(&id()).await;
        assert_eq!(
            metadata,
            TrackMetadata {
                title: "Unknown Title".into(),
                artist: "Unknown Artist".into(),
                thumbnail_url: DEFAULT_IMAGE.into(),
                duration: DurationLabel::Live,
            }
        );
    }

    #[tokio::test]
    async fn empty_results_and_empty_thumbnails_yield_placeholders() {
        let empty = fetcher(RecordingLookup::new(Ok(vec![]))).fetch(&id()).await;
        assert_eq!(empty, TrackMetadata::fallback(DEFAULT_IMAGE));

        let no_thumbs = fetcher(RecordingLookup::new(Ok(vec![VideoRecord {
            title: Some("Real Title".into()),
            thumbnails: Some(vec![]),
            ..VideoRecord::default()
        }])))
        .fetch(&id())
        .await;
        assert_eq!(no_thumbs, TrackMetadata::fallback(DEFAULT_IMAGE));
    }

    #[tokio::test]
    async fn unavailable_lookup_yields_placeholders() {
        let metadata = fetcher(Arc::new(UnavailableLookup)).fetch(&id()).await;
        assert_eq!(metadata, TrackMetadata::fallback(DEFAULT_IMAGE));
    }
}
