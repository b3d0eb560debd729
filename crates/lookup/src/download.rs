use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::remote::HttpFetch;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("thumbnail request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("thumbnail request returned status {0}")]
    Status(u16),
    #[error("failed to write thumbnail to disk: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches cover art into a local file. Anything but a 200 response is
/// reported as a failure and nothing is written.
#[derive(Clone)]
pub struct ThumbnailDownloader {
    http: Arc<dyn HttpFetch>,
}

impl std::fmt::Debug for ThumbnailDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailDownloader")
            .field("http", &"dyn HttpFetch")
            .finish()
    }
}

impl ThumbnailDownloader {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self { http }
    }

    pub async fn download(&self, url: &str, destination: &Path) -> Result<(), DownloadError> {
        debug!(%url, path = %destination.display(), "downloading thumbnail");
        let response = self.http.get(url).await?;
        if response.status != 200 {
            return Err(DownloadError::Status(response.status));
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &response.body).await?;
        debug!(bytes = response.body.len(), "thumbnail stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::FetchResponse;
    use async_trait::async_trait;

    struct StaticFetch {
        status: u16,
        body: &'static [u8],
    }

    #[async_trait]
    impl HttpFetch for StaticFetch {
        async fn get(&self, _url: &str) -> Result<FetchResponse, DownloadError> {
            Ok(FetchResponse {
                status: self.status,
                body: self.body.to_vec(),
            })
        }
    }

    struct BrokenFetch;

    #[async_trait]
    impl HttpFetch for BrokenFetch {
        async fn get(&self, _url: &str) -> Result<FetchResponse, DownloadError> {
            Err(DownloadError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )))
        }
    }

    #[tokio::test]
    async fn writes_body_on_success() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("nested/thumb.png");
        let downloader = ThumbnailDownloader::new(Arc::new(StaticFetch {
            status: 200,
            body: b"cover-bytes",
        }));
        downloader
            .download("https://img.example.net/a.jpg", &dest)
            .await
            .expect("download succeeds");
        assert_eq!(std::fs::read(&dest).unwrap(), b"cover-bytes");
    }

    #[tokio::test]
    async fn non_ok_status_is_a_failure() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("thumb.png");
        let downloader = ThumbnailDownloader::new(Arc::new(StaticFetch {
            status: 404,
            body: b"not found",
        }));
        let err = downloader
            .download("https://img.example.net/missing.jpg", &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Status(404)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let temp = tempfile::tempdir().unwrap();
        let downloader = ThumbnailDownloader::new(Arc::new(BrokenFetch));
        let err = downloader
            .download("https://img.example.net/a.jpg", &temp.path().join("t.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Io(_)));
    }
}
