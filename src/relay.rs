// Stream relay - turns one download request into one streamed HTTP response
//
// Before the media stream is open every failure becomes a JSON error. Once it
// is open the headers are committed: a later upstream failure can only abort
// the connection, so the client sees a truncated transfer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use tokio::time::{timeout, Instant, Sleep};
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::RelayConfig;
use crate::downloader::extractors::diagnose_error;
use crate::downloader::utils::is_supported_url;
use crate::downloader::{
    DownloadError, FormatSelector, FormatVariant, MediaExtractor, MediaStream, OutputKind,
    ResolvedVideo,
};

/// Where the download file extension comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNaming {
    /// The selected variant's container (`audio.webm`)
    Container,
    /// The configured extension for the kind (`audio.mp3`)
    Mapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub source_url: String,
    pub output_kind: OutputKind,
    pub file_naming: FileNaming,
}

impl DownloadRequest {
    /// Request with a fixed kind (`/download/audio`, `/download/video`)
    pub fn for_kind(
        url: Option<&str>,
        output_kind: OutputKind,
        file_naming: FileNaming,
    ) -> ApiResult<Self> {
        let source_url = required_url(url)?;
        Self::checked(source_url, output_kind, file_naming)
    }

    /// Request whose kind comes from the `format` query literal; absent means video
    pub fn from_query(
        url: Option<&str>,
        format: Option<&str>,
        file_naming: FileNaming,
    ) -> ApiResult<Self> {
        let source_url = required_url(url)?;
        let output_kind = match format.map(str::trim).filter(|f| !f.is_empty()) {
            None => OutputKind::default(),
            Some(literal) => literal.parse().map_err(ApiError::bad_request)?,
        };
        Self::checked(source_url, output_kind, file_naming)
    }

    fn checked(
        source_url: &str,
        output_kind: OutputKind,
        file_naming: FileNaming,
    ) -> ApiResult<Self> {
        if !is_supported_url(source_url) {
            return Err(ApiError::invalid_url("Invalid YouTube URL."));
        }
        Ok(Self {
            source_url: source_url.to_string(),
            output_kind,
            file_naming,
        })
    }
}

fn required_url(url: Option<&str>) -> ApiResult<&str> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))
}

/// Body of `/video-details`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoDetails {
    pub title: String,
    pub thumbnail: String,
}

pub struct StreamRelay {
    extractor: Arc<dyn MediaExtractor>,
    config: RelayConfig,
}

impl StreamRelay {
    pub fn new(extractor: Arc<dyn MediaExtractor>, config: RelayConfig) -> Self {
        Self { extractor, config }
    }

    pub async fn handle_download(&self, request: DownloadRequest) -> ApiResult<Response> {
        let kind = request.output_kind;
        let url = request.source_url.as_str();
        info!(url, kind = %kind, "Download requested");

        let resolved = self
            .resolve(url)
            .await
            .map_err(|e| download_failure(kind, e))?;

        let format = FormatSelector::select(&resolved.formats, kind)
            .map_err(|e| download_failure(kind, e))?;
        debug!(
            format_id = %format.format_id,
            container = %format.container,
            bitrate = ?format.bitrate_hint,
            "Selected format"
        );

        let stream = match timeout(
            self.config.open_timeout,
            self.extractor.open_stream(url, &format),
        )
        .await
        {
            Ok(opened) => opened,
            Err(_) => Err(DownloadError::StreamOpen(format!(
                "no stream after {:?}",
                self.config.open_timeout
            ))),
        }
        .map_err(|e| download_failure(kind, e))?;

        // Headers are committed from here on.
        let filename = format!("{}.{}", kind.as_str(), self.extension(&request, &format));
        let body = RelayStream::new(stream, self.config.idle_timeout, url, kind);

        info!(url, kind = %kind, filename = %filename, "Streaming download");

        Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            )
            .header(header::CONTENT_TYPE, self.config.content_types.get(kind))
            .body(Body::from_stream(body))
            .map_err(|e| {
                ApiError::upstream(format!("Failed to download {}", kind))
                    .with_details(e.to_string())
            })
    }

    pub async fn handle_details(&self, url: Option<&str>) -> ApiResult<VideoDetails> {
        let url = required_url(url)?;
        if !is_supported_url(url) {
            return Err(ApiError::invalid_url("Invalid YouTube URL."));
        }

        match self.resolve(url).await {
            Ok(resolved) => Ok(VideoDetails {
                title: resolved.metadata.title,
                thumbnail: resolved.metadata.thumbnail_url.unwrap_or_default(),
            }),
            Err(e) => {
                log_failure("Video details lookup failed", &e);
                if e.is_client_error() {
                    Err(ApiError::invalid_url("Invalid YouTube URL.").with_details(e.to_string()))
                } else {
                    Err(ApiError::upstream("Failed to fetch video details.")
                        .with_details(e.to_string()))
                }
            }
        }
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, DownloadError> {
        match timeout(self.config.resolve_timeout, self.extractor.resolve(url)).await {
            Ok(resolved) => resolved,
            Err(_) => Err(DownloadError::NetworkTimeout(format!(
                "no metadata after {:?}",
                self.config.resolve_timeout
            ))),
        }
    }

    fn extension<'a>(&'a self, request: &DownloadRequest, format: &'a FormatVariant) -> &'a str {
        let mapped = self.config.mapped_extensions.get(request.output_kind);
        match request.file_naming {
            FileNaming::Mapped => mapped,
            FileNaming::Container => {
                let container = format.container.as_str();
                if !container.is_empty() && container.chars().all(|c| c.is_ascii_alphanumeric()) {
                    container
                } else {
                    mapped
                }
            }
        }
    }
}

fn download_failure(kind: OutputKind, err: DownloadError) -> ApiError {
    log_failure("Download failed before streaming", &err);
    if err.is_client_error() {
        ApiError::invalid_url("Invalid YouTube URL.").with_details(err.to_string())
    } else {
        ApiError::upstream(format!("Failed to download {}", kind)).with_details(err.to_string())
    }
}

fn log_failure(what: &str, err: &DownloadError) {
    let reason = diagnose_error(&err.to_string());
    warn!(
        error = %err,
        upstream = err.is_upstream(),
        reason = reason.map(|r| r.description()),
        "{}",
        what
    );
}

/// Response body: forwards chunks in order, pulled one at a time by hyper.
///
/// Stops after the first error, which hyper turns into an aborted connection.
/// Dropping it early (client went away) drops the upstream `MediaStream`.
///
/// The idle deadline only measures upstream silence: it is re-armed when the
/// consumer comes back for the next chunk, so time spent in backpressure
/// never counts against it.
struct RelayStream {
    inner: MediaStream,
    idle_timeout: Option<Duration>,
    idle: Option<Pin<Box<Sleep>>>,
    rearm: bool,
    bytes: u64,
    chunks: u64,
    finished: bool,
    url: String,
    kind: OutputKind,
}

impl RelayStream {
    fn new(
        inner: MediaStream,
        idle_timeout: Option<Duration>,
        url: &str,
        kind: OutputKind,
    ) -> Self {
        Self {
            inner,
            idle_timeout,
            idle: idle_timeout.map(|d| Box::pin(tokio::time::sleep(d))),
            rearm: true,
            bytes: 0,
            chunks: 0,
            finished: false,
            url: url.to_string(),
            kind,
        }
    }

    fn abort(&mut self, err: DownloadError) -> std::io::Error {
        self.finished = true;
        warn!(
            url = %self.url,
            kind = %self.kind,
            bytes = self.bytes,
            chunks = self.chunks,
            error = %err,
            "Stream interrupted, aborting connection"
        );
        std::io::Error::other(err)
    }
}

impl Stream for RelayStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        if this.rearm {
            this.rearm = false;
            if let (Some(idle), Some(d)) = (this.idle.as_mut(), this.idle_timeout) {
                idle.as_mut().reset(Instant::now() + d);
            }
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes += chunk.len() as u64;
                this.chunks += 1;
                this.rearm = true;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(this.abort(e)))),
            Poll::Ready(None) => {
                this.finished = true;
                info!(
                    url = %this.url,
                    kind = %this.kind,
                    bytes = this.bytes,
                    chunks = this.chunks,
                    "Download completed"
                );
                Poll::Ready(None)
            }
            Poll::Pending => {
                let idle_expired = this
                    .idle
                    .as_mut()
                    .map_or(false, |idle| idle.as_mut().poll(cx).is_ready());
                if idle_expired {
                    let err = DownloadError::StreamInterrupted(format!(
                        "no data for {:?}",
                        this.idle_timeout.unwrap_or_default()
                    ));
                    return Poll::Ready(Some(Err(this.abort(err))));
                }
                Poll::Pending
            }
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if !self.finished {
            info!(
                url = %self.url,
                kind = %self.kind,
                bytes = self.bytes,
                chunks = self.chunks,
                "Client disconnected, releasing upstream stream"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::stream::ChunkResult;

    #[test]
    fn missing_or_blank_url_is_rejected() {
        for url in [None, Some(""), Some("   ")] {
            let err = DownloadRequest::from_query(url, None, FileNaming::Mapped).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.message, "URL is required");
        }
    }

    #[test]
    fn format_literals_map_to_kinds() {
        let url = Some("https://youtu.be/dQw4w9WgXcQ");
        let cases = [
            (None, OutputKind::Video),
            (Some(""), OutputKind::Video),
            (Some("mp4"), OutputKind::Video),
            (Some("video"), OutputKind::Video),
            (Some("mp3"), OutputKind::Audio),
            (Some("audio"), OutputKind::Audio),
        ];
        for (format, expected) in cases {
            let request = DownloadRequest::from_query(url, format, FileNaming::Mapped).unwrap();
            assert_eq!(request.output_kind, expected, "{format:?}");
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = DownloadRequest::from_query(
            Some("https://youtu.be/dQw4w9WgXcQ"),
            Some("flac"),
            FileNaming::Mapped,
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn non_youtube_url_is_rejected() {
        let err = DownloadRequest::for_kind(
            Some("https://vimeo.com/123"),
            OutputKind::Audio,
            FileNaming::Container,
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_URL");
    }

    #[tokio::test]
    async fn idle_timeout_aborts_silent_stream() {
        let silent = MediaStream::new(futures::stream::pending::<ChunkResult>());
        let mut body = RelayStream::new(
            silent,
            Some(Duration::from_millis(20)),
            "https://youtu.be/dQw4w9WgXcQ",
            OutputKind::Video,
        );

        let item = body.next().await.unwrap();
        assert!(item.is_err());
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn slow_consumer_does_not_trip_idle_timeout() {
        let upstream = futures::stream::once(async { Ok(Bytes::from_static(b"a")) }).chain(
            futures::stream::once(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Bytes::from_static(b"b"))
            }),
        );
        let mut body = RelayStream::new(
            MediaStream::new(upstream),
            Some(Duration::from_millis(40)),
            "https://youtu.be/dQw4w9WgXcQ",
            OutputKind::Audio,
        );

        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"a"));
        // Consumer stalls longer than the idle timeout
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"b"));
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_body_releases_upstream() {
        struct ReleaseFlag(Arc<std::sync::atomic::AtomicBool>);

        impl Drop for ReleaseFlag {
            fn drop(&mut self) {
                self.0.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let released = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = ReleaseFlag(released.clone());
        let upstream = futures::stream::iter(vec![Ok(Bytes::from_static(b"first"))])
            .chain(futures::stream::pending())
            .map(move |chunk: ChunkResult| {
                let _held = &flag;
                chunk
            });
        let mut body = RelayStream::new(
            MediaStream::new(upstream),
            None,
            "https://youtu.be/dQw4w9WgXcQ",
            OutputKind::Video,
        );

        assert!(body.next().await.unwrap().is_ok());
        assert!(!released.load(std::sync::atomic::Ordering::SeqCst));

        drop(body);
        assert!(released.load(std::sync::atomic::Ordering::SeqCst));
    }
}
