// ExtractorOrchestrator - mode selection and fallback across extractors
//
// Strategy:
// 1. Explicit mode: only that extractor
// 2. Auto: Python first for YouTube (better anti-bot bypass), CLI otherwise
// 3. resolve falls back to the next available extractor unless the video itself is gone
// 4. open_stream never falls back

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::diagnostics::diagnose_error;
use super::traits::{ExtractorConfig, ExtractorMode, MediaExtractor};
use super::ytdlp::YtDlpExtractor;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{FormatVariant, ResolvedVideo};
use crate::downloader::stream::MediaStream;

/// Availability snapshot for startup logs
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub extractors: Vec<(&'static str, bool)>,
    pub mode: ExtractorMode,
}

pub struct ExtractorOrchestrator {
    extractors: Vec<Box<dyn MediaExtractor>>,
    mode: ExtractorMode,
}

impl ExtractorOrchestrator {
    pub fn new(mode: ExtractorMode) -> Self {
        Self {
            extractors: Vec::new(),
            mode,
        }
    }

    /// Python and CLI yt-dlp extractors ordered for the configured mode
    pub fn from_config(config: ExtractorConfig) -> Self {
        let mut orchestrator = Self::new(config.mode);
        match config.mode {
            ExtractorMode::Python => {
                orchestrator.add_extractor(Box::new(YtDlpExtractor::python(config)));
            }
            ExtractorMode::Cli => {
                orchestrator.add_extractor(Box::new(YtDlpExtractor::cli(config)));
            }
            ExtractorMode::Auto => {
                orchestrator.add_extractor(Box::new(YtDlpExtractor::python(config.clone())));
                orchestrator.add_extractor(Box::new(YtDlpExtractor::cli(config)));
            }
        }
        orchestrator
    }

    /// Extractors are tried in insertion order
    pub fn add_extractor(&mut self, extractor: Box<dyn MediaExtractor>) {
        self.extractors.push(extractor);
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            extractors: self
                .extractors
                .iter()
                .map(|e| (e.name(), e.is_available()))
                .collect(),
            mode: self.mode,
        }
    }

    fn available(&self) -> impl Iterator<Item = &dyn MediaExtractor> + '_ {
        self.extractors
            .iter()
            .map(|e| e.as_ref())
            .filter(|e| e.is_available())
    }
}

#[async_trait]
impl MediaExtractor for ExtractorOrchestrator {
    fn name(&self) -> &'static str {
        "orchestrator"
    }

    fn is_available(&self) -> bool {
        self.available().next().is_some()
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, DownloadError> {
        let mut last_error = None;

        for extractor in self.available() {
            debug!(extractor = extractor.name(), "Trying extractor");

            match extractor.resolve(url).await {
                Ok(resolved) => {
                    info!(
                        extractor = extractor.name(),
                        formats = resolved.formats.len(),
                        "Resolved video"
                    );
                    return Ok(resolved);
                }
                // Another extractor will not make a bad URL valid
                Err(e) if e.is_client_error() => return Err(e),
                Err(e) => {
                    let reason = diagnose_error(&e.to_string());
                    warn!(
                        extractor = extractor.name(),
                        error = %e,
                        reason = reason.map(|r| r.description()),
                        retryable = reason.map_or(false, |r| r.is_retryable()),
                        "Extractor failed"
                    );
                    if reason.map_or(false, |r| r.is_permanent()) {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DownloadError::ToolNotFound(
                "Neither Python yt_dlp nor the yt-dlp binary is available".to_string(),
            )
        }))
    }

    async fn open_stream(
        &self,
        url: &str,
        format: &FormatVariant,
    ) -> Result<MediaStream, DownloadError> {
        let extractor = self.available().next().ok_or_else(|| {
            DownloadError::StreamOpen("no extractor available to open the stream".to_string())
        })?;

        debug!(
            extractor = extractor.name(),
            format_id = %format.format_id,
            "Opening stream"
        );
        extractor.open_stream(url, format).await
    }
}
