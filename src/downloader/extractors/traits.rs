// MediaExtractor trait and extractor configuration

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{FormatVariant, ResolvedVideo};
use crate::downloader::stream::MediaStream;

/// Extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorMode {
    /// Python module yt_dlp (better for YouTube, avoids bot detection)
    Python,
    /// CLI binary yt-dlp (faster, no Python dependency)
    Cli,
    /// Auto-select: Python -> CLI fallback
    #[default]
    Auto,
}

impl fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Cli => write!(f, "cli"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for ExtractorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" => Ok(Self::Python),
            "cli" => Ok(Self::Cli),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown extractor mode '{}'", other)),
        }
    }
}

/// Configuration for the yt-dlp based extractors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Extraction mode (Python, CLI, or Auto)
    pub mode: ExtractorMode,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// Use cookies from browser (Chrome)
    pub cookies_from_browser: bool,
    /// Socket/process timeout in seconds
    pub timeout_seconds: u32,
    /// YouTube player client (android, web, tv)
    pub player_client: Option<String>,
    /// Explicit yt-dlp binary, skips discovery
    pub ytdlp_path: Option<String>,
    /// Explicit Python interpreter, skips discovery
    pub python_path: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Auto,
            proxy: None,
            cookies_path: None,
            cookies_from_browser: false,
            timeout_seconds: 30,
            player_client: None,
            ytdlp_path: None,
            python_path: None,
        }
    }
}

impl ExtractorConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_cookies_from_browser(mut self, enabled: bool) -> Self {
        self.cookies_from_browser = enabled;
        self
    }

    pub fn with_mode(mut self, mode: ExtractorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_player_client(mut self, client: Option<String>) -> Self {
        self.player_client = client;
        self
    }
}

/// The "resolve -> variants -> open a byte stream" capability the relay consumes.
///
/// Format selection is not part of the trait: it is the pure
/// [`FormatSelector::select`](crate::downloader::FormatSelector::select).
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor can run on this machine
    fn is_available(&self) -> bool;

    /// Fetch metadata and the ordered list of format variants.
    ///
    /// Fails with `InvalidUrl` for URLs that are not a valid video reference and
    /// with one of the upstream variants when the metadata service fails.
    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, DownloadError>;

    /// Open the byte stream for one variant of `url`.
    ///
    /// Fails with `StreamOpen` when the transport cannot be established. Items
    /// of the returned stream may later fail with `StreamInterrupted`.
    async fn open_stream(
        &self,
        url: &str,
        format: &FormatVariant,
    ) -> Result<MediaStream, DownloadError>;
}
