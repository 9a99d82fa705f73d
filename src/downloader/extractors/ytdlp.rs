// yt-dlp extractor - native binary (CLI mode) or `python3 -m yt_dlp` (Python mode)
//
// resolve:     `--dump-json` under the configured timeout, parsed into variants
// open_stream: plain HTTP(S) variants are fetched directly with reqwest;
//              manifest-based variants (HLS/DASH) are piped through `yt-dlp -o -`

use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command as TokioCommand};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use super::traits::{ExtractorConfig, MediaExtractor};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{FormatVariant, ResolvedVideo, VideoMetadata};
use crate::downloader::stream::MediaStream;
use crate::downloader::tools::ToolLocator;
use crate::downloader::utils::{network_args, run_output_with_timeout};

/// How yt-dlp gets launched
#[derive(Debug, Clone, PartialEq, Eq)]
enum Launcher {
    Binary(String),
    Python(String),
}

impl Launcher {
    fn program(&self) -> &str {
        match self {
            Self::Binary(path) => path,
            Self::Python(interpreter) => interpreter,
        }
    }

    fn prefix_args(&self) -> Vec<String> {
        match self {
            Self::Binary(_) => Vec::new(),
            Self::Python(_) => vec!["-m".to_string(), "yt_dlp".to_string()],
        }
    }
}

pub struct YtDlpExtractor {
    launcher: Launcher,
    config: ExtractorConfig,
    http: reqwest::Client,
    available: OnceLock<bool>,
}

impl YtDlpExtractor {
    /// Native `yt-dlp` binary
    pub fn cli(config: ExtractorConfig) -> Self {
        let path = config
            .ytdlp_path
            .clone()
            .unwrap_or_else(ToolLocator::find_ytdlp);
        Self::with_launcher(Launcher::Binary(path), config)
    }

    /// `python3 -m yt_dlp`
    pub fn python(config: ExtractorConfig) -> Self {
        let interpreter = config
            .python_path
            .clone()
            .unwrap_or_else(ToolLocator::find_python);
        Self::with_launcher(Launcher::Python(interpreter), config)
    }

    fn with_launcher(launcher: Launcher, config: ExtractorConfig) -> Self {
        let http = Self::build_http_client(&config);
        Self {
            launcher,
            config,
            http,
            available: OnceLock::new(),
        }
    }

    // No overall request timeout: media bodies are long-lived.
    fn build_http_client(config: &ExtractorConfig) -> reqwest::Client {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(u64::from(config.timeout_seconds.max(1))))
            .tcp_nodelay(true);

        if let Some(proxy_url) = config.proxy.as_deref() {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(proxy = proxy_url, error = %e, "Ignoring invalid proxy URL"),
            }
        }

        builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
    }

    fn resolve_args(&self, url: &str) -> Vec<String> {
        let mut args = self.launcher.prefix_args();
        args.push("--dump-json".to_string());
        args.extend(network_args(&self.config));
        args.push(url.to_string());
        args
    }

    fn stream_args(&self, url: &str, format_id: &str) -> Vec<String> {
        let mut args = self.launcher.prefix_args();
        args.extend([
            "-f".to_string(),
            format_id.to_string(),
            "-o".to_string(),
            "-".to_string(),
            "--quiet".to_string(),
            "--no-part".to_string(),
        ]);
        args.extend(network_args(&self.config));
        args.push(url.to_string());
        args
    }

    /// Parse `--dump-json` output
    pub(crate) fn parse_json(stdout: &[u8]) -> Result<ResolvedVideo, DownloadError> {
        let json: serde_json::Value = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let formats = Self::parse_formats(&json)?;

        let thumbnail_url = json["thumbnail"]
            .as_str()
            .or_else(|| json["thumbnails"][0]["url"].as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ResolvedVideo {
            metadata: VideoMetadata {
                title: json["title"].as_str().unwrap_or("Unknown").to_string(),
                thumbnail_url,
            },
            formats,
        })
    }

    fn parse_formats(json: &serde_json::Value) -> Result<Vec<FormatVariant>, DownloadError> {
        let formats_array = json["formats"]
            .as_array()
            .ok_or_else(|| DownloadError::ParseError("No formats array in JSON".to_string()))?;

        let codec_present =
            |v: &serde_json::Value| v.as_str().map_or(false, |c| c != "none" && !c.is_empty());

        let formats = formats_array
            .iter()
            .map(|f| FormatVariant {
                format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                container: f["ext"].as_str().unwrap_or("").to_string(),
                has_audio: codec_present(&f["acodec"]),
                has_video: codec_present(&f["vcodec"]),
                bitrate_hint: f["tbr"].as_f64().map(|t| t as f32),
                audio_bitrate: f["abr"].as_f64().map(|a| a as f32),
                url: f["url"].as_str().map(str::to_string),
                protocol: f["protocol"].as_str().map(str::to_string),
                http_headers: f["http_headers"]
                    .as_object()
                    .map(|headers| {
                        headers
                            .iter()
                            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        Ok(formats)
    }

    async fn open_direct(&self, format: &FormatVariant) -> Result<MediaStream, DownloadError> {
        let url = format
            .url
            .as_deref()
            .ok_or_else(|| DownloadError::StreamOpen("variant has no direct URL".to_string()))?;

        let mut request = self.http.get(url);
        for (name, value) in &format.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::StreamOpen(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::StreamOpen(format!(
                "media host answered {}",
                status
            )));
        }

        debug!(
            format_id = %format.format_id,
            content_length = ?response.content_length(),
            "Direct media stream opened"
        );

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| DownloadError::StreamInterrupted(e.to_string())));
        Ok(MediaStream::new(chunks))
    }

    async fn open_pipe(
        &self,
        url: &str,
        format: &FormatVariant,
    ) -> Result<MediaStream, DownloadError> {
        let program = self.launcher.program().to_string();
        let args = self.stream_args(url, &format.format_id);
        debug!(program = %program, args = %args.join(" "), "Spawning yt-dlp pipe");

        let mut child = TokioCommand::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::StreamOpen(format!("Failed to start {}: {}", program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::StreamOpen(format!("No stdout from {}", program)))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr, format.format_id.clone()));
        }

        let mut reader = ReaderStream::new(stdout);

        // The first chunk decides whether the transport was established.
        match reader.next().await {
            Some(Ok(first)) => Ok(MediaStream::prepend(first, pipe_stream(reader, child))),
            Some(Err(e)) => Err(DownloadError::StreamOpen(e.to_string())),
            None => {
                let status = child
                    .wait()
                    .await
                    .map(|s| s.to_string())
                    .unwrap_or_else(|e| e.to_string());
                Err(DownloadError::StreamOpen(format!(
                    "yt-dlp produced no data ({})",
                    status
                )))
            }
        }
    }
}

/// Remaining stdout chunks; the exit status decides whether the end was clean
fn pipe_stream(
    reader: ReaderStream<tokio::process::ChildStdout>,
    child: Child,
) -> MediaStream {
    let chunks = stream::unfold(Some((reader, child)), |state| async move {
        let (mut reader, mut child) = state?;
        match reader.next().await {
            Some(Ok(bytes)) => Some((Ok(bytes), Some((reader, child)))),
            Some(Err(e)) => Some((Err(DownloadError::StreamInterrupted(e.to_string())), None)),
            None => match child.wait().await {
                Ok(status) if status.success() => None,
                Ok(status) => Some((
                    Err(DownloadError::StreamInterrupted(format!(
                        "yt-dlp exited with {}",
                        status
                    ))),
                    None,
                )),
                Err(e) => Some((Err(DownloadError::StreamInterrupted(e.to_string())), None)),
            },
        }
    });
    MediaStream::new(chunks)
}

async fn log_stderr(stderr: ChildStderr, format_id: String) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(format_id = %format_id, "yt-dlp: {}", line);
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        match self.launcher {
            Launcher::Binary(_) => "cli-yt-dlp",
            Launcher::Python(_) => "python-yt-dlp",
        }
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| match &self.launcher {
            Launcher::Binary(path) => ToolLocator::binary_runs(path),
            Launcher::Python(interpreter) => ToolLocator::python_has_ytdlp(interpreter),
        })
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, DownloadError> {
        if !self.is_available() {
            return Err(DownloadError::ToolNotFound(format!(
                "{} is not installed",
                self.name()
            )));
        }

        let args = self.resolve_args(url);
        info!(extractor = self.name(), url, "Resolving video");

        let output = run_output_with_timeout(
            self.launcher.program(),
            args,
            u64::from(self.config.timeout_seconds),
        )
        .await
        .map_err(DownloadError::from)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::from(stderr.trim().to_string()));
        }

        Self::parse_json(&output.stdout)
    }

    async fn open_stream(
        &self,
        url: &str,
        format: &FormatVariant,
    ) -> Result<MediaStream, DownloadError> {
        if format.is_direct_http() {
            self.open_direct(format).await
        } else {
            self.open_pipe(url, format).await
        }
    }
}
