// Helper functions shared by the extractor implementations

use std::process::{Output, Stdio};

use regex::Regex;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use crate::downloader::extractors::ExtractorConfig;

lazy_static::lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
}

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Extract the 11-character video id from a YouTube URL, if it is one
pub fn extract_video_id(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    let candidate = if host == "youtu.be" {
        segments.next().map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("shorts" | "embed" | "live" | "v") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| VIDEO_ID_RE.is_match(id))
}

/// Whether the URL points at a single YouTube video
pub fn is_supported_url(raw: &str) -> bool {
    extract_video_id(raw).is_some()
}

/// Run a command to completion, collecting stdout/stderr.
///
/// The child is killed if the deadline passes first.
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<Output, String> {
    let child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Failed to start {}: {}", program, e))?;

    match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(output) => output.map_err(|e| format!("{} did not finish cleanly: {}", program, e)),
        Err(_) => Err(format!("Timed out after {}s", timeout_secs)),
    }
}

/// Network/auth arguments every yt-dlp invocation carries
pub fn network_args(config: &ExtractorConfig) -> Vec<String> {
    let mut args = vec![
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--socket-timeout".to_string(),
        config.timeout_seconds.to_string(),
        "--retries".to_string(),
        "2".to_string(),
    ];

    if let Some(client) = &config.player_client {
        args.push("--extractor-args".to_string());
        args.push(format!("youtube:player_client={}", client));
    }

    if let Some(path) = &config.cookies_path {
        args.push("--cookies".to_string());
        args.push(path.clone());
    } else if config.cookies_from_browser {
        args.push("--cookies-from-browser".to_string());
        args.push("chrome".to_string());
    }

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    args
}
