// Error taxonomy for the extractor adapter and the stream relay

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DownloadError {
    /// URL is not a supported/valid video reference (resolution error)
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Metadata service unreachable or answered with something unusable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Network timeout while talking to YouTube
    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    /// YouTube blocked the request (429, bot detection, etc.)
    #[error("YouTube is throttling or blocking requests: {0}")]
    BlockedByYouTube(String),

    /// yt-dlp or python not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No format variant satisfies the requested output kind
    #[error("No matching format: {0}")]
    NoMatchingFormat(String),

    /// The media transport could not be established
    #[error("Failed to open stream: {0}")]
    StreamOpen(String),

    /// The media stream failed after bytes were already delivered
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl DownloadError {
    /// Whether the failure is attributable to the caller's input rather than the upstream side.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidUrl(_))
    }

    /// Whether this belongs to the "resolve failed because the upstream side failed" family.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream(_)
                | Self::NetworkTimeout(_)
                | Self::BlockedByYouTube(_)
                | Self::ToolNotFound(_)
                | Self::ParseError(_)
        )
    }
}

// Classify raw yt-dlp stderr into the taxonomy
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("unsupported url")
            || lower.contains("is not a valid url")
            || lower.contains("incomplete youtube id")
            || lower.contains("invalid url")
        {
            return Self::InvalidUrl(s);
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout(s);
        }

        if lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("confirm you're not a bot")
            || lower.contains("blocked")
        {
            return Self::BlockedByYouTube(s);
        }

        if lower.contains("no such file") || lower.contains("command not found") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid json") || lower.contains("jsondecodeerror") {
            return Self::ParseError(s);
        }

        Self::Upstream(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unsupported_url_as_invalid() {
        let err = DownloadError::from("ERROR: Unsupported URL: https://example.com".to_string());
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn classifies_rate_limit_as_blocked() {
        let err = DownloadError::from("HTTP Error 429: Too Many Requests".to_string());
        assert!(matches!(err, DownloadError::BlockedByYouTube(_)));
        assert!(err.is_upstream());
    }

    #[test]
    fn classifies_timeouts() {
        let err = DownloadError::from("Timed out after 30s".to_string());
        assert!(matches!(err, DownloadError::NetworkTimeout(_)));
    }

    #[test]
    fn unknown_stderr_is_upstream() {
        let err = DownloadError::from("ERROR: something odd happened".to_string());
        assert_eq!(
            err,
            DownloadError::Upstream("ERROR: something odd happened".to_string())
        );
        assert!(!err.is_client_error());
    }
}
