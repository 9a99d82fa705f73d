// Blocking diagnostics - identifies why YouTube refused an extraction
//
// Only feeds operator logs; the client-facing error contract never depends on it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    Http403Forbidden,
    /// Formats hidden behind SABR streaming for the chosen player client
    SabrStreaming,
    PoTokenRequired,
    AgeRestricted,
    GeoBlocked,
    /// Often a soft IP block rather than a real network fault
    NetworkTimeout,
    RateLimited,
    BotDetection,
    PrivateVideo,
    VideoUnavailable,
    /// Premium, Music and Movies content
    DrmProtected,
    MembersOnly,
    Unknown,
}

impl BlockingReason {
    /// Worth another attempt with a different extractor, client or proxy
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden
                | Self::SabrStreaming
                | Self::PoTokenRequired
                | Self::NetworkTimeout
                | Self::RateLimited
                | Self::BotDetection
        )
    }

    /// No extractor setting will change the outcome
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::DrmProtected | Self::VideoUnavailable)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "forbidden by media host (403)",
            Self::SabrStreaming => "SABR streaming, formats withheld",
            Self::PoTokenRequired => "PO token required",
            Self::AgeRestricted => "age-restricted",
            Self::GeoBlocked => "geo-blocked",
            Self::NetworkTimeout => "timed out, possibly throttled",
            Self::RateLimited => "rate limited",
            Self::BotDetection => "bot check triggered",
            Self::PrivateVideo => "private video",
            Self::VideoUnavailable => "video removed or unavailable",
            Self::DrmProtected => "DRM-protected",
            Self::MembersOnly => "members-only",
            Self::Unknown => "unclassified",
        }
    }
}

/// Classify an extractor error message; `None` for an empty message
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    const RULES: &[(BlockingReason, &[&str])] = &[
        (
            BlockingReason::DrmProtected,
            &[
                "drm",
                "widevine",
                "playready",
                "fairplay",
                "youtube premium",
                "requires purchase",
                "rental",
                "pay to watch",
            ],
        ),
        (
            BlockingReason::MembersOnly,
            &["members only", "members-only", "join this channel", "available to members"],
        ),
        (BlockingReason::SabrStreaming, &["sabr"]),
        (
            BlockingReason::PoTokenRequired,
            &["po token", "proof of origin"],
        ),
        (
            BlockingReason::AgeRestricted,
            &["age-restricted", "sign in to confirm your age", "age_verification"],
        ),
        (
            BlockingReason::PrivateVideo,
            &["private video", "video is private", "sign in if you've been granted access"],
        ),
        (
            BlockingReason::VideoUnavailable,
            &[
                "video unavailable",
                "video has been removed",
                "no longer available",
                "video is unavailable",
            ],
        ),
        (
            BlockingReason::GeoBlocked,
            &["not available in your country", "blocked in your country", "geo restrict"],
        ),
        (
            BlockingReason::RateLimited,
            &["429", "rate limit", "too many requests"],
        ),
        (
            BlockingReason::BotDetection,
            &["not a bot", "captcha", "unusual traffic", "automated"],
        ),
        (BlockingReason::Http403Forbidden, &["403", "forbidden"]),
        (
            BlockingReason::NetworkTimeout,
            &["timeout", "timed out", "connection refused", "network unreachable"],
        ),
    ];

    // first match wins
    for (reason, patterns) in RULES {
        if patterns.iter().any(|p| lower.contains(p)) {
            return Some(*reason);
        }
    }

    if error.trim().is_empty() {
        None
    } else {
        Some(BlockingReason::Unknown)
    }
}
