// Request-scoped data models shared by the extractor adapter and the relay

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the client wants to save: the video container or the audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Video,
    Audio,
}

impl OutputKind {
    /// Literal used as the download file stem (`video.mp4`, `audio.webm`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the `format` query literals: `mp4`/`video` and `mp3`/`audio`.
impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp4" | "video" => Ok(Self::Video),
            "mp3" | "audio" => Ok(Self::Audio),
            other => Err(format!("Unsupported format '{}'", other)),
        }
    }
}

/// One encoded representation of a resolved video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FormatVariant {
    /// Extractor-side identifier (e.g. "137", "251")
    pub format_id: String,
    /// Container / file extension (mp4, webm, m4a)
    pub container: String,
    pub has_audio: bool,
    pub has_video: bool,
    /// Total bitrate in kbps
    pub bitrate_hint: Option<f32>,
    /// Audio bitrate in kbps, when the extractor reports it separately
    pub audio_bitrate: Option<f32>,
    /// Direct media URL, if the variant is served over plain HTTP(S)
    pub url: Option<String>,
    /// Transfer protocol reported by the extractor (https, m3u8_native, http_dash_segments)
    pub protocol: Option<String>,
    /// Headers the media host expects on the direct request
    #[serde(default)]
    pub http_headers: BTreeMap<String, String>,
}

impl FormatVariant {
    /// Whether the variant can be fetched with one plain GET
    pub fn is_direct_http(&self) -> bool {
        let direct_protocol = self
            .protocol
            .as_deref()
            .map_or(true, |p| p == "https" || p == "http");

        direct_protocol
            && self
                .url
                .as_deref()
                .map_or(false, |u| u.starts_with("https://") || u.starts_with("http://"))
    }
}

/// Title and thumbnail shown to the user before downloading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub thumbnail_url: Option<String>,
}

/// Output of `resolve`: metadata plus the ordered variant list
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVideo {
    pub metadata: VideoMetadata,
    pub formats: Vec<FormatVariant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_format_literals() {
        assert_eq!("mp4".parse::<OutputKind>(), Ok(OutputKind::Video));
        assert_eq!("video".parse::<OutputKind>(), Ok(OutputKind::Video));
        assert_eq!("mp3".parse::<OutputKind>(), Ok(OutputKind::Audio));
        assert_eq!("audio".parse::<OutputKind>(), Ok(OutputKind::Audio));
        assert!("flac".parse::<OutputKind>().is_err());
        assert!("MP4".parse::<OutputKind>().is_err());
    }

    #[test]
    fn direct_http_requires_url_and_plain_protocol() {
        let mut variant = FormatVariant {
            url: Some("https://rr1.googlevideo.com/videoplayback?id=1".to_string()),
            protocol: Some("https".to_string()),
            ..Default::default()
        };
        assert!(variant.is_direct_http());

        variant.protocol = Some("m3u8_native".to_string());
        assert!(!variant.is_direct_http());

        variant.protocol = None;
        variant.url = None;
        assert!(!variant.is_direct_http());
    }
}
