// Application configuration
//
// Loaded from a JSON file (explicit path or `<config dir>/youtube-relay/config.json`),
// every field optional; CLI flags are applied on top in main.rs.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::downloader::{ExtractorConfig, OutputKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub extractor: ExtractorConfig,
}

impl AppConfig {
    /// `<user config dir>/youtube-relay/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("youtube-relay").join("config.json"))
    }

    /// Load from `path`, or from the default location if it exists, or defaults.
    ///
    /// An explicit path must exist; a malformed file is always an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 3000)),
        }
    }
}

/// One value per output kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindMap {
    pub video: String,
    pub audio: String,
}

impl KindMap {
    pub fn get(&self, kind: OutputKind) -> &str {
        match kind {
            OutputKind::Video => &self.video,
            OutputKind::Audio => &self.audio,
        }
    }
}

/// Relay behaviour, passed to the relay at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Content-Type per kind; independent of the selected container
    pub content_types: KindMap,
    /// File extension per kind for endpoints that name files by kind
    pub mapped_extensions: KindMap,
    /// Upper bound on resolving metadata, in seconds
    #[serde(with = "secs")]
    pub resolve_timeout: Duration,
    /// Upper bound on opening the media transport, in seconds
    #[serde(with = "secs")]
    pub open_timeout: Duration,
    /// Longest silence between two chunks before the transfer is aborted
    #[serde(with = "opt_secs")]
    pub idle_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            content_types: KindMap {
                video: "video/mp4".to_string(),
                audio: "audio/mpeg".to_string(),
            },
            mapped_extensions: KindMap {
                video: "mp4".to_string(),
                audio: "mp3".to_string(),
            },
            resolve_timeout: Duration::from_secs(30),
            open_timeout: Duration::from_secs(15),
            idle_timeout: Some(Duration::from_secs(60)),
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(d)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .transpose()
    }
}
