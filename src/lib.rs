// YouTube relay - paste a URL, preview it, download the audio or video track

pub mod api;
pub mod config;
pub mod downloader;
pub mod logging;
pub mod relay;

pub use config::AppConfig;
pub use relay::{DownloadRequest, FileNaming, StreamRelay};
