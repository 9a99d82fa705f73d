// Downloader module - extractor adapter, format selection and media streams

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod stream;
pub mod tools;
pub mod utils;

pub use errors::DownloadError;
pub use extractors::{ExtractorConfig, ExtractorMode, ExtractorOrchestrator, MediaExtractor};
pub use format_selector::FormatSelector;
pub use models::{FormatVariant, OutputKind, ResolvedVideo, VideoMetadata};
pub use stream::MediaStream;
