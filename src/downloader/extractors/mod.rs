// Extractor adapter - resolves videos and opens media streams through yt-dlp
//
// Two launch flavours share one implementation:
// - Python mode: `python3 -m yt_dlp` (better for YouTube, avoids bot detection)
// - CLI mode: native `yt-dlp` binary (faster, no Python dependency)
//
// The orchestrator picks between them based on the configured mode and
// falls back on failure.

mod diagnostics;
mod orchestrator;
mod traits;
mod ytdlp;

pub use diagnostics::{diagnose_error, BlockingReason};
pub use orchestrator::{ExtractorOrchestrator, OrchestratorStatus};
pub use traits::{ExtractorConfig, ExtractorMode, MediaExtractor};
pub use ytdlp::YtDlpExtractor;
