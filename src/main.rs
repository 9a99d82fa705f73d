// youtube-relay - HTTP server entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn, Level};

use youtube_relay::api::run_server;
use youtube_relay::config::AppConfig;
use youtube_relay::downloader::tools::{ToolLocator, ToolType};
use youtube_relay::downloader::{ExtractorMode, ExtractorOrchestrator, MediaExtractor};
use youtube_relay::logging::init_tracing;

#[derive(Parser)]
#[command(name = "youtube-relay")]
#[command(about = "Download YouTube audio or video through a small web form")]
#[command(version)]
struct Cli {
    /// Config file (JSON); defaults to <config dir>/youtube-relay/config.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Console log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Extractor mode: auto, python or cli
    #[arg(long)]
    mode: Option<ExtractorMode>,

    /// Proxy for yt-dlp and media requests (http://, socks5://)
    #[arg(long)]
    proxy: Option<String>,

    /// Netscape cookies file passed to yt-dlp
    #[arg(long)]
    cookies: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level)?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(mode) = cli.mode {
        config.extractor = config.extractor.with_mode(mode);
    }
    if let Some(proxy) = cli.proxy {
        config.extractor = config.extractor.with_proxy(Some(proxy));
    }
    if let Some(cookies) = cli.cookies {
        config.extractor = config
            .extractor
            .with_cookies_path(Some(cookies.to_string_lossy().into_owned()));
    }

    for tool in [ToolType::YtDlp, ToolType::Python] {
        let info = ToolLocator::tool_info(tool);
        info!(
            tool = %info.name,
            path = info.path.as_deref().unwrap_or("-"),
            version = info.version.as_deref().unwrap_or("-"),
            "Tool check"
        );
    }

    let orchestrator = ExtractorOrchestrator::from_config(config.extractor.clone());
    let status = orchestrator.status();
    for &(name, available) in &status.extractors {
        info!(extractor = name, available, "Extractor");
    }
    if !orchestrator.is_available() {
        warn!("No yt-dlp extractor is available; downloads will fail until one is installed");
    }
    info!(mode = %status.mode, "Extractor mode");

    run_server(config, Arc::new(orchestrator)).await?;
    Ok(())
}
