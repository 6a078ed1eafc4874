use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vidgrab::{Config, VideoDownloader, run_with_shutdown};

/// Self-hosted video download service
#[derive(Parser, Debug)]
#[command(name = "vidgrab")]
#[command(version)]
#[command(about = "Download videos in the background and serve them over HTTP", long_about = None)]
struct Cli {
    /// JSON configuration file (every setting has a default)
    #[arg(long, value_name = "FILE")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Address the API listens on, e.g. 127.0.0.1:54321
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Directory finished files are stored in
    #[arg(long, value_name = "DIR")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    download_dir: Option<PathBuf>,

    /// Number of downloads that may run at once
    #[arg(long, value_name = "N")]
    max_concurrent: Option<usize>,
}

impl Cli {
    /// Load the config file (if any) and apply command line overrides
    fn load_config(&self) -> vidgrab::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(bind) = self.bind {
            config.server.api.bind_address = bind;
        }
        if let Some(dir) = &self.download_dir {
            config.download.download_dir = dir.clone();
        }
        if let Some(n) = self.max_concurrent {
            config.download.max_concurrent_downloads = n;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Cli::parse();
    let config = args.load_config()?;

    tracing::info!(
        download_dir = ?config.download_dir(),
        max_concurrent = config.download.max_concurrent_downloads,
        "starting vidgrab"
    );

    let downloader = VideoDownloader::new(config).await?;
    run_with_shutdown(Arc::new(downloader)).await?;

    Ok(())
}
