use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use media_styles::config::{AppConfig, CliConfig, FileConfig};
use media_styles::server::{self, ServerConfig};
use media_styles::{run_server, ImageMagickProcessor, ProcessorKind, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the media files, derivatives are written inside it.
    #[clap(long, value_parser = parse_path)]
    pub media_root: Option<PathBuf>,

    /// URL prefix under which media files are published (default "/media/").
    #[clap(long)]
    pub media_url: Option<String>,

    /// Path to a TOML config file. Its values override command line arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of content in the cache in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Backend used to inspect and transform images.
    #[clap(long, default_value = "imagemagick")]
    pub processor: ProcessorKind,

    /// Timeout in seconds for each ImageMagick invocation.
    #[clap(long, default_value_t = 30)]
    pub command_timeout_sec: u64,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            media_root: self.media_root.clone(),
            media_url: self.media_url.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            content_cache_age_sec: self.content_cache_age_sec,
            processor: self.processor,
            command_timeout_sec: self.command_timeout_sec,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();
    server::metrics::init_style_metrics(app_config.styles.len());

    if app_config.processor == ProcessorKind::Imagemagick {
        let imagemagick = ImageMagickProcessor::new(
            app_config.identify_bin.clone(),
            app_config.convert_bin.clone(),
            app_config.command_timeout(),
        );
        if let Err(e) = imagemagick.check_available().await {
            warn!(
                "ImageMagick is not usable ({}), styled requests will fall back to originals",
                e
            );
        }
    }

    info!(
        "Serving {:?} at {} with {} styles ({} processor)",
        app_config.media_root,
        app_config.media_url,
        app_config.styles.len(),
        app_config.processor
    );

    let generator = Arc::new(app_config.build_generator());
    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        content_cache_age_sec: app_config.content_cache_age_sec,
    };

    info!("Ready to serve at port {}!", app_config.port);
    run_server(server_config, generator).await
}
