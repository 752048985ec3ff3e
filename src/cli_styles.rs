use anyhow::{Context, Result};
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use media_styles::config::{AppConfig, CliConfig, FileConfig};
use media_styles::media::{upload_path, UploadKind};
use media_styles::warm::warm_media_root;
use media_styles::ProcessorKind;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

fn get_styles() -> Styles {
    Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Directory holding the media files. Defaults to the current directory.
    #[clap(long, value_parser = parse_path)]
    pub media_root: Option<PathBuf>,

    /// URL prefix under which media files are published (default "/media/").
    #[clap(long)]
    pub media_url: Option<String>,

    /// Path to a TOML config file, the same one the server reads.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Backend used to inspect and transform images.
    #[clap(long, default_value = "imagemagick")]
    pub processor: ProcessorKind,

    /// Timeout in seconds for each ImageMagick invocation.
    #[clap(long, default_value_t = 30)]
    pub command_timeout_sec: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the URL of an image in the given style, creating the derivative
    /// if it does not exist yet.
    Derive { url: String, style: String },

    /// Prints the pixel dimensions of an image file.
    Inspect {
        #[clap(value_parser = parse_path)]
        path: PathBuf,
    },

    /// Creates the derivatives of every image under the media root.
    Warm {
        /// Only render this style.
        #[clap(long)]
        style: Option<String>,
    },

    /// Lists the configured styles.
    Styles,

    /// Prints where an upload would be stored, relative to the media root.
    UploadPath {
        page_type: String,
        kind: UploadKind,
        group: String,
        filename: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let media_root = match &cli_args.media_root {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    let cli_config = CliConfig {
        media_root: Some(media_root),
        media_url: cli_args.media_url.clone(),
        processor: cli_args.processor,
        command_timeout_sec: cli_args.command_timeout_sec,
        ..Default::default()
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    match cli_args.command {
        Command::Derive { url, style } => {
            let generator = app_config.build_generator();
            let derivative = generator.get_or_create_derivative(&url, &style).await?;
            println!("{} ({})", derivative.url, derivative.outcome.as_str());
        }
        Command::Inspect { path } => {
            let processor = app_config.build_processor();
            let size = processor
                .inspect(&path)
                .await
                .with_context(|| format!("Cannot inspect {:?}", path))?;
            println!("{}", size);
        }
        Command::Warm { style } => {
            let generator = app_config.build_generator();
            let report = warm_media_root(&generator, style.as_deref()).await?;
            println!(
                "{} images: {} created, {} already present, {} failed",
                report.images, report.created, report.cached, report.failed
            );
        }
        Command::Styles => {
            for (name, style) in app_config.styles.iter() {
                println!("{:<20} {:<18} {}", name, style.kind.as_str(), style.target);
            }
        }
        Command::UploadPath {
            page_type,
            kind,
            group,
            filename,
        } => {
            kind.validate_extension(&filename)?;
            println!("{}", upload_path(&page_type, kind, &group, &filename)?);
        }
    }

    Ok(())
}
