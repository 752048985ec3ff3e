mod file_config;

pub use file_config::{FileConfig, ImageMagickConfig, StyleConfig};

use crate::generator::DerivativeGenerator;
use crate::media::MediaLayout;
use crate::processor::{ImageMagickProcessor, ImageProcessor, NativeProcessor, ProcessorKind};
use crate::server::RequestsLoggingLevel;
use crate::styles::{StyleDefinition, StyleTable};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MEDIA_URL: &str = "/media/";
pub const DEFAULT_IDENTIFY_BIN: &str = "identify";
pub const DEFAULT_CONVERT_BIN: &str = "convert";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub media_root: Option<PathBuf>,
    pub media_url: Option<String>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub processor: ProcessorKind,
    pub command_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub media_root: PathBuf,
    pub media_url: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,

    // Derivative generation
    pub processor: ProcessorKind,
    pub command_timeout_sec: u64,
    pub identify_bin: String,
    pub convert_bin: String,
    pub regenerate_stale: bool,
    pub styles: StyleTable,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let media_root = file
            .media_root
            .map(PathBuf::from)
            .or_else(|| cli.media_root.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("media_root must be specified via --media-root or in config file")
            })?;

        if !media_root.exists() {
            bail!("Media root does not exist: {:?}", media_root);
        }
        if !media_root.is_dir() {
            bail!("media_root is not a directory: {:?}", media_root);
        }

        let media_url = file
            .media_url
            .or_else(|| cli.media_url.clone())
            .unwrap_or_else(|| DEFAULT_MEDIA_URL.to_string());

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);

        let processor = match file.processor {
            Some(name) => ProcessorKind::from_str(&name, true)
                .map_err(|_| anyhow::anyhow!("Unknown image processor: {}", name))?,
            None => cli.processor,
        };

        let command_timeout_sec = file.command_timeout_sec.unwrap_or(cli.command_timeout_sec);
        if command_timeout_sec == 0 {
            bail!("command_timeout_sec must be greater than zero");
        }

        let imagemagick = file.imagemagick.unwrap_or_default();
        let identify_bin = imagemagick
            .identify_bin
            .unwrap_or_else(|| DEFAULT_IDENTIFY_BIN.to_string());
        let convert_bin = imagemagick
            .convert_bin
            .unwrap_or_else(|| DEFAULT_CONVERT_BIN.to_string());

        let mut styles = StyleTable::new();
        for (name, style) in file.styles {
            let definition = StyleDefinition::new(style.kind, style.size[0], style.size[1]);
            styles
                .insert(name, definition)
                .context("Invalid style configuration")?;
        }
        if styles.is_empty() {
            warn!("No image styles configured, every styled request will be rejected");
        }

        Ok(Self {
            media_root,
            media_url,
            port,
            logging_level,
            content_cache_age_sec,
            processor,
            command_timeout_sec,
            identify_bin,
            convert_bin,
            regenerate_stale: file.regenerate_stale.unwrap_or(false),
            styles,
        })
    }

    pub fn media_layout(&self) -> MediaLayout {
        MediaLayout::new(&self.media_root, &self.media_url)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_sec)
    }

    pub fn build_processor(&self) -> Arc<dyn ImageProcessor> {
        match self.processor {
            ProcessorKind::Imagemagick => Arc::new(ImageMagickProcessor::new(
                self.identify_bin.clone(),
                self.convert_bin.clone(),
                self.command_timeout(),
            )),
            ProcessorKind::Native => Arc::new(NativeProcessor::new()),
        }
    }

    pub fn build_generator(&self) -> DerivativeGenerator {
        DerivativeGenerator::new(
            self.media_layout(),
            self.styles.clone(),
            self.build_processor(),
        )
        .with_regenerate_stale(self.regenerate_stale)
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
