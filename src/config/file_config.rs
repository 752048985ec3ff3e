use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::styles::StyleKind;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub media_root: Option<String>,
    pub media_url: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub content_cache_age_sec: Option<usize>,
    pub processor: Option<String>,
    pub command_timeout_sec: Option<u64>,
    pub regenerate_stale: Option<bool>,

    // Feature configs
    pub imagemagick: Option<ImageMagickConfig>,
    pub styles: BTreeMap<String, StyleConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ImageMagickConfig {
    pub identify_bin: Option<String>,
    pub convert_bin: Option<String>,
}

/// One `[styles.<name>]` table, e.g. `type = "thumbnail-crop"`, `size = [300, 300]`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StyleConfig {
    #[serde(rename = "type")]
    pub kind: StyleKind,
    pub size: [u32; 2],
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
