//! Bulk generation of derivatives for every image under the media root.

use std::path::Path;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::generator::{DerivativeGenerator, DerivativeOutcome};
use crate::media::UploadKind;
use crate::styles::StyleError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WarmReport {
    pub images: usize,
    pub cached: usize,
    pub created: usize,
    pub failed: usize,
}

impl WarmReport {
    fn record(&mut self, outcome: DerivativeOutcome) {
        match outcome {
            DerivativeOutcome::Cached => self.cached += 1,
            DerivativeOutcome::Created => self.created += 1,
            DerivativeOutcome::Fallback => self.failed += 1,
        }
    }
}

/// Renders `style`, or every configured style when `None`, for each image
/// found below the media root. Style directories and hidden entries are not
/// descended into, so derivatives are never derived again.
pub async fn warm_media_root(
    generator: &DerivativeGenerator,
    style: Option<&str>,
) -> Result<WarmReport, StyleError> {
    let styles: Vec<String> = match style {
        Some(name) => {
            generator.styles().get(name)?;
            vec![name.to_string()]
        }
        None => generator.styles().names().map(str::to_string).collect(),
    };

    let root = generator.layout().root().to_path_buf();
    let sources = collect_images(&root, generator);
    info!(
        "Warming {} styles for {} images under {:?}",
        styles.len(),
        sources.len(),
        root
    );

    let mut report = WarmReport::default();
    for relative in sources {
        report.images += 1;
        let url = generator.layout().url_for(&relative);
        for style in &styles {
            let derivative = generator.get_or_create_derivative(&url, style).await?;
            debug!("{} [{}] -> {}", url, style, derivative.outcome.as_str());
            report.record(derivative.outcome);
        }
    }
    Ok(report)
}

fn collect_images(root: &Path, generator: &DerivativeGenerator) -> Vec<std::path::PathBuf> {
    let is_skipped = |entry: &DirEntry| {
        let name = entry.file_name().to_string_lossy();
        entry.depth() > 0
            && (name.starts_with('.')
                || (entry.file_type().is_dir() && generator.styles().contains(&name)))
    };

    let mut images: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            UploadKind::Image
                .validate_extension(&entry.file_name().to_string_lossy())
                .is_ok()
        })
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    images.sort();
    images
}
