//! Creation and reuse of image style derivatives.
//!
//! A derivative lives next to its source, in a directory named after the
//! style: `/media/a/cat.jpg` in style `thumb` becomes `/media/a/thumb/cat.jpg`.
//! Once written it is reused as long as the file exists.
//!
//! Only an unknown style is reported as an error. Every other problem (a
//! missing source, a failing or hung conversion tool, a filesystem error) is
//! logged and answered with the source URL, so callers can always render
//! something.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::media::{DerivedLocation, MediaError, MediaLayout};
use crate::processor::ImageProcessor;
use crate::server::metrics;
use crate::styles::{
    plan_derivative, planned_output_size, Operation, StyleDefinition, StyleError, StyleTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeOutcome {
    /// The derivative already existed.
    Cached,
    /// The derivative was generated by this call.
    Created,
    /// The derivative could not be produced; the URL is the source URL.
    Fallback,
}

impl DerivativeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivativeOutcome::Cached => "cached",
            DerivativeOutcome::Created => "created",
            DerivativeOutcome::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Derivative {
    pub url: String,
    pub outcome: DerivativeOutcome,
    /// File behind `url`, when it lies under the media root.
    #[serde(skip)]
    pub file: Option<PathBuf>,
}

impl Derivative {
    fn fallback(url: &str, file: Option<PathBuf>) -> Self {
        Self {
            url: url.to_string(),
            outcome: DerivativeOutcome::Fallback,
            file,
        }
    }
}

pub struct DerivativeGenerator {
    layout: MediaLayout,
    styles: StyleTable,
    processor: Arc<dyn ImageProcessor>,
    regenerate_stale: bool,
}

impl DerivativeGenerator {
    pub fn new(
        layout: MediaLayout,
        styles: StyleTable,
        processor: Arc<dyn ImageProcessor>,
    ) -> Self {
        Self {
            layout,
            styles,
            processor,
            regenerate_stale: false,
        }
    }

    /// Also regenerate a derivative when its source was modified after it.
    pub fn with_regenerate_stale(mut self, regenerate_stale: bool) -> Self {
        self.regenerate_stale = regenerate_stale;
        self
    }

    pub fn layout(&self) -> &MediaLayout {
        &self.layout
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn processor_name(&self) -> &'static str {
        self.processor.name()
    }

    /// Returns the URL of `source_url` rendered in `style_name`, creating the
    /// derivative file first if it does not exist yet.
    pub async fn get_or_create_derivative(
        &self,
        source_url: &str,
        style_name: &str,
    ) -> Result<Derivative, StyleError> {
        let style = self.styles.get(style_name)?;

        let derivative = if source_url.is_empty() {
            Derivative::fallback(source_url, None)
        } else {
            let relative = self.layout.relative_from_url(source_url);
            self.resolve(source_url, relative, style_name, style).await
        };
        metrics::record_derivative(style_name, derivative.outcome.as_str());
        Ok(derivative)
    }

    /// Like [`DerivativeGenerator::get_or_create_derivative`], addressing the
    /// source by its decoded path below the media root instead of by URL.
    pub async fn get_or_create_derivative_at(
        &self,
        relative_path: &str,
        style_name: &str,
    ) -> Result<Derivative, StyleError> {
        let style = self.styles.get(style_name)?;

        let source_url = format!("{}{}", self.layout.url_prefix(), relative_path);
        let relative = self.layout.relative_from_path(relative_path);
        let derivative = self.resolve(&source_url, relative, style_name, style).await;
        metrics::record_derivative(style_name, derivative.outcome.as_str());
        Ok(derivative)
    }

    /// Convenience wrapper returning only the URL.
    pub async fn image_style(
        &self,
        source_url: &str,
        style_name: &str,
    ) -> Result<String, StyleError> {
        Ok(self
            .get_or_create_derivative(source_url, style_name)
            .await?
            .url)
    }

    async fn resolve(
        &self,
        source_url: &str,
        relative: Result<PathBuf, MediaError>,
        style_name: &str,
        style: &StyleDefinition,
    ) -> Derivative {
        let resolved = relative.and_then(|relative| {
            let location = self.layout.derived_location_for(&relative, style_name)?;
            Ok((self.layout.root().join(relative), location))
        });
        let (source_path, location) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Cannot derive {} for {}: {}", style_name, source_url, e);
                return Derivative::fallback(source_url, None);
            }
        };

        if self.is_fresh(&location.path, &source_path).await {
            debug!("Derivative cache hit: {}", location.url);
            return Derivative {
                url: location.url,
                outcome: DerivativeOutcome::Cached,
                file: Some(location.path),
            };
        }

        let started = Instant::now();
        let source_size = match self.processor.inspect(&source_path).await {
            Ok(size) if size.w == 0 || size.h == 0 => {
                warn!("Source image {:?} has no pixels ({})", source_path, size);
                return Derivative::fallback(source_url, Some(source_path));
            }
            Ok(size) => size,
            Err(e) => {
                warn!("Source image {:?} unavailable: {}", source_path, e);
                return Derivative::fallback(source_url, Some(source_path));
            }
        };
        metrics::record_processor_call(self.processor.name(), "inspect", started.elapsed());

        let operations = plan_derivative(style, source_size);
        debug!(
            "Deriving {} ({}) from {} source to {}: {:?}",
            style_name,
            style.kind.as_str(),
            source_size,
            planned_output_size(&operations, source_size),
            operations
        );

        if let Err(e) = self.write_derivative(&source_path, &location, &operations).await {
            warn!(
                "Failed to create {} derivative of {:?}: {}",
                style_name, source_path, e
            );
            return Derivative::fallback(source_url, Some(source_path));
        }

        info!("Created {} derivative {}", style_name, location.url);
        Derivative {
            url: location.url,
            outcome: DerivativeOutcome::Created,
            file: Some(location.path),
        }
    }

    /// The processor writes into a temporary file inside the style directory
    /// which is then renamed onto the final path, so a derivative path never
    /// holds a partial image.
    async fn write_derivative(
        &self,
        source_path: &Path,
        location: &DerivedLocation,
        operations: &[Operation],
    ) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&location.dir).await?;

        let suffix = location
            .path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix(".derive-").suffix(&suffix);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }
        let temp = builder.tempfile_in(&location.dir)?;

        let started = Instant::now();
        self.processor
            .transform(source_path, temp.path(), operations)
            .await?;
        metrics::record_processor_call(self.processor.name(), "transform", started.elapsed());

        persist(temp, &location.path)?;
        Ok(())
    }

    async fn is_fresh(&self, derived: &Path, source: &Path) -> bool {
        let derived_meta = match tokio::fs::metadata(derived).await {
            Ok(meta) if meta.is_file() => meta,
            _ => return false,
        };
        if !self.regenerate_stale {
            return true;
        }

        // A source that vanished or whose mtime is unknown keeps the derivative.
        let source_modified = match tokio::fs::metadata(source).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return true,
        };
        match derived_meta.modified() {
            Ok(derived_modified) => derived_modified >= source_modified,
            Err(_) => true,
        }
    }
}

fn persist(temp: NamedTempFile, path: &Path) -> std::io::Result<()> {
    temp.persist(path).map(|_| ()).map_err(|e| e.error)
}
