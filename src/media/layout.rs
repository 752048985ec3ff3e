//! Mapping between public media URLs and files under the media root.

use std::path::{Component, Path, PathBuf};

use super::MediaError;

/// Where media files live on disk and under which URL prefix they are served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLayout {
    root: PathBuf,
    url_prefix: String,
}

/// Locations of a derivative, both as URL and as file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedLocation {
    pub url: String,
    pub dir: PathBuf,
    pub path: PathBuf,
}

impl MediaLayout {
    /// `url_prefix` is normalized to start and end with a single `/`.
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        let trimmed = url_prefix.trim_matches('/');
        let url_prefix = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Resolves a media URL to its file under the media root.
    ///
    /// Query strings and fragments are ignored. URLs outside the prefix, or
    /// whose path would escape the root, are rejected.
    pub fn resolve_url(&self, url: &str) -> Result<PathBuf, MediaError> {
        let relative = self.relative_from_url(url)?;
        Ok(self.root.join(relative))
    }

    /// Builds the public URL for a path relative to the media root.
    pub fn url_for(&self, relative: &Path) -> String {
        let parts: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        format!("{}{}", self.url_prefix, parts.join("/"))
    }

    /// Resolves a path relative to the media root (already URL-decoded, so
    /// `?` and `#` are ordinary filename characters) to its file.
    pub fn resolve_path(&self, relative: &str) -> Result<PathBuf, MediaError> {
        Ok(self.root.join(self.relative_from_path(relative)?))
    }

    /// Derivative location for a source URL: the style becomes a directory
    /// next to the source file, and the filename is kept.
    pub fn derived_location(&self, url: &str, style: &str) -> Result<DerivedLocation, MediaError> {
        let relative = self.relative_from_url(url)?;
        self.derived_location_for(&relative, style)
    }

    /// Same as [`MediaLayout::derived_location`] for an already validated
    /// relative path.
    pub fn derived_location_for(
        &self,
        relative: &Path,
        style: &str,
    ) -> Result<DerivedLocation, MediaError> {
        let file_name = relative
            .file_name()
            .ok_or_else(|| MediaError::InvalidUrl(relative.to_string_lossy().to_string()))?;
        let relative_dir = relative.parent().unwrap_or_else(|| Path::new(""));

        let derived_relative = relative_dir.join(style).join(file_name);
        let dir = self.root.join(relative_dir).join(style);
        let path = dir.join(file_name);
        Ok(DerivedLocation {
            url: self.url_for(&derived_relative),
            dir,
            path,
        })
    }

    /// Path below the media root addressed by a media URL. Query strings and
    /// fragments are ignored.
    pub fn relative_from_url(&self, url: &str) -> Result<PathBuf, MediaError> {
        let path_part = url.split(['?', '#']).next().unwrap_or_default();
        let rest = path_part
            .strip_prefix(self.url_prefix.as_str())
            .ok_or_else(|| MediaError::OutsideMediaRoot(url.to_string()))?;
        self.relative_from_path(rest)
    }

    /// Validates a `/`-separated path below the media root.
    pub fn relative_from_path(&self, path: &str) -> Result<PathBuf, MediaError> {
        let mut relative = PathBuf::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(MediaError::OutsideMediaRoot(path.to_string())),
                s if s.contains(['\\', '\0']) => {
                    return Err(MediaError::InvalidUrl(path.to_string()))
                }
                s => relative.push(s),
            }
        }

        if relative.as_os_str().is_empty() {
            return Err(MediaError::InvalidUrl(path.to_string()));
        }
        Ok(relative)
    }
}
