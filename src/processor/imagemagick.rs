//! ImageMagick backend using the `identify` and `convert` command line tools.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{ImageProcessor, ProcessorError};
use crate::styles::{Operation, Size};

pub struct ImageMagickProcessor {
    identify_bin: String,
    convert_bin: String,
    timeout: Duration,
}

impl ImageMagickProcessor {
    /// # Arguments
    /// * `identify_bin` - Program used to read image dimensions (usually "identify")
    /// * `convert_bin` - Program used to crop and resize (usually "convert")
    /// * `timeout` - Upper bound for every single invocation
    pub fn new(
        identify_bin: impl Into<String>,
        convert_bin: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            identify_bin: identify_bin.into(),
            convert_bin: convert_bin.into(),
            timeout,
        }
    }

    /// Check if identify and convert are available.
    pub async fn check_available(&self) -> Result<(), ProcessorError> {
        for program in [&self.identify_bin, &self.convert_bin] {
            let output = self
                .run(program, vec![OsString::from("-version")])
                .await
                .map_err(|e| {
                    ProcessorError::InspectFailed(format!(
                        "{} not found or not working: {}",
                        program, e
                    ))
                })?;
            if !output.status.success() {
                return Err(ProcessorError::InspectFailed(format!(
                    "{} not found or not working",
                    program
                )));
            }
        }
        Ok(())
    }

    async fn run(&self, program: &str, args: Vec<OsString>) -> Result<Output, ProcessorError> {
        debug!("Running {} {:?}", program, args);

        let mut command = Command::new(program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(output) => Ok(output?),
            Err(_) => Err(ProcessorError::Timeout(program.to_string(), self.timeout)),
        }
    }
}

#[async_trait]
impl ImageProcessor for ImageMagickProcessor {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    async fn inspect(&self, path: &Path) -> Result<Size, ProcessorError> {
        let output = self
            .run(&self.identify_bin, vec![path.as_os_str().to_owned()])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProcessorError::InspectFailed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_identify_output(&stdout, &path.to_string_lossy())
    }

    async fn transform(
        &self,
        source: &Path,
        destination: &Path,
        operations: &[Operation],
    ) -> Result<(), ProcessorError> {
        let output = self
            .run(&self.convert_bin, convert_args(source, destination, operations))
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProcessorError::ConversionFailed(stderr.trim().to_string()));
        }
        Ok(())
    }
}

/// Extracts the image size from `identify` output.
///
/// The output looks like `<path>[frame] <format> <W>x<H> <page geometry> ...`.
/// The echoed path may contain spaces, so it is stripped before splitting.
/// Only the first line (first frame) is considered.
pub fn parse_identify_output(output: &str, path: &str) -> Result<Size, ProcessorError> {
    let line = output
        .lines()
        .next()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| ProcessorError::InvalidOutput("empty identify output".to_string()))?;

    let size = match line.strip_prefix(path) {
        Some(rest) => strip_frame_suffix(rest)
            .split_whitespace()
            .nth(1)
            .and_then(Size::parse),
        None => line.split_whitespace().skip(1).find_map(Size::parse),
    };

    size.ok_or_else(|| ProcessorError::InvalidOutput(format!("no WxH size in: {}", line)))
}

fn strip_frame_suffix(rest: &str) -> &str {
    if let Some(inner) = rest.strip_prefix('[') {
        if let Some(end) = inner.find(']') {
            if inner[..end].chars().all(|c| c.is_ascii_digit()) {
                return &inner[end + 1..];
            }
        }
    }
    rest
}

/// Arguments for a single `convert` call applying every operation in order.
fn convert_args(source: &Path, destination: &Path, operations: &[Operation]) -> Vec<OsString> {
    let mut args = vec![source.as_os_str().to_owned()];
    for op in operations {
        match op {
            Operation::Crop(rect) => {
                args.push("-crop".into());
                args.push(rect.to_string().into());
                args.push("+repage".into());
            }
            Operation::Thumbnail(size) => {
                args.push("-thumbnail".into());
                args.push(size.to_string().into());
                args.push("-antialias".into());
            }
        }
    }
    args.push(destination.as_os_str().to_owned());
    args
}
