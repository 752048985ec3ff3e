//! Media Styles Library
//!
//! Named image styles (thumbnail, upscale, crop) rendered on demand next to
//! their sources under a media root. Exposed for the binaries and for tests.

pub mod config;
pub mod generator;
pub mod media;
pub mod processor;
pub mod server;
pub mod styles;
pub mod warm;

// Re-export commonly used types for convenience
pub use generator::{Derivative, DerivativeGenerator, DerivativeOutcome};
pub use processor::{ImageMagickProcessor, ImageProcessor, NativeProcessor, ProcessorKind};
pub use server::{run_server, RequestsLoggingLevel};
pub use styles::{StyleDefinition, StyleKind, StyleTable};
