//! Shared constants for end-to-end tests
//!
//! When the fixture media tree changes, update only this file.

// ============================================================================
// Media Fixtures
// ============================================================================

/// URL prefix the test server publishes media under
pub const MEDIA_URL: &str = "/media/";

/// 192x108 JPEG, a wide landscape
pub const LANDSCAPE_JPG: &str = "uploads/blog/image/landscape.jpg";
pub const LANDSCAPE_SIZE: (u32, u32) = (192, 108);

/// 60x100 PNG, a tall portrait
pub const PORTRAIT_PNG: &str = "uploads/blog/image/portrait.png";
pub const PORTRAIT_SIZE: (u32, u32) = (60, 100);

/// 40x30 PNG, smaller than every thumbnail box
pub const SMALL_PNG: &str = "uploads/blog/image/small.png";
pub const SMALL_SIZE: (u32, u32) = (40, 30);

/// Plain text file stored with an image extension
pub const FAKE_IMAGE_PNG: &str = "uploads/blog/image/fake.png";

/// Regular document upload
pub const README_TXT: &str = "uploads/blog/file/readme.txt";

// ============================================================================
// Styles
// ============================================================================

/// `thumbnail`, 64x64
pub const STYLE_THUMB: &str = "thumb";

/// `thumbnail-upscale`, 120x120
pub const STYLE_LARGE: &str = "large";

/// `thumbnail-crop`, 50x50
pub const STYLE_SQUARE: &str = "square";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
