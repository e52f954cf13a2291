// this_file: src/error.rs
//! Error types for the jrys library

use thiserror::Error;

/// Main error type for poster generation
#[derive(Debug, Error)]
pub enum Error {
    /// Remote asset fetch failed (network error, timeout, or non-2xx status)
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// Local image file is missing or could not be decoded
    #[error("Image load failed: {0}")]
    ImageLoad(String),

    /// No background manifest files exist in the configured directory
    #[error("No background manifests configured")]
    NoBackgroundsConfigured,

    /// The fortune table is empty
    #[error("Fortune table is empty")]
    NoFortuneData,

    /// The fortune table has no entries for the chosen bucket
    #[error("Fortune table has no bucket {0}")]
    BucketMissing(u32),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Glyph rasterization failed; recovered locally by the text renderer
    #[error("Glyph render failed: {0}")]
    GlyphRender(String),

    /// JSON parsing or validation error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for jrys operations
pub type Result<T> = std::result::Result<T, Error>;
