// this_file: src/lib.rs
//! Jrys - daily fortune poster generation
//!
//! This library provides functionality for:
//! - Fortune table loading and random selection
//! - Remote avatar/background fetching with an on-disk cache
//! - Geometric transforms, layered alpha compositing, and text layout
//! - Gradient-filled glyph rendering via skrifa + zeno coverage masks
//! - Single-pass poster orchestration producing a shareable JPEG

pub mod assets;
pub mod compose;
pub mod config;
pub mod error;
pub mod font;
pub mod fortune;
pub mod gradient;
pub mod logging;
pub mod poster;
pub mod text;
pub mod transform;

// Re-export commonly used types
pub use config::PosterConfig;
pub use error::{Error, Result};
pub use fortune::{FortuneEntry, FortuneTable};
pub use poster::PosterRenderer;
pub use text::Placement;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
