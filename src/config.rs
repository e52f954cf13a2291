// this_file: src/config.rs
//! Poster configuration.
//!
//! All tunables live in one immutable struct handed to every component
//! constructor. Nothing in the pipeline reads ambient global state.

use image::Rgb;
use std::path::PathBuf;
use std::time::Duration;

/// Avatars older than this are re-fetched.
pub const AVATAR_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Hard timeout applied to every remote fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Light palette the gradient renderer samples from.
pub const LIGHT_PALETTE: [Rgb<u8>; 8] = [
    Rgb([255, 250, 205]), // pale yellow
    Rgb([173, 216, 230]), // pale blue
    Rgb([221, 160, 221]), // pale violet
    Rgb([255, 182, 193]), // pale pink
    Rgb([240, 230, 140]), // pale khaki
    Rgb([224, 255, 255]), // pale cyan
    Rgb([245, 245, 220]), // pale beige
    Rgb([230, 230, 250]), // pale lavender
];

/// Immutable configuration for the poster pipeline.
#[derive(Debug, Clone)]
pub struct PosterConfig {
    /// TTF/OTF file used for all text. Missing file degrades to the
    /// built-in box-glyph fallback.
    pub font_path: PathBuf,
    /// Directory holding cached avatars, one file per user id.
    pub avatar_dir: PathBuf,
    /// Directory holding background manifest files (`*.txt`, one URL per
    /// line). Downloaded images land in an `images/` subdirectory.
    pub background_dir: PathBuf,
    /// Fortune table JSON document.
    pub fortune_path: PathBuf,
    /// Avatar endpoint template; `{user}` is replaced with the user id.
    pub avatar_url: String,
    /// Cached avatars older than this are re-fetched.
    pub avatar_ttl: Duration,
    /// Timeout for avatar and background fetches.
    pub fetch_timeout: Duration,
    /// Output canvas width in pixels.
    pub canvas_width: u32,
    /// Output canvas height in pixels.
    pub canvas_height: u32,
    /// Sources larger than `target * slack` in either dimension are
    /// downscaled before cropping.
    pub downscale_slack: f32,
    /// Pixel budget used when wrapping text lines.
    pub wrap_width: u32,
    /// Left margin for left-aligned text.
    pub left_margin: i64,
    /// Color stops available to the gradient glyph renderer.
    pub palette: Vec<Rgb<u8>>,
}

impl PosterConfig {
    /// Build a configuration rooted at a data directory, using the
    /// default layout: `avatars/`, `backgroundFolder/`, `font/` and
    /// `jrys.json` under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            font_path: data_dir.join("font").join("千图马克手写体.ttf"),
            avatar_dir: data_dir.join("avatars"),
            background_dir: data_dir.join("backgroundFolder"),
            fortune_path: data_dir.join("jrys.json"),
            avatar_url: "http://q.qlogo.cn/g?b=qq&nk={user}&s=640".to_string(),
            avatar_ttl: AVATAR_TTL,
            fetch_timeout: FETCH_TIMEOUT,
            canvas_width: 1080,
            canvas_height: 1920,
            downscale_slack: 1.8,
            wrap_width: 1000,
            left_margin: 20,
            palette: LIGHT_PALETTE.to_vec(),
        }
    }

    /// Directory where downloaded background images are cached.
    pub fn background_image_dir(&self) -> PathBuf {
        self.background_dir.join("images")
    }
}
