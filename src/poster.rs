// this_file: src/poster.rs
//! Poster orchestration.
//!
//! One request runs the whole pipeline in a single pass: pick a fortune,
//! derive the layout, acquire and crop the background, overlay the
//! panel, draw the text fields, composite the avatar, encode JPEG. Each
//! step either succeeds or fails the request; there are no retries.

use crate::assets::AssetCache;
use crate::compose;
use crate::config::PosterConfig;
use crate::error::{Error, Result};
use crate::font::FontStore;
use crate::fortune::FortuneTable;
use crate::logging::Timer;
use crate::text::{Placement, TextRenderer};
use crate::transform;
use chrono::{Datelike, Local};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;

/// Translucent panel behind the text block.
const PANEL_POS: (i64, i64) = (0, 1270);
const PANEL_W: u32 = 1080;
const PANEL_H: u32 = 700;
const PANEL_RADIUS: u32 = 50;
const PANEL_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);

/// Baseline anchors of the fixed text fields.
const DATE_Y: i64 = 1300;
const SUMMARY_Y: i64 = 1400;
const LUCKY_STAR_Y: i64 = 1500;
const SIGN_Y: i64 = 1600;
const UNSIGN_Y: i64 = 1700;
const WARNING_Y: i64 = 1850;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const WARNING_TEXT: &str = "仅供娱乐 | 相信科学 | 请勿迷信";

/// The unsign text is expected to fit this many wrapped lines; beyond
/// it the two bottom captions are nudged apart.
const EXPECTED_UNSIGN_LINES: usize = 3;
const WARNING_SHIFT_PER_LINE: i64 = 10;
const UNSIGN_SHIFT_PER_LINE: i64 = 15;

const AVATAR_SIZE: u32 = 150;
const AVATAR_POS: (i64, i64) = (60, 1350);

const JPEG_QUALITY: u8 = 85;

/// Shift the warning caption down and the unsign anchor up when the
/// wrapped unsign text exceeds its expected line budget, so the two
/// captions don't collide.
fn caption_offsets(unsign_lines: usize) -> (i64, i64) {
    let extra = unsign_lines.saturating_sub(EXPECTED_UNSIGN_LINES) as i64;
    (
        WARNING_Y + extra * WARNING_SHIFT_PER_LINE,
        UNSIGN_Y - extra * UNSIGN_SHIFT_PER_LINE,
    )
}

/// Generates daily fortune posters.
pub struct PosterRenderer {
    config: PosterConfig,
    table: FortuneTable,
    font: FontStore,
    assets: AssetCache,
}

impl PosterRenderer {
    /// Load the fortune table and font and prepare the asset cache.
    pub fn new(config: PosterConfig) -> Result<Self> {
        let table = FortuneTable::load(&config.fortune_path)?;
        let font = FontStore::load(&config.font_path);
        if font.is_fallback() {
            warn!("Rendering with the built-in fallback font");
        }
        let assets = AssetCache::new(&config)?;
        Ok(Self {
            config,
            table,
            font,
            assets,
        })
    }

    /// Generate a poster for `user_id` and return the encoded JPEG.
    pub fn generate(&self, user_id: &str) -> Result<Vec<u8>> {
        let timer = Timer::new(format!("poster for user {}", user_id));
        let mut rng = rand::thread_rng();

        if self.table.is_empty() {
            return Err(Error::NoFortuneData);
        }
        let entry = self.table.pick_entry(&mut rng)?;

        let text = TextRenderer::new(
            &self.font,
            self.config.wrap_width,
            self.config.left_margin,
            &self.config.palette,
        );

        // Collision-avoidance between the two bottom captions.
        let unsign_lines = text.wrap(&entry.unsign_text, 30.0).len();
        let (warning_y, unsign_y) = caption_offsets(unsign_lines);

        let background = self.assets.fetch_background()?;
        let mut canvas = transform::crop_center(
            &background,
            self.config.canvas_width,
            self.config.canvas_height,
            self.config.downscale_slack,
        )?;

        compose::overlay_panel(
            &mut canvas,
            PANEL_POS,
            PANEL_W,
            PANEL_H,
            PANEL_RADIUS,
            PANEL_COLOR,
        );

        let now = Local::now();
        let date = format!("{}/{}/{}", now.year(), now.month(), now.day());

        text.draw_text(&mut canvas, &date, Placement::Centered, DATE_Y, WHITE, 50.0, true);
        text.draw_text(
            &mut canvas,
            &entry.fortune_summary,
            Placement::Centered,
            SUMMARY_Y,
            WHITE,
            60.0,
            false,
        );
        text.draw_text(
            &mut canvas,
            &entry.lucky_star,
            Placement::Centered,
            LUCKY_STAR_Y,
            WHITE,
            60.0,
            true,
        );
        text.draw_text(
            &mut canvas,
            &entry.sign_text,
            Placement::LeftAligned,
            SIGN_Y,
            WHITE,
            30.0,
            false,
        );
        text.draw_text(
            &mut canvas,
            &entry.unsign_text,
            Placement::LeftAligned,
            unsign_y,
            WHITE,
            30.0,
            false,
        );
        text.draw_text(
            &mut canvas,
            WARNING_TEXT,
            Placement::Centered,
            warning_y,
            WHITE,
            30.0,
            false,
        );

        self.composite_avatar(&mut canvas, user_id)?;

        let bytes = encode_jpeg(&canvas)?;
        timer.log_elapsed(log::Level::Info);
        Ok(bytes)
    }

    /// Generate a poster and persist it to a temporary `.jpg` for
    /// handoff; the caller owns (and should remove) the file.
    pub fn generate_to_temp(&self, user_id: &str) -> Result<PathBuf> {
        let bytes = self.generate(user_id)?;
        let mut tmp = tempfile::Builder::new()
            .prefix("jrys-")
            .suffix(".jpg")
            .tempfile()?;
        tmp.write_all(&bytes)?;
        let (_file, path) = tmp
            .keep()
            .map_err(|e| Error::Io(e.error))?;
        info!("Poster written to {}", path.display());
        Ok(path)
    }

    /// Fetch, circle-crop and paste the user's avatar.
    ///
    /// A failed fetch aborts the request; a cached file that no longer
    /// decodes only costs the avatar, not the poster.
    fn composite_avatar(&self, canvas: &mut RgbaImage, user_id: &str) -> Result<()> {
        let path = self.assets.fetch_avatar(user_id)?;
        let avatar = match image::open(&path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!("Cached avatar {} does not decode: {}", path.display(), e);
                return Ok(());
            }
        };
        let avatar = imageops::resize(&avatar, AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);
        let mask = compose::circle_mask(AVATAR_SIZE, AVATAR_SIZE);
        compose::paste_masked(canvas, &avatar, AVATAR_POS, &mask);
        Ok(())
    }
}

/// Encode the canvas as an optimized JPEG.
fn encode_jpeg(canvas: &RgbaImage) -> Result<Vec<u8>> {
    // JPEG carries no alpha; flatten first, as the original pipeline did.
    let rgb = image::DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    Ok(bytes)
}
