// this_file: src/text.rs
//! Text layout: wrapping, placement, and multi-line drawing.
//!
//! Wrapping is character-level, not word-level. The fortune text is
//! CJK-first and has no whitespace token boundaries to respect, so the
//! layout greedily accumulates characters against a pixel budget.

use crate::compose;
use crate::font::{FontStore, TextMeasure};
use crate::gradient;
use image::{Rgb, Rgba, RgbaImage};
use log::{error, warn};

/// Horizontal placement of a text field.
///
/// A tagged variant instead of the stringly-typed position the original
/// design used; invalid placements are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Each line centers itself on the canvas independently.
    Centered,
    /// Fixed left margin.
    LeftAligned,
    /// Explicit anchor; overrides the `y` argument of `draw_text`.
    At(i64, i64),
}

/// Wrap `text` to a pixel budget by greedy character accumulation.
///
/// Each character is tentatively appended and the whole line re-measured;
/// on overflow the accumulated line is flushed and the character starts a
/// new one. Empty input produces no lines. If measurement fails the whole
/// text comes back as a single unwrapped line — rendering may overflow
/// its bounds, which beats dropping the text entirely.
pub fn wrap_text(text: &str, measure: &impl TextMeasure, size: f32, max_width: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for ch in text.chars() {
        let mut tentative = line.clone();
        tentative.push(ch);
        let width = match measure.line_width(&tentative, size) {
            Ok(w) => w,
            Err(e) => {
                error!("Text measurement failed, emitting unwrapped line: {}", e);
                return vec![text.to_string()];
            }
        };
        if width <= max_width as f32 {
            line = tentative;
        } else {
            lines.push(line);
            line = ch.to_string();
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Draws wrapped text fields onto the poster canvas.
pub struct TextRenderer<'a> {
    font: &'a FontStore,
    wrap_width: u32,
    left_margin: i64,
    palette: &'a [Rgb<u8>],
}

impl<'a> TextRenderer<'a> {
    pub fn new(font: &'a FontStore, wrap_width: u32, left_margin: i64, palette: &'a [Rgb<u8>]) -> Self {
        Self {
            font,
            wrap_width,
            left_margin,
            palette,
        }
    }

    /// Wrap `text` with this renderer's budget and font.
    pub fn wrap(&self, text: &str, size: f32) -> Vec<String> {
        wrap_text(text, self.font, size, self.wrap_width)
    }

    /// Draw a text field.
    ///
    /// Lines advance top-to-bottom with `round(size * 1.5)` spacing. With
    /// `gradients` each character is rendered as its own gradient-filled
    /// cell and the cursor advances by the cell's rendered width; without,
    /// lines are drawn in the solid fill color at true metric advances.
    /// Per-glyph failures degrade locally and never abort the field.
    pub fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        placement: Placement,
        y: i64,
        color: Rgba<u8>,
        size: f32,
        gradients: bool,
    ) {
        let lines = self.wrap(text, size);
        let line_spacing = (size * 1.5).round() as i64;
        let mut text_y = match placement {
            Placement::At(_, anchor_y) => anchor_y,
            _ => y,
        };

        for line in &lines {
            let x = self.line_x(canvas, line, placement, size);
            if gradients {
                self.draw_gradient_line(canvas, line, x, text_y, size);
            } else {
                self.draw_solid_line(canvas, line, x, text_y, color, size);
            }
            text_y += line_spacing;
        }
    }

    /// Horizontal origin for one line under the given placement.
    fn line_x(&self, canvas: &RgbaImage, line: &str, placement: Placement, size: f32) -> i64 {
        match placement {
            Placement::Centered => {
                let line_width = match self.font.line_width(line, size) {
                    Ok(w) => w,
                    Err(e) => {
                        warn!("Centering measurement failed, left-aligning line: {}", e);
                        return self.left_margin;
                    }
                };
                ((canvas.width() as f32 - line_width) / 2.0) as i64
            }
            Placement::LeftAligned => self.left_margin,
            Placement::At(x, _) => x,
        }
    }

    fn draw_solid_line(
        &self,
        canvas: &mut RgbaImage,
        line: &str,
        x: i64,
        y: i64,
        color: Rgba<u8>,
        size: f32,
    ) {
        let mut cursor = x as f32;
        for ch in line.chars() {
            match self.font.raster(ch, size) {
                Ok(raster) => {
                    if !raster.is_inkless() {
                        compose::blend_mask(canvas, &raster.mask, (cursor.round() as i64, y), color);
                    }
                    cursor += raster.advance;
                }
                Err(e) => {
                    warn!("Skipping unrenderable glyph {:?}: {}", ch, e);
                    cursor += self.font.advance(ch, size);
                }
            }
        }
    }

    fn draw_gradient_line(&self, canvas: &mut RgbaImage, line: &str, x: i64, y: i64, size: f32) {
        let mut rng = rand::thread_rng();
        let mut cursor = x;
        for ch in line.chars() {
            let stops = gradient::random_stops(self.palette, &mut rng);
            let cell = match gradient::render_gradient_glyph(self.font, ch, size, &stops) {
                Ok(cell) => cell,
                Err(e) => {
                    warn!("Gradient glyph {:?} failed ({}); using flat fallback", ch, e);
                    gradient::flat_fallback_cell(self.font, ch, size)
                }
            };
            if cell.width() == 0 {
                // Inkless character: keep the cursor moving by its advance.
                cursor += self.font.advance(ch, size).round() as i64;
                continue;
            }
            compose::paste_over(canvas, &cell, (cursor, y));
            cursor += cell.width() as i64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};

    /// Every character is `width` pixels wide.
    struct FixedWidth {
        width: f32,
    }

    impl TextMeasure for FixedWidth {
        fn line_width(&self, text: &str, _size: f32) -> Result<f32> {
            Ok(text.chars().count() as f32 * self.width)
        }
    }

    struct FailingMeasure;

    impl TextMeasure for FailingMeasure {
        fn line_width(&self, _text: &str, _size: f32) -> Result<f32> {
            Err(Error::GlyphRender("no metrics".to_string()))
        }
    }

    #[test]
    fn empty_input_yields_no_lines() {
        let measure = FixedWidth { width: 10.0 };
        assert!(wrap_text("", &measure, 30.0, 100).is_empty());
    }

    #[test]
    fn lines_rejoin_to_the_original_text() {
        let measure = FixedWidth { width: 10.0 };
        let text = "今天的运势非常不错值得出门走走";
        let lines = wrap_text(text, &measure, 30.0, 55);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn each_line_fits_the_budget() {
        let measure = FixedWidth { width: 10.0 };
        let lines = wrap_text("abcdefghij", &measure, 30.0, 35);
        // 3 chars of 10px fit a 35px budget.
        assert_eq!(lines, vec!["abc", "def", "ghi", "j"]);
    }

    #[test]
    fn oversized_single_character_gets_its_own_line() {
        let measure = FixedWidth { width: 50.0 };
        let lines = wrap_text("ab", &measure, 30.0, 40);
        // Each character alone exceeds the budget; one char per line,
        // first flush is the empty accumulated line.
        assert_eq!(lines.concat(), "ab");
        assert!(lines.iter().all(|l| l.chars().count() <= 1));
    }

    #[test]
    fn measurement_failure_returns_single_unwrapped_line() {
        let lines = wrap_text("some text", &FailingMeasure, 30.0, 10);
        assert_eq!(lines, vec!["some text"]);
    }

    #[test]
    fn solid_text_marks_the_canvas() {
        let font = FontStore::fallback();
        let palette = crate::config::LIGHT_PALETTE;
        let renderer = TextRenderer::new(&font, 1000, 20, &palette);
        let mut canvas = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        renderer.draw_text(
            &mut canvas,
            "hi",
            Placement::LeftAligned,
            10,
            Rgba([255, 255, 255, 255]),
            30.0,
            false,
        );
        let lit = canvas.pixels().filter(|p| p.0[0] > 200).count();
        assert!(lit > 0, "solid text drew nothing");
    }

    #[test]
    fn gradient_text_marks_the_canvas() {
        let font = FontStore::fallback();
        let palette = crate::config::LIGHT_PALETTE;
        let renderer = TextRenderer::new(&font, 1000, 20, &palette);
        let mut canvas = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        renderer.draw_text(
            &mut canvas,
            "hi",
            Placement::Centered,
            10,
            Rgba([255, 255, 255, 255]),
            30.0,
            true,
        );
        let lit = canvas.pixels().filter(|p| p.0[0] > 100).count();
        assert!(lit > 0, "gradient text drew nothing");
    }

    #[test]
    fn explicit_anchor_overrides_y() {
        let font = FontStore::fallback();
        let palette = crate::config::LIGHT_PALETTE;
        let renderer = TextRenderer::new(&font, 1000, 20, &palette);
        let mut canvas = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        renderer.draw_text(
            &mut canvas,
            "x",
            Placement::At(10, 50),
            0, // ignored
            Rgba([255, 255, 255, 255]),
            20.0,
            false,
        );
        let top_half = canvas
            .enumerate_pixels()
            .filter(|(_, y, p)| *y < 50 && p.0[0] > 200)
            .count();
        let bottom_half = canvas
            .enumerate_pixels()
            .filter(|(_, y, p)| *y >= 50 && p.0[0] > 200)
            .count();
        assert_eq!(top_half, 0);
        assert!(bottom_half > 0);
    }
}
