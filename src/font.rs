// this_file: src/font.rs
//! Font loading, text metrics, and glyph coverage masks.
//!
//! One font file is loaded at startup and shared by every text field on
//! the poster. Outlines come from skrifa and are rasterized with zeno
//! into 8-bit coverage masks. When the font file is absent or unreadable
//! the store degrades to a built-in box-glyph rasterizer so the poster
//! still renders, just with placeholder glyphs.

use crate::error::{Error, Result};
use image::GrayImage;
use log::{debug, warn};
use read_fonts::FileRef;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, MetadataProvider};
use std::fs;
use std::path::Path;
use zeno::{Command, Mask, Transform};

/// Advance assigned to characters the font cannot map.
const MISSING_ADVANCE_EM: f32 = 0.5;

/// Fixed advance of the built-in fallback font.
const FALLBACK_ADVANCE_EM: f32 = 0.6;

/// Ascent of the built-in fallback font.
const FALLBACK_ASCENT_EM: f32 = 0.8;

/// Pixel-width measurement seam, so text layout can be driven by a stub
/// in tests.
pub trait TextMeasure {
    /// Width of `text` in pixels when set at `size`.
    fn line_width(&self, text: &str, size: f32) -> Result<f32>;
}

/// A rasterized glyph in its layout cell.
///
/// The cell reproduces an ascender-anchored text origin: pasting the
/// cell at the line's (x, y) puts the glyph ink exactly where a solid
/// text draw at that origin would. `cell_w` is the ink's right edge and
/// doubles as the gradient cursor advance; `advance` is the true
/// metric advance used by solid text.
#[derive(Debug, Clone)]
pub struct GlyphRaster {
    /// Coverage mask sized `cell_w` x `cell_h`; all-zero for inkless glyphs.
    pub mask: GrayImage,
    /// Ink right edge in pixels.
    pub cell_w: u32,
    /// Ascender-to-ink-bottom height in pixels.
    pub cell_h: u32,
    /// Horizontal metric advance in pixels.
    pub advance: f32,
}

impl GlyphRaster {
    /// Inkless placeholder carrying only an advance (spaces, unmapped
    /// characters).
    fn inkless(advance: f32) -> Self {
        Self {
            mask: GrayImage::new(0, 0),
            cell_w: 0,
            cell_h: 0,
            advance,
        }
    }

    /// True when the glyph produced no coverage.
    pub fn is_inkless(&self) -> bool {
        self.cell_w == 0 || self.cell_h == 0
    }
}

enum FontKind {
    /// Outline font loaded from disk.
    Outline(Vec<u8>),
    /// Built-in box-glyph fallback.
    Fallback,
}

/// Shared font store for the poster pipeline.
pub struct FontStore {
    kind: FontKind,
}

impl FontStore {
    /// Load the font at `path`, validating that it parses.
    ///
    /// Any failure degrades to the built-in fallback with a warning; the
    /// poster must keep rendering without the bundled font.
    pub fn load(path: &Path) -> Self {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    "Font {} unavailable ({}); using built-in fallback",
                    path.display(),
                    e
                );
                return Self {
                    kind: FontKind::Fallback,
                };
            }
        };

        // Classify the file (plain font or collection) before trusting it;
        // either way the first face is the one used.
        let parses = match FileRef::new(&data) {
            Ok(FileRef::Font(_)) | Ok(FileRef::Collection(_)) => {
                FontRef::from_index(&data, 0).is_ok()
            }
            Err(_) => false,
        };
        if !parses {
            warn!(
                "Font {} failed to parse; using built-in fallback",
                path.display()
            );
            return Self {
                kind: FontKind::Fallback,
            };
        }

        debug!("Loaded font {} ({} bytes)", path.display(), data.len());
        Self {
            kind: FontKind::Outline(data),
        }
    }

    /// Built-in fallback store, mainly for tests.
    pub fn fallback() -> Self {
        Self {
            kind: FontKind::Fallback,
        }
    }

    /// True when the built-in fallback is active.
    pub fn is_fallback(&self) -> bool {
        matches!(self.kind, FontKind::Fallback)
    }

    /// Distance from the text origin down to the baseline, in pixels.
    pub fn ascent(&self, size: f32) -> f32 {
        match &self.kind {
            FontKind::Outline(data) => match FontRef::from_index(data, 0) {
                Ok(font) => {
                    font.metrics(Size::new(size), LocationRef::default())
                        .ascent
                }
                Err(_) => size * FALLBACK_ASCENT_EM,
            },
            FontKind::Fallback => size * FALLBACK_ASCENT_EM,
        }
    }

    /// Horizontal advance of one character in pixels.
    pub fn advance(&self, ch: char, size: f32) -> f32 {
        match &self.kind {
            FontKind::Outline(data) => {
                let Ok(font) = FontRef::from_index(data, 0) else {
                    return size * MISSING_ADVANCE_EM;
                };
                let location = LocationRef::default();
                match font.charmap().map(ch) {
                    Some(gid) => font
                        .glyph_metrics(Size::new(size), location)
                        .advance_width(gid)
                        .unwrap_or(size * MISSING_ADVANCE_EM),
                    None => size * MISSING_ADVANCE_EM,
                }
            }
            FontKind::Fallback => size * FALLBACK_ADVANCE_EM,
        }
    }

    /// Rasterize one character into its layout cell.
    ///
    /// Unmapped and inkless characters yield an advance-only placeholder
    /// rather than an error; `Err` means the outline itself failed to
    /// draw and the caller decides how to degrade.
    pub fn raster(&self, ch: char, size: f32) -> Result<GlyphRaster> {
        match &self.kind {
            FontKind::Outline(data) => self.raster_outline(data, ch, size),
            FontKind::Fallback => Ok(self.raster_fallback(ch, size)),
        }
    }

    fn raster_outline(&self, data: &[u8], ch: char, size: f32) -> Result<GlyphRaster> {
        let font = FontRef::from_index(data, 0)
            .map_err(|e| Error::GlyphRender(format!("font no longer parses: {}", e)))?;
        let location = LocationRef::default();
        let size_obj = Size::new(size);
        let advance = self.advance(ch, size);

        let Some(gid) = font.charmap().map(ch) else {
            return Ok(GlyphRaster::inkless(advance));
        };
        let Some(glyph) = font.outline_glyphs().get(gid) else {
            return Ok(GlyphRaster::inkless(advance));
        };

        // First pass: ink bounds in y-up pixel coordinates.
        let mut bounds_pen = BoundsPen::new();
        glyph
            .draw(DrawSettings::unhinted(size_obj, location), &mut bounds_pen)
            .map_err(|e| Error::GlyphRender(format!("bounds for {:?}: {:?}", ch, e)))?;
        let Some(bounds) = bounds_pen.bounds() else {
            return Ok(GlyphRaster::inkless(advance));
        };

        let ink_left = bounds.x_min.floor();
        let ink_w = (bounds.x_max.ceil() - ink_left).max(1.0) as u32;
        let ink_h = (bounds.y_max.ceil() - bounds.y_min.floor()).max(1.0) as u32;

        // Second pass: collect the outline in y-down raster coordinates
        // and render the coverage mask.
        let mut commands = Vec::new();
        let mut pen = ZenoPen::new(&mut commands);
        glyph
            .draw(DrawSettings::unhinted(size_obj, location), &mut pen)
            .map_err(|e| Error::GlyphRender(format!("outline for {:?}: {:?}", ch, e)))?;

        let transform = Transform::translation(-ink_left, bounds.y_max.ceil());
        let (mask_data, _placement) = Mask::new(commands.as_slice())
            .transform(Some(transform))
            .size(ink_w, ink_h)
            .render();

        // Cell anchored at the ascender, as text origins are.
        let ascent = font.metrics(size_obj, location).ascent;
        let cell_w = bounds.x_max.ceil().max(1.0) as u32;
        let cell_h = (ascent - bounds.y_min).ceil().max(1.0) as u32;
        let ink_x = ink_left.max(0.0) as u32;
        let ink_y = (ascent - bounds.y_max).round().max(0.0) as u32;

        let mut mask = GrayImage::new(cell_w, cell_h);
        for y in 0..ink_h {
            let dst_y = ink_y + y;
            if dst_y >= cell_h {
                break;
            }
            for x in 0..ink_w {
                let dst_x = ink_x + x;
                if dst_x >= cell_w {
                    break;
                }
                let coverage = mask_data[(y * ink_w + x) as usize];
                mask.put_pixel(dst_x, dst_y, image::Luma([coverage]));
            }
        }

        Ok(GlyphRaster {
            mask,
            cell_w,
            cell_h,
            advance,
        })
    }

    /// Box glyph for the built-in fallback: a filled rectangle roughly
    /// where the ink of a real glyph would sit.
    fn raster_fallback(&self, ch: char, size: f32) -> GlyphRaster {
        let advance = size * FALLBACK_ADVANCE_EM;
        if ch.is_whitespace() {
            return GlyphRaster::inkless(advance);
        }

        let cell_w = ((size * 0.55).ceil() as u32).max(1);
        let cell_h = ((size * FALLBACK_ASCENT_EM).ceil() as u32).max(1);
        let x0 = (size * 0.05) as u32;
        let y0 = (size * 0.1) as u32;

        let mut mask = GrayImage::new(cell_w, cell_h);
        for y in y0..cell_h {
            for x in x0..cell_w {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }

        GlyphRaster {
            mask,
            cell_w,
            cell_h,
            advance,
        }
    }
}

impl TextMeasure for FontStore {
    fn line_width(&self, text: &str, size: f32) -> Result<f32> {
        Ok(text.chars().map(|ch| self.advance(ch, size)).sum())
    }
}

/// Ink bounds accumulated from outline commands, y-up.
#[derive(Debug, Clone, Copy)]
struct InkBounds {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

/// Pen for calculating the ink bounding box
struct BoundsPen {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
    has_points: bool,
}

impl BoundsPen {
    fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
            has_points: false,
        }
    }

    fn bounds(&self) -> Option<InkBounds> {
        if !self.has_points || self.min_x >= self.max_x || self.min_y >= self.max_y {
            return None;
        }
        Some(InkBounds {
            x_min: self.min_x,
            y_min: self.min_y,
            x_max: self.max_x,
            y_max: self.max_y,
        })
    }

    fn update_bounds(&mut self, x: f32, y: f32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.has_points = true;
    }
}

impl OutlinePen for BoundsPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.update_bounds(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.update_bounds(x, y);
    }

    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.update_bounds(cx, cy);
        self.update_bounds(x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.update_bounds(cx0, cy0);
        self.update_bounds(cx1, cy1);
        self.update_bounds(x, y);
    }

    fn close(&mut self) {}
}

/// Adapter to convert skrifa OutlinePen callbacks into zeno commands.
struct ZenoPen<'a> {
    commands: &'a mut Vec<Command>,
}

impl<'a> ZenoPen<'a> {
    fn new(commands: &'a mut Vec<Command>) -> Self {
        Self { commands }
    }
}

impl<'a> OutlinePen for ZenoPen<'a> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(Command::MoveTo([x, -y].into())); // Flip Y for raster coordinates
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(Command::LineTo([x, -y].into()));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.commands
            .push(Command::QuadTo([cx0, -cy0].into(), [x, -y].into()));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.commands.push(Command::CurveTo(
            [cx0, -cy0].into(),
            [cx1, -cy1].into(),
            [x, -y].into(),
        ));
    }

    fn close(&mut self) {
        self.commands.push(Command::Close);
    }
}
