// this_file: src/gradient.rs
//! Gradient-filled glyph cells.
//!
//! A gradient glyph is built in two layers: a horizontal multi-stop
//! color ramp spanning the cell, and the glyph's own coverage mask
//! applied as the alpha channel so color only shows through the ink.

use crate::error::{Error, Result};
use crate::font::FontStore;
use image::{GrayImage, Rgb, Rgba, RgbaImage};
use rand::Rng;

/// Number of stops drawn for each glyph.
const STOPS_PER_GLYPH: usize = 4;

/// Sample gradient stops with replacement from the palette.
///
/// Consecutive duplicate stops are allowed; they just produce a flat
/// sub-segment of the ramp.
pub fn random_stops(palette: &[Rgb<u8>], rng: &mut impl Rng) -> Vec<Rgb<u8>> {
    (0..STOPS_PER_GLYPH)
        .map(|_| palette[rng.gen_range(0..palette.len())])
        .collect()
}

/// Fill a cell-sized buffer with the horizontal ramp defined by `stops`.
fn fill_ramp(cell: &mut RgbaImage, stops: &[Rgb<u8>]) {
    let (w, h) = cell.dimensions();
    let segments = stops.len() - 1;
    let segment_width = w as f32 / segments as f32;
    for i in 0..segments {
        let start = stops[i].0;
        let end = stops[i + 1].0;
        let x0 = (i as f32 * segment_width) as u32;
        let x1 = (((i + 1) as f32 * segment_width) as u32).min(w);
        for x in x0..x1 {
            let factor = (x - x0) as f32 / segment_width;
            let mut column = [0u8; 3];
            for c in 0..3 {
                let v = start[c] as f32 + (end[c] as f32 - start[c] as f32) * factor;
                column[c] = v as u8;
            }
            for y in 0..h {
                cell.put_pixel(x, y, Rgba([column[0], column[1], column[2], 255]));
            }
        }
    }
}

/// Clip `cell` to the coverage mask by moving it into the alpha channel.
fn apply_mask(cell: &mut RgbaImage, mask: &GrayImage) {
    for (x, y, pixel) in cell.enumerate_pixels_mut() {
        pixel.0[3] = mask.get_pixel(x, y).0[0];
    }
}

/// Render one character as a gradient-filled RGBA cell.
///
/// Fewer than two stops is a configuration error. Inkless characters
/// produce an empty (0x0) cell; the caller advances the cursor by the
/// character's metric advance instead.
pub fn render_gradient_glyph(
    font: &FontStore,
    ch: char,
    size: f32,
    stops: &[Rgb<u8>],
) -> Result<RgbaImage> {
    if stops.len() < 2 {
        return Err(Error::Configuration(format!(
            "gradient needs at least 2 color stops, got {}",
            stops.len()
        )));
    }

    let raster = font.raster(ch, size)?;
    if raster.is_inkless() {
        return Ok(RgbaImage::new(0, 0));
    }

    let mut cell = RgbaImage::new(raster.cell_w, raster.cell_h);
    fill_ramp(&mut cell, stops);
    apply_mask(&mut cell, &raster.mask);
    Ok(cell)
}

/// Degraded cell used when gradient rendering fails: the character once
/// in flat white on a transparent cell, so a bad glyph never aborts the
/// poster.
pub fn flat_fallback_cell(font: &FontStore, ch: char, size: f32) -> RgbaImage {
    match font.raster(ch, size) {
        Ok(raster) if !raster.is_inkless() => {
            let mut cell = RgbaImage::from_pixel(
                raster.cell_w,
                raster.cell_h,
                Rgba([255, 255, 255, 255]),
            );
            apply_mask(&mut cell, &raster.mask);
            cell
        }
        // Even the mask failed: a transparent advance-sized cell keeps
        // layout moving without drawing garbage.
        _ => {
            let w = font.advance(ch, size).round().max(1.0) as u32;
            let h = font.ascent(size).ceil().max(1.0) as u32;
            RgbaImage::new(w, h)
        }
    }
}
