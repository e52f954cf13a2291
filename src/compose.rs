// this_file: src/compose.rs
//! Layered alpha compositing.
//!
//! The poster accumulates layers onto one RGBA canvas: a rounded
//! translucent panel, per-glyph gradient cells, and the circular avatar
//! cutout. Blending follows the Porter-Duff "over" operator on straight
//! (non-premultiplied) alpha.

use image::{GrayImage, Rgba, RgbaImage};

/// Composite `src` over `dst` in place (Porter-Duff "over").
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src.0[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for i in 0..3 {
        let sc = src.0[i] as f32;
        let dc = dst.0[i] as f32;
        let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        dst.0[i] = out.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// True when (x, y) lies inside a rounded rectangle of `w` x `h` with
/// the given corner radius, in the rectangle's own coordinates.
fn inside_rounded_rect(x: u32, y: u32, w: u32, h: u32, radius: u32) -> bool {
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        return true;
    }
    // Corner circle centers; everything between them is plain rectangle.
    let (px, py) = (x as i64, y as i64);
    let (w, h, r) = (w as i64, h as i64, r as i64);
    let cx = if px < r {
        r - 1
    } else if px >= w - r {
        w - r
    } else {
        return true;
    };
    let cy = if py < r {
        r - 1
    } else if py >= h - r {
        h - r
    } else {
        return true;
    };
    let dx = px - cx;
    let dy = py - cy;
    dx * dx + dy * dy <= r * r
}

/// Draw a rounded translucent panel over the canvas.
///
/// The panel is built on a same-size transparent layer and composited
/// with "over", so canvas content outside the panel bounds is untouched
/// and content underneath shows through the panel's alpha.
pub fn overlay_panel(
    canvas: &mut RgbaImage,
    position: (i64, i64),
    box_w: u32,
    box_h: u32,
    radius: u32,
    color: Rgba<u8>,
) {
    let (canvas_w, canvas_h) = canvas.dimensions();
    let (x0, y0) = position;
    for py in 0..box_h {
        let cy = y0 + py as i64;
        if cy < 0 || cy >= canvas_h as i64 {
            continue;
        }
        for px in 0..box_w {
            let cx = x0 + px as i64;
            if cx < 0 || cx >= canvas_w as i64 {
                continue;
            }
            if inside_rounded_rect(px, py, box_w, box_h, radius) {
                blend_over(canvas.get_pixel_mut(cx as u32, cy as u32), color);
            }
        }
    }
}

/// Paste `layer` onto the canvas at `position`, stencilled by `mask`.
///
/// The mask is a per-pixel alpha channel: 0 leaves the canvas pixel
/// alone, 255 applies the layer pixel fully, intermediate values blend
/// proportionally. The layer's own alpha is scaled by the mask, so a
/// layer may also stencil itself.
pub fn paste_masked(canvas: &mut RgbaImage, layer: &RgbaImage, position: (i64, i64), mask: &GrayImage) {
    debug_assert_eq!(layer.dimensions(), mask.dimensions());
    let (canvas_w, canvas_h) = canvas.dimensions();
    let (x0, y0) = position;
    for (px, py, pixel) in layer.enumerate_pixels() {
        let cx = x0 + px as i64;
        let cy = y0 + py as i64;
        if cx < 0 || cy < 0 || cx >= canvas_w as i64 || cy >= canvas_h as i64 {
            continue;
        }
        let m = mask.get_pixel(px, py).0[0] as u16;
        if m == 0 {
            continue;
        }
        let alpha = (pixel.0[3] as u16 * m / 255) as u8;
        let src = Rgba([pixel.0[0], pixel.0[1], pixel.0[2], alpha]);
        blend_over(canvas.get_pixel_mut(cx as u32, cy as u32), src);
    }
}

/// Paste an RGBA layer onto the canvas using the layer's own alpha as
/// the stencil (the self-masked paste used for gradient glyph cells).
pub fn paste_over(canvas: &mut RgbaImage, layer: &RgbaImage, position: (i64, i64)) {
    let (canvas_w, canvas_h) = canvas.dimensions();
    let (x0, y0) = position;
    for (px, py, pixel) in layer.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        let cx = x0 + px as i64;
        let cy = y0 + py as i64;
        if cx < 0 || cy < 0 || cx >= canvas_w as i64 || cy >= canvas_h as i64 {
            continue;
        }
        blend_over(canvas.get_pixel_mut(cx as u32, cy as u32), *pixel);
    }
}

/// Blend a flat color onto the canvas through a coverage mask.
///
/// Used by the solid text path: the mask is a glyph's rasterized
/// coverage and the color is the text fill.
pub fn blend_mask(canvas: &mut RgbaImage, mask: &GrayImage, position: (i64, i64), color: Rgba<u8>) {
    let (canvas_w, canvas_h) = canvas.dimensions();
    let (x0, y0) = position;
    for (px, py, m) in mask.enumerate_pixels() {
        let coverage = m.0[0] as u16;
        if coverage == 0 {
            continue;
        }
        let cx = x0 + px as i64;
        let cy = y0 + py as i64;
        if cx < 0 || cy < 0 || cx >= canvas_w as i64 || cy >= canvas_h as i64 {
            continue;
        }
        let alpha = (color.0[3] as u16 * coverage / 255) as u8;
        let src = Rgba([color.0[0], color.0[1], color.0[2], alpha]);
        blend_over(canvas.get_pixel_mut(cx as u32, cy as u32), src);
    }
}

/// Hard-edged circular mask inscribed in a `w` x `h` box: 255 inside
/// the ellipse, 0 outside.
pub fn circle_mask(w: u32, h: u32) -> GrayImage {
    let mut mask = GrayImage::new(w, h);
    let rx = w as f64 / 2.0;
    let ry = h as f64 / 2.0;
    for (x, y, pixel) in mask.enumerate_pixels_mut() {
        let dx = (x as f64 + 0.5 - rx) / rx;
        let dy = (y as f64 + 0.5 - ry) / ry;
        if dx * dx + dy * dy <= 1.0 {
            *pixel = image::Luma([255]);
        }
    }
    mask
}
