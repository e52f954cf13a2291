// this_file: src/transform.rs
//! Geometric image transforms.
//!
//! The single operation here scales an arbitrary source photograph into
//! the poster's fixed portrait canvas: upscale when too small, downscale
//! when wastefully large, then center-crop to the exact target.

use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::debug;
use std::path::Path;

/// Load `path` and center-crop it to exactly `target_w` x `target_h`.
///
/// Sources smaller than the target in either dimension are upscaled
/// uniformly by the larger of the two ratios, so the canvas is always
/// covered without distortion. Sources exceeding `target * slack` in
/// either dimension are downscaled uniformly to bound memory and CPU;
/// anything within the slack band is cropped as-is.
pub fn crop_center(path: &Path, target_w: u32, target_h: u32, slack: f32) -> Result<RgbaImage> {
    let img = image::open(path)
        .map_err(|e| Error::ImageLoad(format!("{}: {}", path.display(), e)))?;
    let mut img = img.to_rgba8();
    let (src_w, src_h) = img.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(Error::ImageLoad(format!(
            "{}: zero-sized image",
            path.display()
        )));
    }

    if src_w < target_w || src_h < target_h {
        let scale = (target_w as f32 / src_w as f32).max(target_h as f32 / src_h as f32);
        let new_w = ((src_w as f32 * scale) as u32).max(target_w);
        let new_h = ((src_h as f32 * scale) as u32).max(target_h);
        debug!(
            "Upscaling background {}x{} -> {}x{}",
            src_w, src_h, new_w, new_h
        );
        img = imageops::resize(&img, new_w, new_h, FilterType::Lanczos3);
    } else if src_w as f32 > target_w as f32 * slack || src_h as f32 > target_h as f32 * slack {
        let scale = (target_w as f32 * slack / src_w as f32)
            .min(target_h as f32 * slack / src_h as f32);
        let new_w = ((src_w as f32 * scale) as u32).max(target_w);
        let new_h = ((src_h as f32 * scale) as u32).max(target_h);
        debug!(
            "Downscaling background {}x{} -> {}x{}",
            src_w, src_h, new_w, new_h
        );
        img = imageops::resize(&img, new_w, new_h, FilterType::Lanczos3);
    }

    // Symmetric margins, floored, so the crop is always exact.
    let (w, h) = img.dimensions();
    let left = (w - target_w) / 2;
    let top = (h - target_h) / 2;
    Ok(imageops::crop_imm(&img, left, top, target_w, target_h).to_image())
}
