//! Heuristic detection of template-like (tintable) custom icons.
//!
//! An imported icon is considered template-like when it has transparency and
//! all of its visible pixels share a single hue. The check runs on a small
//! thumbnail so it stays cheap for large source images.

use image::{Rgba, RgbaImage, imageops};
use palette::Srgba;

/// Longest side of the thumbnail the heuristic samples.
pub const THUMBNAIL_SIZE: u32 = 16;

/// Tolerance when comparing color ratios of neighbouring pixels.
const RATIO_EPSILON: f32 = 1e-3;

/// Returns true if the icon should be tinted like a template image.
pub fn is_template_like(image: &RgbaImage) -> bool {
    let small = thumbnail(image);
    has_alpha_channel(&small) && color_data_equal(&small)
}

/// Shrinks `image` so that its longest side is at most [`THUMBNAIL_SIZE`].
pub fn thumbnail(image: &RgbaImage) -> RgbaImage {
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    if longest <= THUMBNAIL_SIZE {
        return image.clone();
    }
    let scale = THUMBNAIL_SIZE as f32 / longest as f32;
    let tw = ((w as f32 * scale).round() as u32).max(1);
    let th = ((h as f32 * scale).round() as u32).max(1);
    imageops::thumbnail(image, tw, th)
}

/// Returns true if any pixel is not fully opaque.
pub fn has_alpha_channel(image: &RgbaImage) -> bool {
    image.pixels().any(|p| p[3] != u8::MAX)
}

/// Returns true if adjacent pixels in every row share the same color ratio.
///
/// Pixels with a zero green or blue component carry no ratio and are
/// skipped.
pub fn color_data_equal(image: &RgbaImage) -> bool {
    for y in 0..image.height() {
        for x in 1..image.width() {
            let current = color_ratio(image.get_pixel(x, y));
            let previous = color_ratio(image.get_pixel(x - 1, y));
            if let (Some(a), Some(b)) = (current, previous) {
                if (a - b).abs() > RATIO_EPSILON {
                    return false;
                }
            }
        }
    }
    true
}

fn color_ratio(pixel: &Rgba<u8>) -> Option<f32> {
    let [r, g, b, a] = pixel.0;
    let c: Srgba<f32> = Srgba::new(r, g, b, a).into_format();
    if c.green == 0.0 || c.blue == 0.0 {
        return None;
    }
    Some((c.red / c.green + c.green / c.blue) / 2.0)
}
