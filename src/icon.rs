//! Bitmap types shared by the rasterizer, the registry and the library.
//!
//! Menu-bar images are sized in points and rasterized at a pixel scale, so
//! an [`IconImage`] carries both its pixel data and its logical size.

use image::RgbaImage;

/// Default pixel scale used for previews (@2x).
pub const DEFAULT_SCALE: f32 = 2.0;

/// Height of the menu bar in points, used as the canvas height for previews.
pub const MENU_BAR_HEIGHT: f32 = 22.0;

/// Largest pixel dimension a canvas is rasterized at.
pub const MAX_PIXEL_DIMENSION: u32 = 4096;

/// A 2D size in point units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizePt {
    pub width: f32,
    pub height: f32,
}

impl SizePt {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the pixel dimensions at the given scale, rounded up and
    /// clamped to `1..=MAX_PIXEL_DIMENSION`.
    pub fn to_pixels(&self, scale: f32) -> (u32, u32) {
        let px = |v: f32| ((v * scale).ceil() as u32).clamp(1, MAX_PIXEL_DIMENSION);
        (px(self.width), px(self.height))
    }
}

/// A single rendered or decoded icon.
#[derive(Debug, Clone, PartialEq)]
pub struct IconImage {
    /// The image data in RGBA format (straight alpha).
    pub data: RgbaImage,

    /// The display scale factor (1.0 for @1x, 2.0 for @2x).
    pub scale: f32,

    /// The logical size of the icon in points.
    pub size: SizePt,

    /// Whether the consumer should tint this image with the system
    /// foreground color instead of drawing its literal colors.
    pub template: bool,
}

impl IconImage {
    /// Creates a new icon image with the given data and metadata.
    pub fn new(data: RgbaImage, scale: f32, size: SizePt, template: bool) -> Self {
        Self {
            data,
            scale,
            size,
            template,
        }
    }

    /// Wraps a decoded bitmap so that it fits a bar of `height` points,
    /// keeping its aspect ratio.
    pub fn fitted_to_height(data: RgbaImage, height: f32) -> Self {
        let (w, h) = (data.width().max(1) as f32, data.height().max(1) as f32);
        let size = SizePt::new(height / h * w, height);
        let scale = h / height;
        Self::new(data, scale, size, false)
    }

    /// Returns the pixel dimensions of the image.
    pub fn pixel_dimensions(&self) -> (u32, u32) {
        (self.data.width(), self.data.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_to_pixels_rounds_up() {
        assert_eq!(SizePt::new(3.5, 22.0).to_pixels(2.0), (7, 44));
        assert_eq!(SizePt::new(3.25, 22.0).to_pixels(1.0), (4, 22));
        assert_eq!(SizePt::new(0.0, 0.0).to_pixels(2.0), (1, 1));
    }

    #[test]
    fn size_to_pixels_is_bounded() {
        let (w, h) = SizePt::new(1.0e9, 22.0).to_pixels(2.0);
        assert_eq!((w, h), (MAX_PIXEL_DIMENSION, 44));
        assert_eq!(SizePt::new(f32::INFINITY, f32::NAN).to_pixels(1.0), (MAX_PIXEL_DIMENSION, 1));
    }

    #[test]
    fn fitted_to_height_keeps_aspect() {
        let img = IconImage::fitted_to_height(RgbaImage::new(64, 32), 22.0);
        assert_eq!(img.size.height, 22.0);
        assert_eq!(img.size.width, 44.0);
        assert!((img.scale - 32.0 / 22.0).abs() < 1e-6);
        assert!(!img.template);
        assert_eq!(img.pixel_dimensions(), (64, 32));
    }
}
