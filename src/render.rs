//! Programmatic rendering of the built-in line and dot separators.
//!
//! Both renderers are pure: the same style, canvas height and scale always
//! produce a pixel-identical [`IconImage`]. Geometry is computed in points
//! and filled with anti-aliasing at the requested pixel scale.
//!
//! When no color is given, shapes are drawn in [`IconColor::label`] and the
//! image is flagged as a template so the consumer can tint it to match the
//! system appearance.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Transform};

use crate::color::IconColor;
use crate::icon::{IconImage, MAX_PIXEL_DIMENSION, SizePt};

/// Cubic Bézier control distance for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_8;

// ============================================================================
// Styles
// ============================================================================

/// Parameters for the vertical line separator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// Width of the bar in points.
    pub thickness: f32,
    /// Length of the bar in points, or `None` for canvas height minus 6.
    pub height: Option<f32>,
    /// Literal color, or `None` for template rendering.
    pub color: Option<IconColor>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            thickness: 1.0,
            height: None,
            color: None,
        }
    }
}

impl LineStyle {
    /// Canvas width for this style: `max(thickness + 2, 4)`.
    pub fn canvas_width(&self) -> f32 {
        (self.thickness + 2.0).max(4.0)
    }
}

/// Parameters for the dot separator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotStyle {
    /// Diameter of the dot in points.
    pub diameter: f32,
    /// Literal color, or `None` for template rendering.
    pub color: Option<IconColor>,
}

impl Default for DotStyle {
    fn default() -> Self {
        Self {
            diameter: 4.0,
            color: None,
        }
    }
}

impl DotStyle {
    /// Canvas width for this style: `max(diameter + 2, 6)`.
    pub fn canvas_width(&self) -> f32 {
        (self.diameter + 2.0).max(6.0)
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Renders a rounded vertical bar centered in a `canvas_height`-tall canvas.
pub fn render_line(style: &LineStyle, canvas_height: f32, scale: f32) -> IconImage {
    let size = SizePt::new(style.canvas_width(), canvas_height);
    let thickness = style.thickness;
    let length = style
        .height
        .unwrap_or(canvas_height - 6.0)
        .min(canvas_height);
    let radius = (thickness / 2.0).min(1.0);

    let path = if thickness > 0.0 && length > 0.0 {
        Rect::from_xywh(
            (size.width - thickness) / 2.0,
            (size.height - length) / 2.0,
            thickness,
            length,
        )
        .and_then(|rect| rounded_rect_path(rect, radius))
    } else {
        None
    };

    rasterize(size, scale, path, style.color)
}

/// Renders a filled circle centered in a `canvas_height`-tall canvas.
pub fn render_dot(style: &DotStyle, canvas_height: f32, scale: f32) -> IconImage {
    let size = SizePt::new(style.canvas_width(), canvas_height);
    let path = if style.diameter > 0.0 {
        PathBuilder::from_circle(size.width / 2.0, size.height / 2.0, style.diameter / 2.0)
    } else {
        None
    };

    rasterize(size, scale, path, style.color)
}

/// Fills `path` (in points) onto a fresh canvas of `size`.
///
/// A missing path (degenerate geometry) yields a blank canvas. The pixel
/// size is bounded by [`MAX_PIXEL_DIMENSION`] on each side.
fn rasterize(size: SizePt, scale: f32, path: Option<Path>, color: Option<IconColor>) -> IconImage {
    let (width, height) = size.to_pixels(scale);
    let template = color.is_none();
    let (r, g, b, a) = color.unwrap_or_else(IconColor::label).components();

    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return IconImage::new(RgbaImage::new(1, 1), scale, size, template);
    };

    if let Some(path) = path {
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::from_scale(scale, scale),
            None,
        );
    }

    IconImage::new(pixmap_to_rgba_image(&pixmap), scale, size, template)
}

/// Builds a rectangle path with circular corners of `radius`.
fn rounded_rect_path(rect: Rect, radius: f32) -> Option<Path> {
    let radius = radius.min(rect.width() / 2.0).min(rect.height() / 2.0);
    if radius <= 0.0 {
        return Some(PathBuilder::from_rect(rect));
    }

    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let k = radius * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(l + radius, t);
    pb.line_to(r - radius, t);
    pb.cubic_to(r - radius + k, t, r, t + radius - k, r, t + radius);
    pb.line_to(r, b - radius);
    pb.cubic_to(r, b - radius + k, r - radius + k, b, r - radius, b);
    pb.line_to(l + radius, b);
    pb.cubic_to(l + radius - k, b, l, b - radius + k, l, b - radius);
    pb.line_to(l, t + radius);
    pb.cubic_to(l, t + radius - k, l + radius - k, t, l + radius, t);
    pb.close();
    pb.finish()
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    for (i, pixel) in pixmap.pixels().iter().enumerate() {
        let x = i as u32 % pixmap.width();
        let y = i as u32 / pixmap.width();
        // tiny_skia stores premultiplied alpha
        let straight = pixel.demultiply();
        img.put_pixel(
            x,
            y,
            Rgba([straight.red(), straight.green(), straight.blue(), straight.alpha()]),
        );
    }

    img
}

// ============================================================================
// Tests
// ============================================================================
