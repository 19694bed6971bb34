//! Drawing surfaces.
//!
//! Patterns paint through [`Canvas`] only, so the raster preview, SVG
//! export and PDF output all walk the same cells in the same order.

mod display_list;
mod raster;
mod svg;

pub use display_list::{DisplayList, DrawOp};
pub use raster::RasterCanvas;
pub use svg::SvgCanvas;

use crate::geometry::Rect;

/// Opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    /// Footer text.
    pub const GRAY: Color = Color::rgb(0x88, 0x88, 0x88);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }

    /// `#rrggbb`
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// A 2D surface in page units.
///
/// Text is positioned by its baseline.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Outline `rect`; the stroke is centred on the edge.
    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color);

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: Color);

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Color);

    fn fill_text(
        &mut self,
        text: &str,
        at: (f64, f64),
        size: f64,
        anchor: TextAnchor,
        color: Color,
    );
}

impl<C: Canvas + ?Sized> Canvas for &mut C {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        (**self).fill_rect(rect, color)
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color) {
        (**self).stroke_rect(rect, line_width, color)
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: Color) {
        (**self).stroke_line(from, to, line_width, color)
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Color) {
        (**self).fill_circle(cx, cy, r, color)
    }

    fn fill_text(
        &mut self,
        text: &str,
        at: (f64, f64),
        size: f64,
        anchor: TextAnchor,
        color: Color,
    ) {
        (**self).fill_text(text, at, size, anchor, color)
    }
}
