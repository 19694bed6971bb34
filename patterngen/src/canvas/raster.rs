use std::io::Write;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use log::trace;
use tiny_skia::{FillRule, LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::{Canvas, Color, TextAnchor};
use crate::geometry::{Page, Rect};

/// Rows per glyph; the baseline sits under row 6.
const GLYPH_ROWS: f64 = 8.0;
const GLYPH_ASCENT: f64 = 7.0;

/// Pixel surface backed by a `tiny_skia::Pixmap`.
///
/// Page units are multiplied by `scale`. Rectangles are snapped to whole
/// pixels and filled without anti-aliasing so adjacent cells tile without
/// seams; circles and diagonal lines are anti-aliased. Text uses the 8×8
/// bitmap glyphs from `font8x8`, scaled to the requested size.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    pixmap: Pixmap,
    scale: f64,
}

impl RasterCanvas {
    /// White canvas of `width`×`height` pixels, one pixel per page unit.
    /// `None` when either side is zero or the buffer would not fit.
    pub fn new(width: usize, height: usize) -> Option<Self> {
        Self::with_scale(width, height, 1.0)
    }

    pub fn with_scale(width: usize, height: usize, scale: f64) -> Option<Self> {
        let mut pixmap = Pixmap::new(u32::try_from(width).ok()?, u32::try_from(height).ok()?)?;
        pixmap.fill(tiny_skia::Color::WHITE);
        Some(Self { pixmap, scale })
    }

    /// Canvas covering `page` at `pixels_per_unit`.
    pub fn for_page(page: &Page, pixels_per_unit: f64) -> Option<Self> {
        let width = (page.width * pixels_per_unit).round().max(1.0) as usize;
        let height = (page.height * pixels_per_unit).round().max(1.0) as usize;
        Self::with_scale(width, height, pixels_per_unit)
    }

    pub fn width(&self) -> usize {
        self.pixmap.width() as usize
    }

    pub fn height(&self) -> usize {
        self.pixmap.height() as usize
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        let i = (y * self.width() + x) * 4;
        let data = self.pixmap.data();
        Color::rgb(data[i], data[i + 1], data[i + 2])
    }

    /// RGBA bytes, row-major, as `ImageData` expects. Every paint is opaque,
    /// so premultiplied and straight alpha agree.
    pub fn rgba(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap.data().to_vec()
    }

    /// Encode as an 8-bit RGBA PNG.
    pub fn write_png<W: Write>(&self, w: W) -> Result<(), png::EncodingError> {
        let mut encoder = png::Encoder::new(w, self.pixmap.width(), self.pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(self.pixmap.data())?;
        writer.finish()
    }

    fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, 255);
        paint.anti_alias = anti_alias;
        paint
    }

    /// Fill the pixel-space box `[x0, x1) × [y0, y1)` with edges rounded to
    /// whole pixels.
    fn fill_pixels(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color) {
        let (w, h) = (self.pixmap.width() as f64, self.pixmap.height() as f64);
        let l = x0.min(x1).round().clamp(0.0, w);
        let r = x0.max(x1).round().clamp(0.0, w);
        let t = y0.min(y1).round().clamp(0.0, h);
        let b = y0.max(y1).round().clamp(0.0, h);
        if let Some(rect) = tiny_skia::Rect::from_ltrb(l as f32, t as f32, r as f32, b as f32) {
            self.pixmap
                .fill_rect(rect, &Self::paint(color, false), Transform::identity(), None);
        }
    }
}

impl Canvas for RasterCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let s = self.scale;
        self.fill_pixels(rect.x * s, rect.y * s, rect.right() * s, rect.bottom() * s, color);
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color) {
        let h = line_width / 2.0;
        let outer = rect.inset(-h);
        self.fill_rect(Rect::new(outer.x, outer.y, outer.w, line_width), color);
        self.fill_rect(Rect::new(outer.x, rect.bottom() - h, outer.w, line_width), color);
        self.fill_rect(Rect::new(outer.x, outer.y, line_width, outer.h), color);
        self.fill_rect(Rect::new(rect.right() - h, outer.y, line_width, outer.h), color);
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: Color) {
        let h = line_width / 2.0;
        // Grid lines stay crisp.
        if from.0 == to.0 {
            let r = Rect::new(from.0 - h, from.1.min(to.1), line_width, (to.1 - from.1).abs());
            return self.fill_rect(r, color);
        }
        if from.1 == to.1 {
            let r = Rect::new(from.0.min(to.0), from.1 - h, (to.0 - from.0).abs(), line_width);
            return self.fill_rect(r, color);
        }
        let s = self.scale as f32;
        let mut pb = PathBuilder::new();
        pb.move_to(from.0 as f32 * s, from.1 as f32 * s);
        pb.line_to(to.0 as f32 * s, to.1 as f32 * s);
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width: line_width as f32 * s,
            line_cap: LineCap::Butt,
            ..Default::default()
        };
        self.pixmap.stroke_path(
            &path,
            &Self::paint(color, true),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Color) {
        let s = self.scale;
        let Some(path) = PathBuilder::from_circle((cx * s) as f32, (cy * s) as f32, (r * s) as f32)
        else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &Self::paint(color, true),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn fill_text(&mut self, text: &str, at: (f64, f64), size: f64, anchor: TextAnchor, color: Color) {
        let dot = size * self.scale / GLYPH_ROWS;
        if dot <= 0.0 {
            return;
        }
        let advance = GLYPH_ROWS * dot;
        let width = text.chars().count() as f64 * advance;
        let left = at.0 * self.scale
            - match anchor {
                TextAnchor::Start => 0.0,
                TextAnchor::Middle => width / 2.0,
                TextAnchor::End => width,
            };
        let top = at.1 * self.scale - GLYPH_ASCENT * dot;

        for (i, ch) in text.chars().enumerate() {
            let Some(glyph) = BASIC_FONTS.get(ch) else {
                trace!("no glyph for {ch:?}, leaving a gap");
                continue;
            };
            let gx = left + i as f64 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                let y = top + row as f64 * dot;
                for col in 0..8 {
                    if bits & (1 << col) != 0 {
                        let x = gx + col as f64 * dot;
                        self.fill_pixels(x, y, x + dot, y + dot, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(c: &RasterCanvas, color: Color, x: std::ops::Range<usize>, y: std::ops::Range<usize>) -> usize {
        y.flat_map(|py| x.clone().map(move |px| (px, py)))
            .filter(|&(px, py)| c.pixel(px, py) == color)
            .count()
    }

    #[test]
    fn rect_edges_round_to_pixels() {
        let mut c = RasterCanvas::new(10, 10).unwrap();
        c.fill_rect(Rect::new(1.4, 1.6, 2.2, 2.0), Color::BLACK);
        // x: 1.4..3.6 -> 1..4, y: 1.6..3.6 -> 2..4
        assert_eq!(c.pixel(1, 2), Color::BLACK);
        assert_eq!(c.pixel(3, 3), Color::BLACK);
        assert_eq!(c.pixel(4, 3), Color::WHITE);
        assert_eq!(c.pixel(1, 1), Color::WHITE);
    }

    #[test]
    fn out_of_bounds_is_clipped() {
        let mut c = RasterCanvas::new(4, 4).unwrap();
        c.fill_rect(Rect::new(-5.0, -5.0, 100.0, 100.0), Color::RED);
        assert!((0..4).all(|i| c.pixel(i, i) == Color::RED));
        c.fill_circle(100.0, 100.0, 3.0, Color::BLACK);
        assert_eq!(count(&c, Color::RED, 0..4, 0..4), 16);
    }

    #[test]
    fn empty_canvas_is_rejected() {
        assert!(RasterCanvas::new(0, 10).is_none());
    }

    #[test]
    fn scale_maps_units_to_pixels() {
        let mut c = RasterCanvas::for_page(&Page::canvas(10, 10).with_margin(0.0), 2.0).unwrap();
        assert_eq!((c.width(), c.height()), (20, 20));
        c.fill_rect(Rect::new(5.0, 5.0, 1.0, 1.0), Color::BLACK);
        assert_eq!(c.pixel(10, 10), Color::BLACK);
        assert_eq!(c.pixel(11, 11), Color::BLACK);
        assert_eq!(c.pixel(12, 12), Color::WHITE);
    }

    #[test]
    fn circle_covers_centre_not_corners() {
        let mut c = RasterCanvas::new(20, 20).unwrap();
        c.fill_circle(10.0, 10.0, 4.0, Color::BLACK);
        assert_eq!(c.pixel(10, 10), Color::BLACK);
        assert_eq!(c.pixel(7, 10), Color::BLACK);
        assert_eq!(c.pixel(5, 5), Color::WHITE);
    }

    #[test]
    fn diagonal_line_is_painted() {
        let mut c = RasterCanvas::new(20, 20).unwrap();
        c.stroke_line((0.0, 0.0), (20.0, 20.0), 3.0, Color::BLACK);
        assert_eq!(c.pixel(10, 10), Color::BLACK);
        assert_eq!(c.pixel(18, 2), Color::WHITE);
    }

    #[test]
    fn text_is_rasterised_with_anchor() {
        let mut c = RasterCanvas::new(100, 40).unwrap();
        c.fill_text("ID", (50.0, 30.0), 16.0, TextAnchor::End, Color::RED);
        // two 16 px glyphs ending at x = 50, ascending 14 px above the baseline
        assert!(count(&c, Color::RED, 18..50, 16..30) > 0);
        assert_eq!(count(&c, Color::RED, 50..100, 0..40), 0);
        assert_eq!(count(&c, Color::RED, 0..18, 0..40), 0);
    }

    #[test]
    fn png_has_signature() {
        let mut c = RasterCanvas::new(3, 2).unwrap();
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        let mut out = Vec::new();
        c.write_png(&mut out).unwrap();
        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(c.to_rgba().len(), 3 * 2 * 4);
        assert_eq!(&c.rgba()[..4], &[0, 0, 0, 255]);
    }
}
