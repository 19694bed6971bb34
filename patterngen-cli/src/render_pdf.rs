//! PDF output: a [`Canvas`] that paints onto a printpdf layer.

use anyhow::{Context, Result};
use patterngen::canvas::{Canvas, Color as PaintColor, TextAnchor};
use patterngen::geometry::{Page, Rect as Area, Unit};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;
use std::path::Path;

/// Millimetres per CSS pixel, used when a pixel page is exported as PDF.
const MM_PER_PX: f64 = 25.4 / 96.0;
const PT_PER_MM: f64 = 72.0 / 25.4;
/// Courier advance width as a fraction of the font size.
const COURIER_ADVANCE: f64 = 0.6;

struct PdfCanvas {
    layer: PdfLayerReference,
    font: IndirectFontRef,
    mm_per_unit: f64,
    page_height_mm: f64,
}

impl PdfCanvas {
    fn mm(&self, v: f64) -> Mm {
        Mm((v * self.mm_per_unit) as f32)
    }

    /// PDF y runs bottom-up.
    fn y(&self, v: f64) -> Mm {
        Mm((self.page_height_mm - v * self.mm_per_unit) as f32)
    }

    fn point(&self, x: f64, y: f64) -> Point {
        Point::new(self.mm(x), self.y(y))
    }

    fn set_color(&self, color: PaintColor) {
        let c = Color::Rgb(Rgb::new(
            color.r as f32 / 255.0,
            color.g as f32 / 255.0,
            color.b as f32 / 255.0,
            None,
        ));
        self.layer.set_fill_color(c.clone());
        self.layer.set_outline_color(c);
    }
}

impl Canvas for PdfCanvas {
    fn fill_rect(&mut self, rect: Area, color: PaintColor) {
        self.set_color(color);
        self.layer.add_rect(Rect::new(
            self.mm(rect.x),
            self.y(rect.bottom()),
            self.mm(rect.right()),
            self.y(rect.y),
        ));
    }

    fn stroke_rect(&mut self, rect: Area, line_width: f64, color: PaintColor) {
        let h = line_width / 2.0;
        let outer = rect.inset(-h);
        self.fill_rect(Area::new(outer.x, outer.y, outer.w, line_width), color);
        self.fill_rect(Area::new(outer.x, rect.bottom() - h, outer.w, line_width), color);
        self.fill_rect(Area::new(outer.x, outer.y, line_width, outer.h), color);
        self.fill_rect(Area::new(rect.right() - h, outer.y, line_width, outer.h), color);
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: PaintColor) {
        self.set_color(color);
        self.layer
            .set_outline_thickness((line_width * self.mm_per_unit * PT_PER_MM) as f32);
        self.layer.add_line(Line {
            points: vec![
                (self.point(from.0, from.1), false),
                (self.point(to.0, to.1), false),
            ],
            is_closed: false,
        });
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: PaintColor) {
        self.set_color(color);
        let ring = calculate_points_for_circle(self.mm(r), self.mm(cx), self.y(cy));
        self.layer.add_polygon(Polygon {
            rings: vec![ring],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn fill_text(
        &mut self,
        text: &str,
        at: (f64, f64),
        size: f64,
        anchor: TextAnchor,
        color: PaintColor,
    ) {
        let width = text.chars().count() as f64 * size * COURIER_ADVANCE;
        let x = match anchor {
            TextAnchor::Start => at.0,
            TextAnchor::Middle => at.0 - width / 2.0,
            TextAnchor::End => at.0 - width,
        };
        self.set_color(color);
        self.layer.use_text(
            text,
            (size * self.mm_per_unit * PT_PER_MM) as f32,
            self.mm(x),
            self.y(at.1),
            &self.font,
        );
    }
}

/// Paint `page` with `draw` into a single-page PDF at `path`.
pub fn write_pdf<T>(
    page: &Page,
    title: &str,
    path: &Path,
    draw: impl FnOnce(&mut dyn Canvas) -> T,
) -> Result<T> {
    let mm_per_unit = match page.unit {
        Unit::Mm => 1.0,
        Unit::Px => MM_PER_PX,
    };
    let (w, h) = (page.width * mm_per_unit, page.height * mm_per_unit);
    let (doc, page1, layer1) = PdfDocument::new(title, Mm(w as f32), Mm(h as f32), "Pattern");
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .context("loading built-in Courier font")?;
    let mut canvas = PdfCanvas {
        layer: doc.get_page(page1).get_layer(layer1),
        font,
        mm_per_unit,
        page_height_mm: h,
    };
    let out = draw(&mut canvas);

    doc.save(&mut std::io::BufWriter::new(
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
    ))
    .with_context(|| format!("writing PDF to {}", path.display()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        write_pdf(&Page::a4(), "test", &path, |c| {
            c.fill_rect(Area::new(10.0, 10.0, 20.0, 20.0), PaintColor::BLACK);
            c.fill_circle(50.0, 50.0, 5.0, PaintColor::BLACK);
            c.fill_text("ID 3", (100.0, 100.0), 4.0, TextAnchor::Middle, PaintColor::RED);
        })
        .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
