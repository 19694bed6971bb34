use std::fmt::{self, Write};

use super::{Canvas, Color, TextAnchor};
use crate::geometry::{Page, Rect, Unit};

const FONT_FAMILY: &str = "Roboto Mono, monospace";

/// Number with at most four decimals and no trailing zeros.
struct Num(f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = format!("{:.4}", self.0);
        let s = if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.')
        } else {
            s.as_str()
        };
        f.write_str(if s == "-0" { "0" } else { s })
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// SVG document builder. Coordinates are page units; the root element
/// carries the physical size for millimetre pages.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    svg: String,
}

impl SvgCanvas {
    /// Start a document covering `page`, with a white background.
    pub fn new(page: &Page) -> Self {
        let mut svg = String::new();
        let (w, h) = (Num(page.width), Num(page.height));
        let _ = match page.unit {
            Unit::Mm => writeln!(
                svg,
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}">"#
            ),
            Unit::Px => writeln!(
                svg,
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
            ),
        };
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        SvgCanvas { svg }
    }

    /// Close the root element and return the markup.
    pub fn finish(mut self) -> String {
        self.svg.push_str("</svg>\n");
        self.svg
    }
}

impl Canvas for SvgCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let _ = writeln!(
            self.svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            Num(rect.x),
            Num(rect.y),
            Num(rect.w),
            Num(rect.h),
            color.hex()
        );
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color) {
        let _ = writeln!(
            self.svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            Num(rect.x),
            Num(rect.y),
            Num(rect.w),
            Num(rect.h),
            color.hex(),
            Num(line_width)
        );
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: Color) {
        let _ = writeln!(
            self.svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
            Num(from.0),
            Num(from.1),
            Num(to.0),
            Num(to.1),
            color.hex(),
            Num(line_width)
        );
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Color) {
        let _ = writeln!(
            self.svg,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
            Num(cx),
            Num(cy),
            Num(r),
            color.hex()
        );
    }

    fn fill_text(
        &mut self,
        text: &str,
        at: (f64, f64),
        size: f64,
        anchor: TextAnchor,
        color: Color,
    ) {
        let anchor = match anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        };
        let _ = writeln!(
            self.svg,
            r#"<text x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="{}" text-anchor="{anchor}" fill="{}">{}</text>"#,
            Num(at.0),
            Num(at.1),
            Num(size),
            color.hex(),
            escape(text)
        );
    }
}
