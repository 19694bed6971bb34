//! Calibration patterns and the single drawing pass shared by every surface.

mod aprilgrid;
mod charuco;
mod checker;

pub use aprilgrid::AprilGridSpec;
pub use charuco::CharucoSpec;
pub use checker::CheckerSpec;

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, Color, TextAnchor};
use crate::error::{MarkerError, ParseOptionError};
use crate::geometry::{Page, Rect, Unit};
use crate::marker::{draw_marker, draw_placeholder, MarkerFamily};
use crate::source::{AssetSource, MarkerRegistry};

/// Colour of a checkerboard square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SquareColor {
    #[default]
    Black,
    White,
}

impl SquareColor {
    pub fn name(self) -> &'static str {
        match self {
            SquareColor::Black => "black",
            SquareColor::White => "white",
        }
    }
}

impl fmt::Display for SquareColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SquareColor {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(SquareColor::Black),
            "white" => Ok(SquareColor::White),
            _ => Err(ParseOptionError {
                kind: "square colour",
                value: s.to_string(),
                expected: "black, white",
            }),
        }
    }
}

/// Whether square `(row, col)` is dark when the top-left square is `top_left`.
#[inline]
pub fn is_dark(row: usize, col: usize, top_left: SquareColor) -> bool {
    ((row + col) % 2 == 0) == (top_left == SquareColor::Black)
}

/// Which pattern to draw, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PatternConfig {
    Aprilgrid(AprilGridSpec),
    Charuco(CharucoSpec),
    Checker(CheckerSpec),
}

impl PatternConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            PatternConfig::Aprilgrid(_) => "aprilgrid",
            PatternConfig::Charuco(_) => "charuco",
            PatternConfig::Checker(_) => "checker",
        }
    }

    /// Copy with every numeric parameter clamped into its usable range.
    pub fn normalized(&self) -> PatternConfig {
        match self {
            PatternConfig::Aprilgrid(s) => PatternConfig::Aprilgrid(s.normalized()),
            PatternConfig::Charuco(s) => PatternConfig::Charuco(s.normalized()),
            PatternConfig::Checker(s) => PatternConfig::Checker(s.normalized()),
        }
    }

    /// One-line description printed in the page footer.
    pub fn summary(&self, unit: Unit) -> String {
        match self {
            PatternConfig::Aprilgrid(s) => s.normalized().summary(unit),
            PatternConfig::Charuco(s) => s.normalized().summary(),
            PatternConfig::Checker(s) => s.normalized().summary(),
        }
    }
}

/// Outcome of a render. Marker failures are reported here, never raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderReport {
    pub markers_drawn: usize,
    /// IDs drawn as placeholders because their bitmap could not be produced.
    pub placeholders: Vec<u64>,
    /// Set when markers came from the synthetic generator.
    pub fallback: bool,
    pub warnings: Vec<String>,
}

impl RenderReport {
    fn marker(&mut self) {
        self.markers_drawn += 1;
    }

    fn placeholder(&mut self, id: u64) {
        self.placeholders.push(id);
    }
}

/// Paint marker `id` into the square `area`, or a placeholder when the
/// family cannot produce it. Returns whether a marker was drawn.
///
/// IDs are counted in 64 bits so a run past `u32::MAX` ends in
/// placeholders rather than wrapping back to ID 0.
fn draw_id<F, C>(
    family: &F,
    id: u64,
    area: Rect,
    canvas: &mut C,
    report: &mut RenderReport,
) -> bool
where
    F: MarkerFamily + ?Sized,
    C: Canvas + ?Sized,
{
    let bitmap = match u32::try_from(id) {
        Ok(id) => family.render(id),
        Err(_) => Err(MarkerError::IdOverflow(id)),
    };
    match bitmap {
        Ok(bitmap) => {
            draw_marker(canvas, area.x, area.y, area.w.min(area.h), &bitmap);
            report.marker();
            true
        }
        Err(e) => {
            debug!("{}: {e}", family.name());
            draw_placeholder(canvas, area, id);
            report.placeholder(id);
            false
        }
    }
}

/// Draw `config` into the printable area of `page`.
pub fn render_pattern<S, C>(
    config: &PatternConfig,
    registry: &mut MarkerRegistry<S>,
    page: &Page,
    canvas: &mut C,
) -> RenderReport
where
    S: AssetSource,
    C: Canvas + ?Sized,
{
    let area = page.inner();
    let mut report = match config.normalized() {
        PatternConfig::Aprilgrid(spec) => {
            let family = registry.load_family(&spec.family);
            let mut report = aprilgrid::draw(&spec, &family, area, page.unit, canvas);
            report.fallback = family.is_fallback();
            report
        }
        PatternConfig::Charuco(spec) => {
            let family = registry.aruco_family(spec.dictionary);
            let mut report = charuco::draw(&spec, &family, area, page.snaps(), canvas);
            report.fallback = family.is_fallback();
            report
        }
        PatternConfig::Checker(spec) => checker::draw(&spec, area, page, canvas),
    };
    report.warnings = registry.take_warnings();
    for id in &report.placeholders {
        report.warnings.push(format!("marker ID {id} could not be rendered"));
    }
    debug!(
        "rendered {}: {} markers, {} placeholders",
        config.kind(),
        report.markers_drawn,
        report.placeholders.len()
    );
    report
}

const FOOTER_SIZE: f64 = 4.0;
const FOOTER_PAD: f64 = 6.0;

/// Caption on the left, `summary` on the right, inside the bottom margin
/// band. Pages without a margin get no footer.
pub fn draw_footer<C: Canvas + ?Sized>(
    canvas: &mut C,
    page: &Page,
    caption: Option<&str>,
    summary: &str,
) {
    if page.margin <= 0.0 {
        return;
    }
    let y = page.height - page.margin - FOOTER_PAD;
    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
        canvas.fill_text(
            caption,
            (page.margin + FOOTER_PAD, y),
            FOOTER_SIZE,
            TextAnchor::Start,
            Color::GRAY,
        );
    }
    canvas.fill_text(
        summary,
        (page.width - page.margin - FOOTER_PAD, y),
        FOOTER_SIZE,
        TextAnchor::End,
        Color::GRAY,
    );
}

/// Font size for an ID label under a marker of side `base`.
///
/// Pixel canvases keep labels legible between 8 and 16 px.
fn label_size(base: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Px => (base * 0.15).clamp(8.0, 16.0),
        Unit::Mm => (base * 0.15).max(1.0),
    }
}

/// Trim a float for display: `40`, `12.5`.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DisplayList;

    #[test]
    fn dark_squares_follow_top_left() {
        assert!(is_dark(0, 0, SquareColor::Black));
        assert!(!is_dark(0, 1, SquareColor::Black));
        assert!(is_dark(1, 1, SquareColor::Black));
        assert!(!is_dark(0, 0, SquareColor::White));
        assert!(is_dark(1, 0, SquareColor::White));
    }

    #[test]
    fn config_is_tagged_by_kind() {
        let cfg: PatternConfig = serde_json::from_str(r#"{"kind": "checker", "inner_rows": 3}"#).unwrap();
        match cfg {
            PatternConfig::Checker(c) => {
                assert_eq!(c.inner_rows, 3);
                assert_eq!(c.inner_cols, CheckerSpec::default().inner_cols);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn footer_only_with_margin() {
        let mut dl = DisplayList::new();
        draw_footer(&mut dl, &Page::canvas(100, 100), Some("x"), "y");
        assert!(dl.is_empty());

        draw_footer(&mut dl, &Page::a4(), Some("example.org"), "Pattern: checker");
        assert_eq!(dl.texts(), vec!["example.org", "Pattern: checker"]);
    }

    #[test]
    fn label_sizes() {
        assert_eq!(label_size(40.0, Unit::Mm), 6.0);
        assert_eq!(label_size(4.0, Unit::Mm), 1.0);
        assert_eq!(label_size(40.0, Unit::Px), 8.0);
        assert_eq!(label_size(200.0, Unit::Px), 16.0);
    }

    #[test]
    fn numbers_display_compactly() {
        assert_eq!(num(40.0), "40");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(1.0 / 3.0), "0.33");
    }
}
