use serde::{Deserialize, Serialize};

use super::{is_dark, num, RenderReport, SquareColor};
use crate::canvas::{Canvas, Color};
use crate::geometry::{CellGeometry, Page, Rect, Unit};

/// Plain checkerboard, optionally overlaid with grid lines and dots at the
/// inner corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerSpec {
    /// Inner corners down; the board has one more square.
    pub inner_rows: usize,
    /// Inner corners across.
    pub inner_cols: usize,
    pub top_left: SquareColor,
    pub squares: bool,
    pub grid_lines: bool,
    pub dots: bool,
    /// Dot radius as a fraction of the square side.
    pub dot_radius: f64,
    /// Grid line width; 2 px on pixel pages and 0.5 mm on print pages by default.
    pub line_width: Option<f64>,
    pub square_size: Option<f64>,
}

impl Default for CheckerSpec {
    fn default() -> Self {
        Self {
            inner_rows: 6,
            inner_cols: 9,
            top_left: SquareColor::Black,
            squares: true,
            grid_lines: false,
            dots: false,
            dot_radius: 0.1,
            line_width: None,
            square_size: None,
        }
    }
}

impl CheckerSpec {
    pub fn normalized(&self) -> Self {
        Self {
            inner_rows: self.inner_rows.max(1),
            inner_cols: self.inner_cols.max(1),
            dot_radius: if self.dot_radius.is_finite() && self.dot_radius > 0.0 {
                self.dot_radius
            } else {
                0.1
            },
            line_width: self.line_width.filter(|w| w.is_finite() && *w > 0.0),
            square_size: self.square_size.filter(|s| s.is_finite() && *s > 0.0),
            ..self.clone()
        }
    }

    pub fn rows(&self) -> usize {
        self.inner_rows + 1
    }

    pub fn cols(&self) -> usize {
        self.inner_cols + 1
    }

    pub fn geometry(&self, area: Rect, snap: bool) -> CellGeometry {
        match self.square_size {
            Some(cell) => CellGeometry::with_cell(area, self.rows(), self.cols(), cell),
            None => CellGeometry::fit(area, self.rows(), self.cols(), snap),
        }
    }

    pub(super) fn summary(&self) -> String {
        let mut layers = Vec::new();
        if self.squares {
            layers.push("squares");
        }
        if self.grid_lines {
            layers.push("lines");
        }
        if self.dots {
            layers.push("dots");
        }
        [
            "Pattern: checker".to_string(),
            format!("Inner: {}x{}", self.inner_rows, self.inner_cols),
            format!("Top-left: {}", self.top_left),
            format!("Layers: {}", layers.join("+")),
            format!("Dot: {}", num(self.dot_radius)),
        ]
        .join(" | ")
    }
}

/// Paint the enabled layers. `spec` must already be normalized.
pub(super) fn draw<C: Canvas + ?Sized>(
    spec: &CheckerSpec,
    area: Rect,
    page: &Page,
    canvas: &mut C,
) -> RenderReport {
    let g = spec.geometry(area, page.snaps());

    if spec.squares {
        for i in 0..g.rows {
            for j in 0..g.cols {
                let color = if is_dark(i, j, spec.top_left) {
                    Color::BLACK
                } else {
                    Color::WHITE
                };
                canvas.fill_rect(g.square(i, j), color);
            }
        }
    }

    if spec.grid_lines {
        let width = spec.line_width.unwrap_or(match page.unit {
            Unit::Px => 2.0,
            Unit::Mm => 0.5,
        });
        let (x0, y0) = (g.ox, g.oy);
        let (x1, y1) = (g.ox + g.grid_w(), g.oy + g.grid_h());
        for j in 1..g.cols {
            let (x, _) = g.corner(0, j);
            canvas.stroke_line((x, y0), (x, y1), width, Color::BLACK);
        }
        for i in 1..g.rows {
            let (_, y) = g.corner(i, 0);
            canvas.stroke_line((x0, y), (x1, y), width, Color::BLACK);
        }
    }

    if spec.dots {
        let r = spec.dot_radius * g.cell;
        for i in 1..=spec.inner_rows {
            for j in 1..=spec.inner_cols {
                let (cx, cy) = g.corner(i, j);
                canvas.fill_circle(cx, cy, r, Color::BLACK);
            }
        }
    }

    RenderReport::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawOp};

    fn only(layer: &str) -> CheckerSpec {
        CheckerSpec {
            inner_rows: 2,
            inner_cols: 3,
            squares: layer == "squares",
            grid_lines: layer == "lines",
            dots: layer == "dots",
            ..CheckerSpec::default()
        }
    }

    #[test]
    fn squares_layer_alternates() {
        let mut dl = DisplayList::new();
        let page = Page::canvas(400, 300);
        draw(&only("squares"), page.inner(), &page, &mut dl);
        assert_eq!(dl.len(), 12);
        assert_eq!(dl.filled(Color::BLACK).len(), 6);
        assert_eq!(dl.filled(Color::BLACK)[0], Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn interior_grid_lines_only() {
        let mut dl = DisplayList::new();
        let page = Page::canvas(400, 300);
        draw(&only("lines"), page.inner(), &page, &mut dl);
        // 3 vertical + 2 horizontal
        assert_eq!(dl.len(), 5);
        assert_eq!(
            dl.ops[0],
            DrawOp::Line {
                from: (100.0, 0.0),
                to: (100.0, 300.0),
                line_width: 2.0,
                color: Color::BLACK
            }
        );
    }

    #[test]
    fn dots_at_inner_corners() {
        let mut dl = DisplayList::new();
        let page = Page::canvas(400, 300);
        draw(&only("dots"), page.inner(), &page, &mut dl);
        assert_eq!(dl.len(), 6);
        assert_eq!(
            dl.ops[0],
            DrawOp::Circle {
                cx: 100.0,
                cy: 100.0,
                r: 10.0,
                color: Color::BLACK
            }
        );
    }

    #[test]
    fn summary_lists_layers() {
        let s = CheckerSpec {
            dots: true,
            ..CheckerSpec::default()
        };
        assert_eq!(
            s.summary(),
            "Pattern: checker | Inner: 6x9 | Top-left: black | Layers: squares+dots | Dot: 0.1"
        );
    }
}
