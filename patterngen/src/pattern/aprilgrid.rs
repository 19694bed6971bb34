use serde::{Deserialize, Serialize};

use super::{draw_id, label_size, num, RenderReport};
use crate::canvas::{Canvas, Color, TextAnchor};
use crate::geometry::{GridGeometry, Rect, Unit};
use crate::marker::MarkerFamily;
use crate::traversal::{cell_order, Origin, Traversal};

/// A grid of AprilTags separated by `tag_size * spacing_ratio`, with small
/// black squares filling the gap intersections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AprilGridSpec {
    pub rows: usize,
    pub cols: usize,
    /// Family code, `36h11` or `tag36h11`.
    pub family: String,
    pub tag_size: f64,
    pub spacing_ratio: f64,
    pub start_id: u32,
    pub origin: Origin,
    pub traversal: Traversal,
    pub show_ids: bool,
    pub corner_squares: bool,
    /// Side of the intersection squares; defaults to the spacing.
    pub corner_square_size: Option<f64>,
}

impl Default for AprilGridSpec {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 4,
            family: "36h11".to_string(),
            tag_size: 30.0,
            spacing_ratio: 0.3,
            start_id: 0,
            origin: Origin::TopLeft,
            traversal: Traversal::RowMajorLtr,
            show_ids: false,
            corner_squares: true,
            corner_square_size: None,
        }
    }
}

impl AprilGridSpec {
    pub fn normalized(&self) -> Self {
        Self {
            rows: self.rows.max(1),
            cols: self.cols.max(1),
            tag_size: if self.tag_size.is_finite() {
                self.tag_size.max(1.0)
            } else {
                40.0
            },
            spacing_ratio: if self.spacing_ratio.is_finite() {
                self.spacing_ratio.max(0.0)
            } else {
                0.0
            },
            corner_square_size: self
                .corner_square_size
                .filter(|s| s.is_finite() && *s > 0.0),
            ..self.clone()
        }
    }

    /// Gap between neighbouring tags.
    pub fn spacing(&self) -> f64 {
        self.tag_size * self.spacing_ratio
    }

    /// Tag bounds, centred in `area`.
    pub fn geometry(&self, area: Rect) -> GridGeometry {
        GridGeometry::centered(area, self.rows, self.cols, self.tag_size, self.spacing())
    }

    pub(super) fn summary(&self, unit: Unit) -> String {
        let u = unit.suffix();
        [
            "Pattern: aprilgrid".to_string(),
            format!("Grid: {}x{}", self.rows, self.cols),
            format!("Family: {}", self.family),
            format!("Tag: {}{u}", num(self.tag_size)),
            format!("Spacing: {}{u}", num(self.spacing())),
            format!("Start: {}", self.start_id),
        ]
        .join(" | ")
    }
}

/// Paint the grid. `spec` must already be normalized.
pub(super) fn draw<F, C>(
    spec: &AprilGridSpec,
    family: &F,
    area: Rect,
    unit: Unit,
    canvas: &mut C,
) -> RenderReport
where
    F: MarkerFamily + ?Sized,
    C: Canvas + ?Sized,
{
    let grid = spec.geometry(area);
    let mut report = RenderReport::default();

    let order = cell_order(spec.rows, spec.cols, spec.origin, spec.traversal);
    for (k, cell) in order.into_iter().enumerate() {
        let id = u64::from(spec.start_id) + k as u64;
        let rect = grid.cell(cell.row, cell.col);
        if draw_id(family, id, rect, canvas, &mut report) && spec.show_ids {
            let font = label_size(spec.tag_size, unit);
            canvas.fill_text(
                &id.to_string(),
                (rect.x + rect.w / 2.0, rect.bottom() + font * 1.1),
                font,
                TextAnchor::Middle,
                Color::BLACK,
            );
        }
    }

    if spec.corner_squares && grid.spacing > 0.0 {
        let side = spec.corner_square_size.unwrap_or(grid.spacing);
        draw_corner_squares(&grid, side, canvas);
    }
    report
}

/// Black squares centred on every gap crossing: between tags, along the
/// four outer gaps, and at the four outer corners.
fn draw_corner_squares<C: Canvas + ?Sized>(grid: &GridGeometry, side: f64, canvas: &mut C) {
    let half = grid.spacing / 2.0;
    let (rows, cols) = (grid.rows(), grid.cols());
    let left = grid.col_lefts[0] - half;
    let right = grid.col_rights[cols - 1] + half;
    let top = grid.row_tops[0] - half;
    let bottom = grid.row_bottoms[rows - 1] + half;

    let mut square = |cx: f64, cy: f64| {
        canvas.fill_rect(Rect::centered_square(cx, cy, side), Color::BLACK);
    };

    for gy in grid.row_gap_centers() {
        for gx in grid.column_gap_centers() {
            square(gx, gy);
        }
    }
    for gx in grid.column_gap_centers() {
        square(gx, top);
        square(gx, bottom);
    }
    for gy in grid.row_gap_centers() {
        square(left, gy);
        square(right, gy);
    }
    for (cx, cy) in [(left, top), (right, top), (left, bottom), (right, bottom)] {
        square(cx, cy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawOp};
    use crate::synth::SyntheticFamily;

    fn spec(rows: usize, cols: usize) -> AprilGridSpec {
        AprilGridSpec {
            rows,
            cols,
            tag_size: 10.0,
            spacing_ratio: 0.4,
            ..AprilGridSpec::default()
        }
    }

    #[test]
    fn corner_square_count() {
        // (r-1)(c-1) internal + 2(c-1) + 2(r-1) + 4 corners
        let (rows, cols) = (3usize, 4usize);
        let grid = spec(rows, cols).geometry(Rect::new(0.0, 0.0, 200.0, 200.0));
        let mut dl = DisplayList::new();
        draw_corner_squares(&grid, 4.0, &mut dl);
        let expected = (rows - 1) * (cols - 1) + 2 * (cols - 1) + 2 * (rows - 1) + 4;
        assert_eq!(dl.len(), expected);
    }

    #[test]
    fn corner_squares_fill_gaps() {
        let grid = GridGeometry::build(10.0, 10.0, 2, 2, 10.0, 4.0);
        let mut dl = DisplayList::new();
        draw_corner_squares(&grid, 4.0, &mut dl);
        let squares = dl.filled(Color::BLACK);
        assert_eq!(squares[0], Rect::new(20.0, 20.0, 4.0, 4.0));
        assert!(squares.contains(&Rect::new(6.0, 6.0, 4.0, 4.0)));
        assert!(squares.contains(&Rect::new(34.0, 34.0, 4.0, 4.0)));
    }

    #[test]
    fn ids_follow_traversal() {
        let s = AprilGridSpec {
            show_ids: true,
            corner_squares: false,
            traversal: Traversal::SnakeLtrFirst,
            ..spec(2, 3)
        };
        let fam = SyntheticFamily::new("t", 6);
        let mut dl = DisplayList::new();
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        let report = draw(&s, &fam, area, Unit::Mm, &mut dl);
        assert_eq!(report.markers_drawn, 6);
        assert_eq!(dl.texts(), vec!["0", "1", "2", "3", "4", "5"]);

        // second row runs right to left: 3 under column 2, 5 under column 0
        let grid = s.geometry(area);
        let expected = [(0, 0), (0, 1), (0, 2), (1, 2), (1, 1), (1, 0)];
        let labels = dl.ops.iter().filter_map(|op| match op {
            DrawOp::Text { at, .. } => Some(*at),
            _ => None,
        });
        for ((x, y), (row, col)) in labels.zip(expected) {
            let cell = grid.cell(row, col);
            assert!((x - (cell.x + cell.w / 2.0)).abs() < 1e-9);
            assert!(y > cell.bottom());
        }
    }

    #[test]
    fn out_of_range_ids_become_placeholders() {
        let s = AprilGridSpec {
            start_id: 2,
            ..spec(1, 3)
        };
        let fam = SyntheticFamily::new("t", 6).with_capacity(3);
        let mut dl = DisplayList::new();
        let report = draw(&s, &fam, Rect::new(0.0, 0.0, 100.0, 100.0), Unit::Mm, &mut dl);
        assert_eq!(report.markers_drawn, 1);
        assert_eq!(report.placeholders, vec![3, 4]);
        assert_eq!(dl.texts(), vec!["ID 3", "ID 4"]);
    }

    #[test]
    fn ids_past_u32_max_do_not_wrap() {
        let s = AprilGridSpec {
            start_id: u32::MAX - 1,
            ..spec(1, 4)
        };
        let fam = SyntheticFamily::new("t", 6);
        let mut dl = DisplayList::new();
        let report = draw(&s, &fam, Rect::new(0.0, 0.0, 100.0, 100.0), Unit::Mm, &mut dl);
        assert_eq!(report.markers_drawn, 2);
        assert_eq!(report.placeholders, vec![1 << 32, (1 << 32) + 1]);
        assert_eq!(dl.texts(), vec!["ID 4294967296", "ID 4294967297"]);
    }

    #[test]
    fn normalization_clamps() {
        let s = AprilGridSpec {
            rows: 0,
            tag_size: f64::NAN,
            spacing_ratio: -1.0,
            corner_square_size: Some(0.0),
            ..AprilGridSpec::default()
        }
        .normalized();
        assert_eq!(s.rows, 1);
        assert_eq!(s.tag_size, 40.0);
        assert_eq!(s.spacing_ratio, 0.0);
        assert_eq!(s.corner_square_size, None);
    }

    #[test]
    fn summary_line() {
        let s = spec(2, 3);
        assert_eq!(
            s.summary(Unit::Mm),
            "Pattern: aprilgrid | Grid: 2x3 | Family: 36h11 | Tag: 10mm | Spacing: 4mm | Start: 0"
        );
    }
}
