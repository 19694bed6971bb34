use serde::{Deserialize, Serialize};

use super::{draw_id, is_dark, label_size, RenderReport, SquareColor};
use crate::canvas::{Canvas, Color, TextAnchor};
use crate::dictionary::ArucoDictionary;
use crate::geometry::{CellGeometry, Rect, Unit};
use crate::marker::MarkerFamily;
use crate::traversal::{cell_order, Origin, Traversal};

pub const MIN_MARKER_RATIO: f64 = 0.5;
pub const MAX_MARKER_RATIO: f64 = 0.85;
pub const DEFAULT_MARKER_RATIO: f64 = 0.7;

/// A checkerboard with ArUco markers centred in the squares of one colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharucoSpec {
    /// Squares across.
    pub squares_x: usize,
    /// Squares down.
    pub squares_y: usize,
    pub top_left: SquareColor,
    /// Colour of the squares that carry markers.
    pub markers_on: SquareColor,
    /// Marker side as a fraction of the square side.
    pub marker_ratio: f64,
    pub id_step: u32,
    pub start_id: u32,
    pub dictionary: ArucoDictionary,
    pub origin: Origin,
    pub traversal: Traversal,
    pub show_ids: bool,
    /// Fixed square side; by default the board fills the printable area.
    pub square_size: Option<f64>,
}

impl Default for CharucoSpec {
    fn default() -> Self {
        Self {
            squares_x: 5,
            squares_y: 7,
            top_left: SquareColor::Black,
            markers_on: SquareColor::White,
            marker_ratio: DEFAULT_MARKER_RATIO,
            id_step: 1,
            start_id: 0,
            dictionary: ArucoDictionary::default(),
            origin: Origin::TopLeft,
            traversal: Traversal::RowMajorLtr,
            show_ids: false,
            square_size: None,
        }
    }
}

impl CharucoSpec {
    pub fn normalized(&self) -> Self {
        Self {
            squares_x: self.squares_x.max(1),
            squares_y: self.squares_y.max(1),
            marker_ratio: if self.marker_ratio.is_finite() {
                self.marker_ratio.clamp(MIN_MARKER_RATIO, MAX_MARKER_RATIO)
            } else {
                DEFAULT_MARKER_RATIO
            },
            id_step: self.id_step.max(1),
            square_size: self.square_size.filter(|s| s.is_finite() && *s > 0.0),
            ..self.clone()
        }
    }

    pub fn geometry(&self, area: Rect, snap: bool) -> CellGeometry {
        match self.square_size {
            Some(cell) => CellGeometry::with_cell(area, self.squares_y, self.squares_x, cell),
            None => CellGeometry::fit(area, self.squares_y, self.squares_x, snap),
        }
    }

    /// Number of squares that carry a marker.
    pub fn marker_count(&self) -> usize {
        let on_dark = self.markers_on == SquareColor::Black;
        (0..self.squares_y)
            .flat_map(|i| (0..self.squares_x).map(move |j| (i, j)))
            .filter(|&(i, j)| is_dark(i, j, self.top_left) == on_dark)
            .count()
    }

    pub(super) fn summary(&self) -> String {
        [
            "Pattern: charuco".to_string(),
            format!("Squares: {}x{}", self.squares_x, self.squares_y),
            format!("Dict: {}", self.dictionary),
            format!("Marker: {}%", (self.marker_ratio * 100.0).round()),
            format!("Start: {}", self.start_id),
            format!("Step: {}", self.id_step),
        ]
        .join(" | ")
    }
}

/// Paint the board. `spec` must already be normalized.
pub(super) fn draw<F, C>(
    spec: &CharucoSpec,
    family: &F,
    area: Rect,
    snap: bool,
    canvas: &mut C,
) -> RenderReport
where
    F: MarkerFamily + ?Sized,
    C: Canvas + ?Sized,
{
    let g = spec.geometry(area, snap);
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

    let on_dark = spec.markers_on == SquareColor::Black;
    let marker = g.cell * spec.marker_ratio;
    let margin = (g.cell - marker) / 2.0;
    let unit = if snap { Unit::Px } else { Unit::Mm };
    let label_color = if on_dark { Color::WHITE } else { Color::BLACK };

    let mut report = RenderReport::default();
    let mut id = u64::from(spec.start_id);
    for cell in cell_order(g.rows, g.cols, spec.origin, spec.traversal) {
        if is_dark(cell.row, cell.col, spec.top_left) != on_dark {
            continue;
        }
        let square = g.square(cell.row, cell.col);
        let (x, y) = (square.x + margin, square.y + margin);
        let area = Rect::new(x, y, marker, marker);
        if draw_id(family, id, area, canvas, &mut report) && spec.show_ids {
            let font = label_size(g.cell, unit);
            canvas.fill_text(
                &id.to_string(),
                (x + marker / 2.0, y + marker + font * 1.1),
                font,
                TextAnchor::Middle,
                label_color,
            );
        }
        id += u64::from(spec.id_step);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DisplayList;
    use crate::synth::SyntheticFamily;

    fn board(x: usize, y: usize) -> CharucoSpec {
        CharucoSpec {
            squares_x: x,
            squares_y: y,
            ..CharucoSpec::default()
        }
    }

    #[test]
    fn ratio_and_step_are_clamped() {
        let s = CharucoSpec {
            marker_ratio: 0.95,
            id_step: 0,
            ..CharucoSpec::default()
        }
        .normalized();
        assert_eq!(s.marker_ratio, MAX_MARKER_RATIO);
        assert_eq!(s.id_step, 1);
        let s = CharucoSpec {
            marker_ratio: 0.1,
            ..CharucoSpec::default()
        }
        .normalized();
        assert_eq!(s.marker_ratio, MIN_MARKER_RATIO);
    }

    #[test]
    fn markers_land_on_chosen_colour() {
        // 3x3, black top-left: 5 black squares, 4 white.
        assert_eq!(board(3, 3).marker_count(), 4);
        let on_black = CharucoSpec {
            markers_on: SquareColor::Black,
            ..board(3, 3)
        };
        assert_eq!(on_black.marker_count(), 5);
    }

    #[test]
    fn ids_step_through_marker_squares() {
        let s = CharucoSpec {
            show_ids: true,
            id_step: 2,
            start_id: 10,
            ..board(3, 2)
        };
        let fam = SyntheticFamily::new("4x4_50", 6);
        let mut dl = DisplayList::new();
        let report = draw(&s, &fam, Rect::new(0.0, 0.0, 300.0, 200.0), true, &mut dl);
        // white squares of a black-first 2x3 board: (0,1), (1,0), (1,2)
        assert_eq!(report.markers_drawn, 3);
        assert_eq!(dl.texts(), vec!["10", "12", "14"]);
    }

    #[test]
    fn marker_is_centred_in_square() {
        let s = board(2, 1);
        let fam = SyntheticFamily::new("4x4_50", 6);
        let mut dl = DisplayList::new();
        draw(&s, &fam, Rect::new(0.0, 0.0, 200.0, 100.0), true, &mut dl);
        // square (0,1) spans x 100..200; a 70 px marker starts 15 px in
        let black = dl.filled(Color::BLACK);
        assert!(black.contains(&Rect::new(115.0, 15.0, 70.0, 70.0)));
    }

    #[test]
    fn stepping_past_u32_max_gives_placeholders() {
        let s = CharucoSpec {
            start_id: u32::MAX,
            id_step: 2,
            ..board(3, 2)
        };
        let fam = SyntheticFamily::new("4x4_50", 6);
        let mut dl = DisplayList::new();
        let report = draw(&s, &fam, Rect::new(0.0, 0.0, 300.0, 200.0), true, &mut dl);
        assert_eq!(report.markers_drawn, 1);
        let max = u64::from(u32::MAX);
        assert_eq!(report.placeholders, vec![max + 2, max + 4]);
    }

    #[test]
    fn out_of_capacity_ids_become_placeholders() {
        let s = CharucoSpec {
            start_id: 48,
            ..board(4, 4)
        };
        let fam = SyntheticFamily::new("4x4_50", 6).with_capacity(50);
        let mut dl = DisplayList::new();
        let report = draw(&s, &fam, Rect::new(0.0, 0.0, 400.0, 400.0), true, &mut dl);
        assert_eq!(report.markers_drawn, 2);
        assert_eq!(report.placeholders, vec![50, 51, 52, 53, 54, 55]);
    }
}
