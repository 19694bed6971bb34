//! Page and grid geometry.
//!
//! All values are in page units: millimetres for print pages, pixels for
//! preview canvases. Nothing here rounds; pixel surfaces snap edges when
//! they rasterise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseOptionError;

/// Axis-aligned rectangle, `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Square of side `side` centred on `(cx, cy)`.
    pub fn centered_square(cx: f64, cy: f64, side: f64) -> Self {
        Self::new(cx - side / 2.0, cy - side / 2.0, side, side)
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Shrink by `d` on every side.
    pub fn inset(&self, d: f64) -> Self {
        Self::new(self.x + d, self.y + d, self.w - 2.0 * d, self.h - 2.0 * d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Mm,
    Px,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Px => "px",
        }
    }
}

/// The drawing surface a pattern is laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub unit: Unit,
}

impl Page {
    pub const fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 10.0,
            unit: Unit::Mm,
        }
    }

    pub const fn a3() -> Self {
        Self {
            width: 297.0,
            height: 420.0,
            margin: 10.0,
            unit: Unit::Mm,
        }
    }

    pub const fn letter() -> Self {
        Self {
            width: 215.9,
            height: 279.4,
            margin: 10.0,
            unit: Unit::Mm,
        }
    }

    /// Borderless pixel canvas, as used for on-screen previews.
    pub const fn canvas(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
            margin: 0.0,
            unit: Unit::Px,
        }
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Swap width and height.
    pub fn landscape(mut self) -> Self {
        if self.height > self.width {
            std::mem::swap(&mut self.width, &mut self.height);
        }
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Printable area inside the margins.
    pub fn inner(&self) -> Rect {
        self.bounds().inset(self.margin)
    }

    /// Whether geometry should land on whole units (pixel canvases).
    pub fn snaps(&self) -> bool {
        self.unit == Unit::Px
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::a4()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{}", self.width, self.height, self.unit.suffix())
    }
}

impl FromStr for Page {
    type Err = ParseOptionError;

    /// `a4`, `a3`, `letter` (optionally suffixed `-landscape`), or `WxH` pixels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseOptionError {
            kind: "page",
            value: s.to_string(),
            expected: "a4, a3, letter, <name>-landscape, WIDTHxHEIGHT",
        };
        let lower = s.trim().to_ascii_lowercase();
        let (name, landscape) = match lower.strip_suffix("-landscape") {
            Some(name) => (name, true),
            None => (lower.as_str(), false),
        };
        let page = match name {
            "a4" => Page::a4(),
            "a3" => Page::a3(),
            "letter" => Page::letter(),
            other => {
                let (w, h) = other.split_once('x').ok_or_else(err)?;
                let w: u32 = w.trim().parse().map_err(|_| err())?;
                let h: u32 = h.trim().parse().map_err(|_| err())?;
                if w == 0 || h == 0 {
                    return Err(err());
                }
                Page::canvas(w, h)
            }
        };
        Ok(if landscape { page.landscape() } else { page })
    }
}

/// Extent of `n` tags of size `tag` separated by `spacing`.
#[inline]
pub fn grid_extent(n: usize, tag: f64, spacing: f64) -> f64 {
    n as f64 * tag + n.saturating_sub(1) as f64 * spacing
}

/// Per-row and per-column bounds of a spaced tag grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    pub col_lefts: Vec<f64>,
    pub col_rights: Vec<f64>,
    pub row_tops: Vec<f64>,
    pub row_bottoms: Vec<f64>,
    pub tag: f64,
    pub spacing: f64,
}

impl GridGeometry {
    /// Grid with its top-left tag corner at `(start_x, start_y)`.
    pub fn build(
        start_x: f64,
        start_y: f64,
        rows: usize,
        cols: usize,
        tag: f64,
        spacing: f64,
    ) -> Self {
        let pitch = tag + spacing;
        let col_lefts: Vec<f64> = (0..cols).map(|c| start_x + c as f64 * pitch).collect();
        let row_tops: Vec<f64> = (0..rows).map(|r| start_y + r as f64 * pitch).collect();
        Self {
            col_rights: col_lefts.iter().map(|x| x + tag).collect(),
            row_bottoms: row_tops.iter().map(|y| y + tag).collect(),
            col_lefts,
            row_tops,
            tag,
            spacing,
        }
    }

    /// Grid centred in `area`.
    pub fn centered(area: Rect, rows: usize, cols: usize, tag: f64, spacing: f64) -> Self {
        let start_x = area.x + (area.w - grid_extent(cols, tag, spacing)) / 2.0;
        let start_y = area.y + (area.h - grid_extent(rows, tag, spacing)) / 2.0;
        Self::build(start_x, start_y, rows, cols, tag, spacing)
    }

    pub fn rows(&self) -> usize {
        self.row_tops.len()
    }

    pub fn cols(&self) -> usize {
        self.col_lefts.len()
    }

    pub fn width(&self) -> f64 {
        grid_extent(self.cols(), self.tag, self.spacing)
    }

    pub fn height(&self) -> f64 {
        grid_extent(self.rows(), self.tag, self.spacing)
    }

    pub fn cell(&self, row: usize, col: usize) -> Rect {
        Rect::new(
            self.col_lefts[col],
            self.row_tops[row],
            self.col_rights[col] - self.col_lefts[col],
            self.row_bottoms[row] - self.row_tops[row],
        )
    }

    /// Centres of the gaps between consecutive columns.
    pub fn column_gap_centers(&self) -> impl Iterator<Item = f64> + '_ {
        let half = self.spacing / 2.0;
        self.col_rights
            .iter()
            .take(self.cols().saturating_sub(1))
            .map(move |r| r + half)
    }

    /// Centres of the gaps between consecutive rows.
    pub fn row_gap_centers(&self) -> impl Iterator<Item = f64> + '_ {
        let half = self.spacing / 2.0;
        self.row_bottoms
            .iter()
            .take(self.rows().saturating_sub(1))
            .map(move |b| b + half)
    }
}

/// A checkerboard of equal square cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGeometry {
    pub cell: f64,
    pub ox: f64,
    pub oy: f64,
    pub rows: usize,
    pub cols: usize,
}

impl CellGeometry {
    /// Largest square cell that fits `rows`×`cols` into `area`, centred.
    ///
    /// With `snap` the cell size is floored to whole units so pixel squares
    /// tile without seams.
    pub fn fit(area: Rect, rows: usize, cols: usize, snap: bool) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let mut cell = (area.w / cols as f64).min(area.h / rows as f64).max(0.0);
        if snap {
            cell = cell.floor();
        }
        Self::with_cell(area, rows, cols, cell)
    }

    /// Fixed cell size, centred in `area` (may overflow it).
    pub fn with_cell(area: Rect, rows: usize, cols: usize, cell: f64) -> Self {
        let grid_w = cols as f64 * cell;
        let grid_h = rows as f64 * cell;
        Self {
            cell,
            ox: area.x + (area.w - grid_w) / 2.0,
            oy: area.y + (area.h - grid_h) / 2.0,
            rows,
            cols,
        }
    }

    pub fn grid_w(&self) -> f64 {
        self.cols as f64 * self.cell
    }

    pub fn grid_h(&self) -> f64 {
        self.rows as f64 * self.cell
    }

    pub fn square(&self, row: usize, col: usize) -> Rect {
        Rect::new(
            self.ox + col as f64 * self.cell,
            self.oy + row as f64 * self.cell,
            self.cell,
            self.cell,
        )
    }

    /// Position of the grid corner between rows `i-1`/`i` and columns `j-1`/`j`.
    pub fn corner(&self, i: usize, j: usize) -> (f64, f64) {
        (
            self.ox + j as f64 * self.cell,
            self.oy + i as f64 * self.cell,
        )
    }
}
