//! Order in which grid positions receive marker IDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseOptionError;

/// Corner where numbering starts. Only the vertical half is used: `T*`
/// numbers from the top row down, `B*` from the bottom row up. The column
/// direction comes from [`Traversal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    #[default]
    #[serde(alias = "TL")]
    TopLeft,
    #[serde(alias = "TR")]
    TopRight,
    #[serde(alias = "BL")]
    BottomLeft,
    #[serde(alias = "BR")]
    BottomRight,
}

impl Origin {
    pub fn starts_at_top(self) -> bool {
        matches!(self, Origin::TopLeft | Origin::TopRight)
    }

    pub fn code(self) -> &'static str {
        match self {
            Origin::TopLeft => "TL",
            Origin::TopRight => "TR",
            Origin::BottomLeft => "BL",
            Origin::BottomRight => "BR",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Origin {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tl" | "top-left" => Ok(Origin::TopLeft),
            "tr" | "top-right" => Ok(Origin::TopRight),
            "bl" | "bottom-left" => Ok(Origin::BottomLeft),
            "br" | "bottom-right" => Ok(Origin::BottomRight),
            _ => Err(ParseOptionError {
                kind: "origin",
                value: s.to_string(),
                expected: "TL, TR, BL, BR",
            }),
        }
    }
}

/// Column order within each visited row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Traversal {
    /// Every row left to right.
    #[default]
    RowMajorLtr,
    /// Every row right to left.
    RowMajorRtl,
    /// Alternate, first visited row left to right.
    SnakeLtrFirst,
    /// Alternate, first visited row right to left.
    SnakeRtlFirst,
}

impl Traversal {
    pub const ALL: [Traversal; 4] = [
        Traversal::RowMajorLtr,
        Traversal::RowMajorRtl,
        Traversal::SnakeLtrFirst,
        Traversal::SnakeRtlFirst,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Traversal::RowMajorLtr => "row-major-ltr",
            Traversal::RowMajorRtl => "row-major-rtl",
            Traversal::SnakeLtrFirst => "snake-ltr-first",
            Traversal::SnakeRtlFirst => "snake-rtl-first",
        }
    }

    /// Whether the `k`-th visited row runs left to right.
    fn left_to_right(self, k: usize) -> bool {
        match self {
            Traversal::RowMajorLtr => true,
            Traversal::RowMajorRtl => false,
            Traversal::SnakeLtrFirst => k % 2 == 0,
            Traversal::SnakeRtlFirst => k % 2 == 1,
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Traversal {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Traversal::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseOptionError {
                kind: "traversal",
                value: s.to_string(),
                expected: "row-major-ltr, row-major-rtl, snake-ltr-first, snake-rtl-first",
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

/// Every position of a `rows`×`cols` grid, in numbering order.
pub fn cell_order(rows: usize, cols: usize, origin: Origin, traversal: Traversal) -> Vec<GridCell> {
    let mut order = Vec::with_capacity(rows * cols);
    for k in 0..rows {
        let row = if origin.starts_at_top() { k } else { rows - 1 - k };
        if traversal.left_to_right(k) {
            order.extend((0..cols).map(|col| GridCell { row, col }));
        } else {
            order.extend((0..cols).rev().map(|col| GridCell { row, col }));
        }
    }
    order
}

/// Row-major table of IDs: `ids[row][col]`, numbered from `start_id` in
/// traversal order.
pub fn assign_ids(
    rows: usize,
    cols: usize,
    origin: Origin,
    traversal: Traversal,
    start_id: u32,
) -> Vec<Vec<u32>> {
    let mut ids = vec![vec![0u32; cols]; rows];
    let mut next = start_id;
    for cell in cell_order(rows, cols, origin, traversal) {
        ids[cell.row][cell.col] = next;
        next = next.wrapping_add(1);
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_from_top_left() {
        let ids = assign_ids(2, 3, Origin::TopLeft, Traversal::SnakeLtrFirst, 0);
        assert_eq!(ids, vec![vec![0, 1, 2], vec![5, 4, 3]]);
    }

    #[test]
    fn row_major_from_bottom() {
        let ids = assign_ids(2, 3, Origin::BottomLeft, Traversal::RowMajorLtr, 10);
        assert_eq!(ids, vec![vec![13, 14, 15], vec![10, 11, 12]]);
    }

    #[test]
    fn snake_rtl_from_bottom() {
        let ids = assign_ids(3, 2, Origin::BottomRight, Traversal::SnakeRtlFirst, 0);
        assert_eq!(ids, vec![vec![5, 4], vec![2, 3], vec![1, 0]]);
    }

    #[test]
    fn horizontal_origin_does_not_flip_columns() {
        let left = assign_ids(2, 2, Origin::TopLeft, Traversal::RowMajorLtr, 0);
        let right = assign_ids(2, 2, Origin::TopRight, Traversal::RowMajorLtr, 0);
        assert_eq!(left, right);
    }

    #[test]
    fn every_cell_visited_once() {
        for t in Traversal::ALL {
            let order = cell_order(4, 5, Origin::BottomLeft, t);
            assert_eq!(order.len(), 20);
            let mut seen = std::collections::HashSet::new();
            assert!(order.iter().all(|c| seen.insert(*c)), "{t}");
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("TL".parse::<Origin>().unwrap(), Origin::TopLeft);
        assert_eq!("bottom-right".parse::<Origin>().unwrap(), Origin::BottomRight);
        assert_eq!(
            "snake-rtl-first".parse::<Traversal>().unwrap(),
            Traversal::SnakeRtlFirst
        );
        assert!("zigzag".parse::<Traversal>().is_err());
    }
}
