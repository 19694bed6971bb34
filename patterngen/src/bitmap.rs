//! Square black/white marker bitmaps.
//!
//! A bitmap always includes the family's own one-cell border ring; the
//! interior is the payload. Painters draw their own border ring and only
//! read the payload, so every source (rendered AprilTag codes, dictionary
//! matrices, the synthetic generator) ends up in this one shape.

use serde::Deserialize;

use crate::error::MarkerError;
use crate::layout::Layout;
use crate::render::RenderedTag;
use crate::types::Cell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerBitmap {
    size: usize,
    cells: Vec<Cell>,
}

/// One entry of a dictionary matrix as it appears in JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Bit(u8),
    Flag(bool),
    Char(String),
}

impl RawCell {
    fn to_cell(&self) -> Result<Cell, MarkerError> {
        match self {
            RawCell::Bit(1) | RawCell::Flag(true) => Ok(Cell::Black),
            RawCell::Bit(0) | RawCell::Flag(false) => Ok(Cell::White),
            RawCell::Char(s) if s == "b" => Ok(Cell::Black),
            RawCell::Char(s) if s == "w" => Ok(Cell::White),
            RawCell::Bit(v) => Err(MarkerError::Malformed(format!("cell value {v}"))),
            RawCell::Char(s) => Err(MarkerError::Malformed(format!("cell value {s:?}"))),
        }
    }
}

impl MarkerBitmap {
    /// Build from row-major cells. `cells.len()` must be `size * size`.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<MarkerBitmap, MarkerError> {
        if size < 3 || cells.len() != size * size {
            return Err(MarkerError::Malformed(format!(
                "{} cells do not form a bordered {size}x{size} marker",
                cells.len()
            )));
        }
        Ok(MarkerBitmap { size, cells })
    }

    /// Wrap an n×n payload in a black border ring.
    pub fn from_payload(rows: &[Vec<Cell>]) -> Result<MarkerBitmap, MarkerError> {
        let n = rows.len();
        if n == 0 || rows.iter().any(|r| r.len() != n) {
            return Err(MarkerError::Malformed(format!(
                "payload is not square ({n} rows)"
            )));
        }
        let size = n + 2;
        let mut cells = vec![Cell::Black; size * size];
        for (r, row) in rows.iter().enumerate() {
            let start = (r + 1) * size + 1;
            cells[start..start + n].copy_from_slice(row);
        }
        MarkerBitmap::from_cells(size, cells)
    }

    /// Payload matrix from a dictionary entry (n×n, 1/true/"b" = black).
    pub fn from_matrix(rows: &[Vec<RawCell>]) -> Result<MarkerBitmap, MarkerError> {
        let payload = rows
            .iter()
            .map(|row| row.iter().map(RawCell::to_cell).collect())
            .collect::<Result<Vec<Vec<Cell>>, _>>()?;
        MarkerBitmap::from_payload(&payload)
    }

    /// Drop the layout's quiet rings from a rendered tag.
    ///
    /// What remains starts with the black border ring, matching the
    /// bordered shape of the other bitmap sources.
    pub fn from_rendered(tag: &RenderedTag, layout: &Layout) -> Result<MarkerBitmap, MarkerError> {
        let quiet = layout.quiet_rings();
        let size = tag.grid_size.saturating_sub(2 * quiet);
        let mut cells = Vec::with_capacity(size * size);
        for y in quiet..quiet + size {
            for x in quiet..quiet + size {
                cells.push(Cell::from(tag.pixel(x, y)));
            }
        }
        MarkerBitmap::from_cells(size, cells)
    }

    /// Side length including the border ring.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.size + col]
    }

    /// Side length of the payload (interior) area.
    #[inline]
    pub fn payload_size(&self) -> usize {
        self.size - 2
    }

    /// Payload cell, indexed from the first interior row/column.
    #[inline]
    pub fn payload(&self, row: usize, col: usize) -> Cell {
        self.cell(row + 1, col + 1)
    }

    /// Rows as `b`/`w` strings, handy for logs and the `info` command.
    pub fn to_strings(&self) -> Vec<String> {
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|c| c.as_char()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;

    fn raw(rows: &[&[u8]]) -> Vec<Vec<RawCell>> {
        rows.iter()
            .map(|r| r.iter().map(|&v| RawCell::Bit(v)).collect())
            .collect()
    }

    #[test]
    fn payload_is_wrapped_in_black_ring() {
        let bm = MarkerBitmap::from_matrix(&raw(&[&[1, 0], &[0, 1]])).unwrap();
        assert_eq!(bm.size(), 4);
        assert_eq!(bm.payload_size(), 2);
        for i in 0..4 {
            assert!(bm.cell(0, i).is_black());
            assert!(bm.cell(3, i).is_black());
            assert!(bm.cell(i, 0).is_black());
            assert!(bm.cell(i, 3).is_black());
        }
        assert_eq!(bm.payload(0, 0), Cell::Black);
        assert_eq!(bm.payload(0, 1), Cell::White);
        assert_eq!(bm.payload(1, 0), Cell::White);
        assert_eq!(bm.payload(1, 1), Cell::Black);
    }

    #[test]
    fn matrix_accepts_chars_and_bools() {
        let rows: Vec<Vec<RawCell>> = serde_json::from_str(r#"[["b", "w"], [false, true]]"#).unwrap();
        let bm = MarkerBitmap::from_matrix(&rows).unwrap();
        assert_eq!(bm.to_strings()[1], "bbwb");
        assert_eq!(bm.to_strings()[2], "bwbb");
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        let err = MarkerBitmap::from_matrix(&raw(&[&[1, 0], &[0]])).unwrap_err();
        assert!(matches!(err, MarkerError::Malformed(_)));
    }

    #[test]
    fn unknown_cell_value_is_rejected() {
        let err = MarkerBitmap::from_matrix(&raw(&[&[2]])).unwrap_err();
        assert!(matches!(err, MarkerError::Malformed(_)));
    }

    #[test]
    fn rendered_classic_tag_loses_quiet_ring() {
        let layout = Layout::classic(10).unwrap();
        let tag = render(&layout, 0xd7e00984b);
        let bm = MarkerBitmap::from_rendered(&tag, &layout).unwrap();
        assert_eq!(bm.size(), 8);
        assert_eq!(bm.payload_size(), 6);
        for i in 0..8 {
            assert!(bm.cell(0, i).is_black());
            assert!(bm.cell(7, i).is_black());
        }
        for y in 0..6 {
            for x in 0..6 {
                assert_eq!(bm.payload(y, x), Cell::from(tag.pixel(x + 2, y + 2)));
            }
        }
    }
}
