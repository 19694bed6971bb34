//! Deterministic stand-in markers for when no family data is available.
//!
//! The bitmaps look like markers and are stable per ID, but they are not
//! members of any real family and will not decode.

use crate::bitmap::MarkerBitmap;
use crate::error::MarkerError;
use crate::types::Cell;

const SEED_MIX: u32 = 0x9E37_79B9;
const LCG_MUL: u32 = 1_664_525;
const LCG_INC: u32 = 1_013_904_223;

/// Side length used when an AprilTag family cannot be loaded.
pub const FALLBACK_APRILTAG_SIZE: usize = 6;

/// Synthesize an `n`×`n` marker for `id`.
///
/// The outer ring alternates by `(row + col)` parity (odd is black). Each
/// interior cell, in row-major order, takes the low bit of the next
/// 32-bit LCG output seeded with `id ^ 0x9E3779B9`; a set bit is black.
pub fn synthesize(id: u32, n: usize) -> Vec<Cell> {
    let mut state = id ^ SEED_MIX;
    let mut cells = Vec::with_capacity(n * n);
    for r in 0..n {
        for c in 0..n {
            let on_ring = r == 0 || c == 0 || r == n - 1 || c == n - 1;
            let black = if on_ring {
                (r + c) & 1 == 1
            } else {
                state = state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
                state & 1 == 1
            };
            cells.push(Cell::from_black(black));
        }
    }
    cells
}

/// A family of synthesized markers with a fixed side length.
#[derive(Debug, Clone)]
pub struct SyntheticFamily {
    name: String,
    size: usize,
    capacity: Option<u32>,
}

impl SyntheticFamily {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            capacity: None,
        }
    }

    /// Stand-in for a dictionary that only has `capacity` markers.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn render(&self, id: u32) -> Result<MarkerBitmap, MarkerError> {
        if let Some(count) = self.capacity {
            if id >= count {
                return Err(MarkerError::IdOutOfRange {
                    family: self.name.clone(),
                    id,
                    count: count as usize,
                });
            }
        }
        MarkerBitmap::from_cells(self.size, synthesize(id, self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_alternates_by_parity() {
        for n in [3usize, 4, 6, 9] {
            for id in [0u32, 1, 7, 4095, u32::MAX] {
                let cells = synthesize(id, n);
                for r in 0..n {
                    for c in 0..n {
                        if r == 0 || c == 0 || r == n - 1 || c == n - 1 {
                            let expected = Cell::from_black((r + c) % 2 == 1);
                            assert_eq!(cells[r * n + c], expected, "id {id} n {n} ({r}, {c})");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn same_id_same_bitmap() {
        for id in 0..200u32 {
            assert_eq!(synthesize(id, 6), synthesize(id, 6));
        }
    }

    #[test]
    fn interior_follows_lcg_sequence() {
        // id 0: seed 0x9E3779B9, first output 0x9E3779B9 * 1664525 + 1013904223.
        let first = SEED_MIX.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        let cells = synthesize(0, 3);
        assert_eq!(cells[4], Cell::from_black(first & 1 == 1));
    }

    #[test]
    fn capacity_bounds_ids() {
        let fam = SyntheticFamily::new("4x4_50", 6).with_capacity(50);
        assert!(fam.render(49).is_ok());
        assert_eq!(
            fam.render(50).unwrap_err(),
            MarkerError::IdOutOfRange {
                family: "4x4_50".into(),
                id: 50,
                count: 50
            }
        );
    }
}
