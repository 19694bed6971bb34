use crate::error::LayoutError;
use crate::types::CellType;

/// Where the two-ring border sits and which way round it is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Border {
    /// Ring index of the inner border ring.
    pub start: usize,
    /// `false`: white outside, black inside (classic).
    /// `true`: black outside, white inside.
    pub reversed: bool,
}

/// Every cell must match its three 90-degree rotations.
pub(super) fn check_symmetry(cells: &[CellType], size: usize) -> Result<(), LayoutError> {
    let at = |x: usize, y: usize| cells[y * size + x];
    for y in 0..size / 2 {
        for x in y..size - 1 - y {
            let a = at(x, y);
            if a != at(size - 1 - y, x)
                || a != at(size - 1 - x, size - 1 - y)
                || a != at(y, size - 1 - x)
            {
                return Err(LayoutError::NotSymmetric);
            }
        }
    }
    Ok(())
}

/// Walk the main diagonal inwards until a white/black transition appears.
pub(super) fn detect_border(cells: &[CellType], size: usize) -> Result<Border, LayoutError> {
    for i in 0..size.saturating_sub(1) / 2 {
        let outer = cells[i * size + i];
        let inner = cells[(i + 1) * size + (i + 1)];
        let reversed = match (outer, inner) {
            (CellType::White, CellType::Black) => false,
            (CellType::Black, CellType::White) => true,
            _ => continue,
        };
        return Ok(Border {
            start: i + 1,
            reversed,
        });
    }
    Err(LayoutError::NoBorder)
}

/// Both border rings must be solid along the top edge; symmetry covers the rest.
pub(super) fn check_border_rings(
    cells: &[CellType],
    size: usize,
    border: Border,
) -> Result<(), LayoutError> {
    let (outside, inside) = if border.reversed {
        (CellType::Black, CellType::White)
    } else {
        (CellType::White, CellType::Black)
    };

    for (row, expected, ring) in [
        (border.start - 1, outside, "outer"),
        (border.start, inside, "inner"),
    ] {
        if let Some(x) = (row..size - row).find(|&x| cells[row * size + x] != expected) {
            return Err(LayoutError::InvalidBorder(format!(
                "{ring} ring cell ({x}, {row}) should be {expected:?}"
            )));
        }
    }
    Ok(())
}
