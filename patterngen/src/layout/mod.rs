mod classic;
mod validate;

pub use classic::classic_data_string;

use crate::error::LayoutError;
use crate::types::CellType;

/// A parsed tag layout defining the spatial arrangement of cells.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Grid dimension (the layout is grid_size x grid_size).
    pub grid_size: usize,
    /// Cell types in row-major order (top-to-bottom, left-to-right).
    pub cells: Vec<CellType>,
    /// Number of data bits in this layout.
    pub nbits: usize,
    /// Row/column index of the inner border ring (the black ring on classic layouts).
    pub border_start: usize,
    /// Side length of the square traced by the inner border ring.
    pub border_width: usize,
    /// Whether the border order is reversed (black outside, white inside).
    pub reversed_border: bool,
}

impl Layout {
    /// Parse a layout from a data string of `d`, `b`, `w`, `x` characters.
    ///
    /// The string length must be a perfect square. The layout must be
    /// rotationally symmetric and contain a valid border.
    pub fn from_data_string(data: &str) -> Result<Layout, LayoutError> {
        let len = data.chars().count();
        let grid_size = (len as f64).sqrt() as usize;
        if grid_size * grid_size != len {
            return Err(LayoutError::NotSquare(len));
        }

        let cells: Vec<CellType> = data
            .chars()
            .enumerate()
            .map(|(i, c)| match c {
                'd' => Ok(CellType::Data),
                'b' => Ok(CellType::Black),
                'w' => Ok(CellType::White),
                'x' => Ok(CellType::Ignored),
                _ => Err(LayoutError::InvalidChar(c, i)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        validate::check_symmetry(&cells, grid_size)?;
        let border = validate::detect_border(&cells, grid_size)?;
        validate::check_border_rings(&cells, grid_size, border)?;

        Ok(Layout {
            grid_size,
            nbits: cells.iter().filter(|&&c| c == CellType::Data).count(),
            cells,
            border_start: border.start,
            border_width: grid_size - 2 * border.start,
            reversed_border: border.reversed,
        })
    }

    /// Classic layout: white quiet ring, black ring, data inside.
    pub fn classic(grid_size: usize) -> Result<Layout, LayoutError> {
        Layout::from_data_string(&classic_data_string(grid_size))
    }

    /// Get the cell type at grid position (x, y).
    pub fn cell(&self, x: usize, y: usize) -> CellType {
        self.cells[y * self.grid_size + x]
    }

    /// The layout back in its `d`/`b`/`w`/`x` string form.
    pub fn data_string(&self) -> String {
        self.cells
            .iter()
            .map(|c| match c {
                CellType::Data => 'd',
                CellType::Black => 'b',
                CellType::White => 'w',
                CellType::Ignored => 'x',
            })
            .collect()
    }

    /// Number of rings outside the black border ring.
    ///
    /// These carry no information and are dropped when a rendered tag is
    /// turned into a marker bitmap.
    pub fn quiet_rings(&self) -> usize {
        if self.reversed_border {
            self.border_start - 1
        } else {
            self.border_start
        }
    }
}
