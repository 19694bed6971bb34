/// The type of a cell in an AprilTag layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    /// Carries one bit of the tag code.
    Data,
    /// Always-black border cell.
    Black,
    /// Always-white border cell.
    White,
    /// Outside the tag boundary.
    Ignored,
}

/// A pixel of a raw layout render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
    Black,
    White,
    Transparent,
}

/// One cell of a marker bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Black,
    White,
}

impl Cell {
    /// `true` → black, `false` → white.
    #[inline]
    pub fn from_black(black: bool) -> Cell {
        if black {
            Cell::Black
        } else {
            Cell::White
        }
    }

    #[inline]
    pub fn is_black(self) -> bool {
        self == Cell::Black
    }

    /// Single-character form used by the family matrices (`b` / `w`).
    pub fn as_char(self) -> char {
        match self {
            Cell::Black => 'b',
            Cell::White => 'w',
        }
    }
}

impl From<Pixel> for Cell {
    /// Transparent pixels print as paper, so they map to white.
    fn from(p: Pixel) -> Cell {
        match p {
            Pixel::Black => Cell::Black,
            Pixel::White | Pixel::Transparent => Cell::White,
        }
    }
}
