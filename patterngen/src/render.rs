use crate::layout::Layout;
use crate::types::{CellType, Pixel};

/// A tag code painted into its layout grid.
#[derive(Debug, Clone)]
pub struct RenderedTag {
    /// Grid dimension (same as layout grid_size).
    pub grid_size: usize,
    /// Pixel values in row-major order.
    pub pixels: Vec<Pixel>,
}

impl RenderedTag {
    /// Get the pixel at position (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.grid_size + x]
    }
}

/// Code bits handed out most significant first.
struct CodeBits {
    code: u64,
    top: u32,
}

impl CodeBits {
    /// Bits past the 64th read as zero.
    fn next_is_white(&mut self) -> bool {
        let bit = self.code.checked_shr(self.top).unwrap_or(0) & 1;
        self.code <<= 1;
        bit != 0
    }
}

fn paint(cell: CellType, bits: &mut CodeBits) -> Pixel {
    match cell {
        CellType::Data if bits.next_is_white() => Pixel::White,
        CellType::Data | CellType::Black => Pixel::Black,
        CellType::White => Pixel::White,
        CellType::Ignored => Pixel::Transparent,
    }
}

/// Paint `code` into the cells of `layout`.
///
/// The top triangle strip is filled four times with a quarter turn in
/// between, so bit order follows the quadrant scan of the layout. An odd
/// grid takes the last bit at its centre, then one more quarter turn puts
/// the first bit back at the top-left.
pub fn render(layout: &Layout, code: u64) -> RenderedTag {
    let size = layout.grid_size;
    let mut bits = CodeBits {
        code,
        top: layout.nbits.saturating_sub(1) as u32,
    };
    let mut im = vec![Pixel::Transparent; size * size];

    for _ in 0..4 {
        im = rotate90(&im, size);
        for y in 0..=size / 2 {
            for x in y..size.saturating_sub(1 + y) {
                im[y * size + x] = paint(layout.cell(x, y), &mut bits);
            }
        }
    }

    if size % 2 == 1 {
        let mid = size / 2;
        im[mid * size + mid] = paint(layout.cell(mid, mid), &mut bits);
    }

    RenderedTag {
        grid_size: size,
        pixels: rotate90(&im, size),
    }
}

/// Quarter turn: (x, y) moves to (y, size - 1 - x).
fn rotate90(im: &[Pixel], size: usize) -> Vec<Pixel> {
    let mut out = vec![Pixel::Transparent; size * size];
    for y in 0..size {
        for x in 0..size {
            out[(size - 1 - x) * size + y] = im[y * size + x];
        }
    }
    out
}
