//! Marker families and the painters shared by every pattern.

use std::sync::Arc;

use crate::bitmap::MarkerBitmap;
use crate::canvas::{Canvas, Color, TextAnchor};
use crate::dictionary::{ArucoDictionary, BitmapDb};
use crate::error::MarkerError;
use crate::family::TagFamily;
use crate::geometry::Rect;
use crate::synth::SyntheticFamily;

/// Anything that maps a marker ID to a bitmap.
pub trait MarkerFamily {
    fn name(&self) -> &str;
    fn render(&self, id: u32) -> Result<MarkerBitmap, MarkerError>;
}

impl MarkerFamily for TagFamily {
    fn name(&self) -> &str {
        TagFamily::name(self)
    }

    fn render(&self, id: u32) -> Result<MarkerBitmap, MarkerError> {
        TagFamily::render(self, id)
    }
}

impl MarkerFamily for SyntheticFamily {
    fn name(&self) -> &str {
        SyntheticFamily::name(self)
    }

    fn render(&self, id: u32) -> Result<MarkerBitmap, MarkerError> {
        SyntheticFamily::render(self, id)
    }
}

/// One dictionary of a loaded bitmap database.
#[derive(Debug, Clone)]
pub struct ArucoFamily {
    db: Arc<BitmapDb>,
    dict: ArucoDictionary,
}

impl ArucoFamily {
    pub fn new(db: Arc<BitmapDb>, dict: ArucoDictionary) -> Self {
        Self { db, dict }
    }

    pub fn dictionary(&self) -> ArucoDictionary {
        self.dict
    }
}

impl MarkerFamily for ArucoFamily {
    fn name(&self) -> &str {
        self.dict.name()
    }

    fn render(&self, id: u32) -> Result<MarkerBitmap, MarkerError> {
        self.db.marker(self.dict, id)
    }
}

/// Paint `bitmap` into the square at `(x, y)`.
///
/// The square is split into `payload + 2` steps: a black ring one step
/// thick, a white interior, then the black payload cells. The bitmap's
/// own border cells are not read.
pub fn draw_marker<C: Canvas + ?Sized>(
    canvas: &mut C,
    x: f64,
    y: f64,
    size: f64,
    bitmap: &MarkerBitmap,
) {
    let n = bitmap.payload_size();
    let step = size / (n + 2) as f64;
    canvas.fill_rect(Rect::new(x, y, size, size), Color::BLACK);
    canvas.fill_rect(
        Rect::new(x + step, y + step, size - 2.0 * step, size - 2.0 * step),
        Color::WHITE,
    );
    for r in 0..n {
        for c in 0..n {
            if bitmap.payload(r, c).is_black() {
                canvas.fill_rect(
                    Rect::new(
                        x + (c + 1) as f64 * step,
                        y + (r + 1) as f64 * step,
                        step,
                        step,
                    ),
                    Color::BLACK,
                );
            }
        }
    }
}

/// White box outlined in red with `ID <id>` in the middle, drawn where a
/// marker could not be rendered.
pub fn draw_placeholder<C: Canvas + ?Sized>(canvas: &mut C, area: Rect, id: u64) {
    let side = area.w.min(area.h);
    canvas.fill_rect(area, Color::WHITE);
    canvas.stroke_rect(area, side / 80.0, Color::RED);
    let font = (side * 0.1).max(1.0);
    canvas.fill_text(
        &format!("ID {id}"),
        (area.x + area.w / 2.0, area.y + area.h / 2.0 + font * 0.35),
        font,
        TextAnchor::Middle,
        Color::RED,
    );
}
