use super::{Canvas, Color, TextAnchor};
use crate::geometry::Rect;

/// One recorded paint call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        line_width: f64,
        color: Color,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        line_width: f64,
        color: Color,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        color: Color,
    },
    Text {
        text: String,
        at: (f64, f64),
        size: f64,
        anchor: TextAnchor,
        color: Color,
    },
}

/// A canvas that records paint calls instead of drawing them.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    pub ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Every text string, in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Filled rectangles of `color`, in paint order.
    pub fn filled(&self, color: Color) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { rect, color: c } if *c == color => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Replay onto another canvas.
    pub fn replay<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        for op in &self.ops {
            match op {
                DrawOp::FillRect { rect, color } => canvas.fill_rect(*rect, *color),
                DrawOp::StrokeRect {
                    rect,
                    line_width,
                    color,
                } => canvas.stroke_rect(*rect, *line_width, *color),
                DrawOp::Line {
                    from,
                    to,
                    line_width,
                    color,
                } => canvas.stroke_line(*from, *to, *line_width, *color),
                DrawOp::Circle { cx, cy, r, color } => canvas.fill_circle(*cx, *cy, *r, *color),
                DrawOp::Text {
                    text,
                    at,
                    size,
                    anchor,
                    color,
                } => canvas.fill_text(text, *at, *size, *anchor, *color),
            }
        }
    }
}

impl Canvas for DisplayList {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color) {
        self.ops.push(DrawOp::StrokeRect {
            rect,
            line_width,
            color,
        });
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: Color) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            line_width,
            color,
        });
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Color) {
        self.ops.push(DrawOp::Circle { cx, cy, r, color });
    }

    fn fill_text(
        &mut self,
        text: &str,
        at: (f64, f64),
        size: f64,
        anchor: TextAnchor,
        color: Color,
    ) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            size,
            anchor,
            color,
        });
    }
}
