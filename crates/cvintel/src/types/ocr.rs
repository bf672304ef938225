//! Geometry and line/page types produced by the OCR engine (C2).

use serde::{Deserialize, Serialize};

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A four-point polygon bounding an OCR line, in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct Polygon {
    pub points: [Point; 4],
}

impl Polygon {
    /// Build an axis-aligned polygon from a bounding rectangle.
    pub fn from_rect(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            points: [
                Point::new(left, top),
                Point::new(left + width, top),
                Point::new(left + width, top + height),
                Point::new(left, top + height),
            ],
        }
    }

    pub fn left(&self) -> f32 {
        self.points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min)
    }

    pub fn top(&self) -> f32 {
        self.points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    pub fn bottom(&self) -> f32 {
        self.points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn y_center(&self) -> f32 {
        (self.top() + self.bottom()) / 2.0
    }

    /// Whether the polygon lies entirely within a page of the given dimensions.
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.points
            .iter()
            .all(|p| p.x >= 0.0 && p.y >= 0.0 && p.x <= width as f32 && p.y <= height as f32)
    }
}

/// A single recognised line of text (§3 OcrLine). Immutable after emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct OcrLine {
    pub text: String,
    /// Confidence normalised to the 0-100 range.
    pub confidence: f32,
    pub bbox: Polygon,
    pub page: u32,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, confidence: f32, bbox: Polygon, page: u32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 100.0),
            bbox,
            page,
        }
    }
}

/// An ordered sequence of [`OcrLine`] belonging to one page (§3 Page).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct Page {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub lines: Vec<OcrLine>,
}

impl Page {
    pub fn new(index: u32, width: u32, height: u32, lines: Vec<OcrLine>) -> Self {
        Self { index, width, height, lines }
    }

    /// All lines joined with newline in the engine's reported order.
    pub fn raw_text(&self) -> String {
        self.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_from_rect_bounds() {
        let poly = Polygon::from_rect(10.0, 20.0, 100.0, 50.0);
        assert_eq!(poly.left(), 10.0);
        assert_eq!(poly.top(), 20.0);
        assert_eq!(poly.bottom(), 70.0);
        assert!(poly.within(200, 200));
        assert!(!poly.within(50, 50));
    }

    #[test]
    fn line_confidence_is_clamped() {
        let line = OcrLine::new("hi", 150.0, Polygon::from_rect(0.0, 0.0, 1.0, 1.0), 0);
        assert_eq!(line.confidence, 100.0);
    }
}
