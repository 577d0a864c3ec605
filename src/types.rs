//! Geometry and text-cell types shared across the OCR stage.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in page coordinates, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub l: f32,
    /// Top edge
    pub t: f32,
    /// Right edge
    pub r: f32,
    /// Bottom edge
    pub b: f32,
}

impl BoundingBox {
    /// Create a box from its four edges.
    pub fn new(l: f32, t: f32, r: f32, b: f32) -> Self {
        Self { l, t, r, b }
    }

    pub fn width(&self) -> f32 {
        (self.r - self.l).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.b - self.t).max(0.0)
    }

    /// Area of the box; degenerate boxes report zero.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

/// One recognized word as returned by the recognition endpoint.
///
/// The basic API tiers return text only, no coordinates and no
/// per-word confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedWord {
    /// Recognized text content
    pub words: String,
}

/// A positioned unit of recognized text handed to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCell {
    /// Position of the word within its region's result list.
    /// Indices restart at zero for every region on a page.
    pub index: usize,
    /// Recognized text content
    pub text: String,
    /// Original text before any post-processing
    pub orig: String,
    /// Whether this cell came from OCR rather than the text layer
    pub from_ocr: bool,
    /// Recognition confidence in [0, 1]
    pub confidence: f32,
    /// Bounding rectangle in page coordinates
    pub rect: BoundingBox,
}
