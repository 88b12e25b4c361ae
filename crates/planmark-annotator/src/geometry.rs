//! Geometry primitives for document space and layout space.
//!
//! Document space is measured in PDF points with the origin at the bottom-left
//! of the page. Layout space is measured in CSS pixels with the origin at the
//! top-left of the rendered page. Normalized geometry stores page fractions
//! with a top-left origin and is the canonical form for persistence.

use serde::{Deserialize, Serialize};

/// A point in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

impl LayoutPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in layout space, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the rectangle spanned by two corners in any drag direction.
    ///
    /// Width and height are always non-negative.
    pub fn from_corners(a: LayoutPoint, b: LayoutPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn top_left(&self) -> LayoutPoint {
        LayoutPoint::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> LayoutPoint {
        LayoutPoint::new(self.x + self.width, self.y + self.height)
    }

    /// Returns this rectangle grown by `margin` on every side.
    pub fn padded(&self, margin: f64) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    /// Whether either side is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Returns this rectangle shifted by a delta.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// A rectangle in document space.
///
/// `y` is the top edge measured upward from the bottom of the page, so the
/// rectangle spans `y - height ..= y` vertically.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DocRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A point expressed as fractions of the page, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

/// A rectangle expressed as fractions of the page, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Converts to document space for a page of the given natural size.
    ///
    /// ```text
    /// doc_x = x * page_width
    /// doc_y = (1 - y) * page_height   // flip Y
    /// ```
    pub fn to_doc(&self, page: PageDimensions) -> DocRect {
        DocRect {
            x: self.x * page.width,
            y: (1.0 - self.y) * page.height,
            width: self.width * page.width,
            height: self.height * page.height,
        }
    }

    /// Normalizes a document-space rectangle against the page size.
    ///
    /// Returns a zeroed rectangle for a page without usable dimensions.
    pub fn from_doc(doc: DocRect, page: PageDimensions) -> Self {
        if !page.is_valid() {
            return Self::default();
        }
        Self {
            x: doc.x / page.width,
            y: (page.height - doc.y) / page.height,
            width: doc.width / page.width,
            height: doc.height / page.height,
        }
    }
}

/// Result of converting a layout point into document space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocPoint {
    pub x: f64,
    pub y: f64,
    pub normalized: NormalizedPoint,
}

/// A layout rectangle converted into both persisted forms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocGeometry {
    pub doc: DocRect,
    pub normalized: NormalizedRect,
}

/// Natural size of a PDF page in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    /// US Letter, used when a page reports no size.
    pub const LETTER: PageDimensions = PageDimensions {
        width: 612.0,
        height: 792.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides finite and positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for PageDimensions {
    fn default() -> Self {
        Self::LETTER
    }
}

/// Size of a box in layout pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Visual bounding box of the rendering surface in client coordinates.
///
/// Differs from the layout size when the browser or OS applies zoom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}
