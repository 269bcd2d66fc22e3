//! Integer canvas rectangles.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in canvas pixels, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width in pixels.
    pub width: u64,
    /// Height in pixels.
    pub height: u64,
}

impl Rect {
    /// Create a rectangle from origin and size.
    #[must_use]
    pub const fn new(x: i64, y: i64, width: u64, height: u64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from corner coordinates; inverted corners give an empty rect.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn from_corners(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self::new(x0, y0, (x1 - x0).max(0) as u64, (y1 - y0).max(0) as u64)
    }

    /// Exclusive right edge.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    /// Exclusive bottom edge.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    /// Area in pixels.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width * self.height
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with another rectangle, `None` when they do not overlap.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Self::from_corners(x0, y0, x1, y1))
    }

    /// Clip to a `width × height` canvas anchored at the origin.
    #[must_use]
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        self.intersection(&Self::new(0, 0, u64::from(width), u64::from(height)))
    }
}
