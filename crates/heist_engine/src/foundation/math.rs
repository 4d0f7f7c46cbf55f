//! Math utilities and types
//!
//! Provides the 2D math types the collision core works in: vectors from
//! nalgebra and an axis-aligned [`Rect`] in world coordinates.
//!
//! The world uses screen-style coordinates: x grows to the right and y grows
//! downward, so `top` is the smaller y value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Sweep axis used by the dimensional clustering broad phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal axis
    X,
    /// Vertical axis
    Y,
}

impl Axis {
    /// The other axis
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }

    /// Component of `v` along this axis
    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
        }
    }
}

/// Malformed geometry
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// A coordinate or extent is NaN or infinite
    #[error("Non-finite geometry: ({x}, {y}, {w}, {h})")]
    NonFinite {
        /// Left edge
        x: f32,
        /// Top edge
        y: f32,
        /// Width
        w: f32,
        /// Height
        h: f32,
    },

    /// Width or height is negative
    #[error("Negative size: {width} x {height}")]
    NegativeSize {
        /// Width
        width: f32,
        /// Height
        height: f32,
    },

    /// Position is not finite
    #[error("Non-finite position: ({0}, {1})")]
    NonFinitePosition(f32, f32),

    /// Bounding radius is negative or not finite
    #[error("Invalid bounding radius: {0}")]
    InvalidRadius(f32),
}

/// Axis-aligned bounding box in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rect {
    /// Create a rect from its top-left corner and size
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Create a rect of the given size centered on `center`
    pub fn from_center(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w * 0.5, center.y - h * 0.5, w, h)
    }

    /// Left edge
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Top edge
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Near and far edge along an axis
    pub fn span(&self, axis: Axis) -> (f32, f32) {
        match axis {
            Axis::X => (self.left(), self.right()),
            Axis::Y => (self.top(), self.bottom()),
        }
    }

    /// Half of the larger extent, used to pad spatial index queries
    pub fn max_half_extent(&self) -> f32 {
        self.w.max(self.h) * 0.5
    }

    /// Check if this rect overlaps another.
    ///
    /// Rects that only share an edge do not overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() <= other.left()
            || self.left() >= other.right()
            || self.bottom() <= other.top()
            || self.top() >= other.bottom())
    }

    /// Check if a point lies inside the rect (right and bottom edges excluded)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Smallest rect enclosing both
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Grow (or shrink, for negative amounts) the rect around its center
    pub fn inflate(&self, dw: f32, dh: f32) -> Rect {
        Rect::new(self.x - dw * 0.5, self.y - dh * 0.5, self.w + dw, self.h + dh)
    }

    /// Move the rect by an offset
    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }

    /// Reject NaN/infinite coordinates and negative extents
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !(self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()) {
            return Err(GeometryError::NonFinite {
                x: self.x,
                y: self.y,
                w: self.w,
                h: self.h,
            });
        }
        if self.w < 0.0 || self.h < 0.0 {
            return Err(GeometryError::NegativeSize {
                width: self.w,
                height: self.h,
            });
        }
        Ok(())
    }
}
