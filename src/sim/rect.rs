//! Axis-aligned rectangle geometry for world-space entities
//!
//! World space has Y increasing downward. A rectangle is stored as its
//! top-left corner plus size, matching how the camera and chunks describe
//! vertical extents.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rectangle of the given size centered on `center`
    pub fn from_center(center: DVec2, w: f64, h: f64) -> Self {
        Self {
            x: center.x - w / 2.0,
            y: center.y - h / 2.0,
            w,
            h,
        }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        self.x + self.w / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f64 {
        self.y + self.h / 2.0
    }

    pub fn set_center_x(&mut self, cx: f64) {
        self.x = cx - self.w / 2.0;
    }

    pub fn translated(&self, offset: DVec2) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..*self
        }
    }

    /// Strict overlap test; touching edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Same center, each side scaled by `ratio`
    pub fn scaled(&self, ratio: f64) -> Self {
        Self::from_center(self.center(), self.w * ratio, self.h * ratio)
    }

    /// Grow vertically by `margin` on both top and bottom
    /// True if the half-open interval `[top, bottom)` overlaps this rect vertically
    pub fn overlaps_span_y(&self, top: f64, bottom: f64) -> bool {
        top < self.bottom() && self.top() < bottom
    }

    /// True if `x` lies within `[left, right]`
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.left() && x <= self.right()
    }
}
