//! 2D camera with dead-zone tracking and interpolated queries
//!
//! The camera position is the top-left corner of the viewport in world
//! space. `previous_position` is a one-step lag buffer so rendering can blend
//! between the last two simulation ticks.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;

/// Clamp range for the camera; infinite sides are unbounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl WorldBounds {
    pub fn unbounded() -> Self {
        Self {
            min: DVec2::splat(f64::NEG_INFINITY),
            max: DVec2::splat(f64::INFINITY),
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self {
            min: DVec2::new(rect.left(), rect.top()),
            max: DVec2::new(rect.right(), rect.bottom()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    position: DVec2,
    previous_position: DVec2,
    viewport: DVec2,
    /// Dead-zone rectangle relative to the viewport's top-left corner
    deadzone: Rect,
    bounds: WorldBounds,
}

impl Camera {
    /// Create a camera at the origin.
    ///
    /// `deadzone` defaults to a centered box covering 40% of the viewport.
    pub fn new(viewport: DVec2, bounds: WorldBounds, deadzone: Option<Rect>) -> Self {
        let mut camera = Self {
            position: DVec2::ZERO,
            previous_position: DVec2::ZERO,
            viewport,
            deadzone: Rect::default(),
            bounds,
        };
        camera.set_deadzone(deadzone);
        camera.clamp_to_world();
        camera.previous_position = camera.position;
        camera
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn previous_position(&self) -> DVec2 {
        self.previous_position
    }

    pub fn deadzone(&self) -> Rect {
        self.deadzone
    }

    /// Configure the dead-zone, forcing it inside the viewport
    pub fn set_deadzone(&mut self, deadzone: Option<Rect>) {
        let vw = self.viewport.x;
        let vh = self.viewport.y;
        let mut rect = deadzone.unwrap_or_else(|| {
            let w = vw * 0.4;
            let h = vh * 0.4;
            Rect::new((vw - w) / 2.0, (vh - h) / 2.0, w, h)
        });

        rect.w = rect.w.clamp(1.0_f64.min(vw), vw);
        rect.h = rect.h.clamp(1.0_f64.min(vh), vh);
        rect.x = rect.x.clamp(0.0, vw - rect.w);
        rect.y = rect.y.clamp(0.0, vh - rect.h);
        self.deadzone = rect;
    }

    /// Hard snap; the reset frame has no interpolation lag
    pub fn move_to(&mut self, position: DVec2) {
        self.position = position;
        self.clamp_to_world();
        self.previous_position = self.position;
    }

    /// Shift the camera by exactly the amount the target's center lies
    /// outside the dead-zone on each axis.
    pub fn follow(&mut self, target: &Rect) {
        self.previous_position = self.position;

        let relative = target.center() - self.position;
        let dz = self.deadzone;

        let dx = if relative.x < dz.left() {
            relative.x - dz.left()
        } else if relative.x > dz.right() {
            relative.x - dz.right()
        } else {
            0.0
        };

        let dy = if relative.y < dz.top() {
            relative.y - dz.top()
        } else if relative.y > dz.bottom() {
            relative.y - dz.bottom()
        } else {
            0.0
        };

        if dx != 0.0 || dy != 0.0 {
            self.position += DVec2::new(dx, dy);
            self.clamp_to_world();
        }
    }

    /// Camera offset blended between the previous and current tick
    pub fn offset(&self, interpolation: f64) -> DVec2 {
        let t = interpolation.clamp(0.0, 1.0);
        if t == 1.0 {
            self.position
        } else if t == 0.0 {
            self.previous_position
        } else {
            self.previous_position.lerp(self.position, t)
        }
    }

    /// World-space rectangle currently visible
    pub fn view_rect(&self, interpolation: f64) -> Rect {
        let offset = self.offset(interpolation);
        Rect::new(offset.x, offset.y, self.viewport.x, self.viewport.y)
    }

    pub fn world_to_screen(&self, world: DVec2, interpolation: f64) -> DVec2 {
        world - self.offset(interpolation)
    }

    pub fn screen_to_world(&self, screen: DVec2, interpolation: f64) -> DVec2 {
        screen + self.offset(interpolation)
    }

    fn clamp_to_world(&mut self) {
        self.position.x = clamp_axis(
            self.position.x,
            self.bounds.min.x,
            self.bounds.max.x,
            self.viewport.x,
        );
        self.position.y = clamp_axis(
            self.position.y,
            self.bounds.min.y,
            self.bounds.max.y,
            self.viewport.y,
        );
    }
}

/// Clamp one axis so the viewport stays inside `[min, max]`.
///
/// A viewport larger than the bounds pins the camera to `min`.
fn clamp_axis(pos: f64, min: f64, max: f64, extent: f64) -> f64 {
    if !min.is_finite() && !max.is_finite() {
        return pos;
    }
    let max_allowed = max - extent;
    if max_allowed < min {
        min
    } else {
        pos.max(min).min(max_allowed)
    }
}
