//! Smoothed follow camera
//!
//! Each tick the target is set so the vehicle sits in the middle of the
//! viewport, and the position eases toward it by `smoothing`. The position
//! is clamped so the viewport never shows anything outside the world.

use super::draw::Viewport;
use super::vehicle::WorldBounds;

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    /// Fraction of the remaining distance covered per tick, in (0, 1]
    pub smoothing: f32,
    world: WorldBounds,
}

impl Camera {
    pub fn new(smoothing: f32, world: WorldBounds) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            target_x: 0.0,
            target_y: 0.0,
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
            world,
        }
    }

    /// Ease toward centering (`vx`, `vy`) in a `view_w` x `view_h` viewport
    pub fn follow(&mut self, vx: f32, vy: f32, view_w: f32, view_h: f32) {
        self.target_x = vx - view_w / 2.0;
        self.target_y = vy - view_h / 2.0;
        self.x += (self.target_x - self.x) * self.smoothing;
        self.y += (self.target_y - self.y) * self.smoothing;
        self.clamp(view_w, view_h);
    }

    /// Jump straight to the centered position (start / restart)
    pub fn snap_to(&mut self, vx: f32, vy: f32, view_w: f32, view_h: f32) {
        self.target_x = vx - view_w / 2.0;
        self.target_y = vy - view_h / 2.0;
        self.x = self.target_x;
        self.y = self.target_y;
        self.clamp(view_w, view_h);
    }

    fn clamp(&mut self, view_w: f32, view_h: f32) {
        // A viewport larger than the world pins to the origin
        let max_x = (self.world.width - view_w).max(0.0);
        let max_y = (self.world.height - view_h).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
        self.y = self.y.clamp(0.0, max_y);
    }

    pub fn viewport(&self, view_w: f32, view_h: f32) -> Viewport {
        Viewport {
            x: self.x,
            y: self.y,
            width: view_w,
            height: view_h,
        }
    }
}
