//! Vehicle model
//!
//! Arcade kinematics, not dynamics:
//!   - Scalar speed along the heading, integrated once per tick
//!   - Throttle / reverse add a fixed acceleration, coasting applies friction
//!   - Turn authority scales with speed, so a stationary car cannot pivot
//!   - Position is hard-clamped to the world (no bounce)

use drivesim_common::VehicleConfig;

use super::draw::{palette, DrawList, Viewport};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Below this |speed| friction snaps the car to a standstill
pub const STOP_EPSILON: f32 = 0.1;
/// Minimum |speed| before steering has any effect
pub const MIN_TURN_SPEED: f32 = 0.5;
/// Internal speed units → km/h-like display units
pub const DISPLAY_SPEED_FACTOR: f32 = 10.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Control flags polled every tick. Keyboard state and held on-screen
/// buttons both end up here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub accelerate: bool,
    pub reverse: bool,
    pub turn_left: bool,
    pub turn_right: bool,
}

/// World extent the vehicle is clamped into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

/// Position + heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Radians, 0 = east, growing clockwise on screen
    pub heading: f32,
}

/// Per-tick tunables, taken from config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleTuning {
    pub acceleration: f32,
    pub friction: f32,
    pub turn_rate: f32,
    pub max_speed: f32,
}

impl VehicleTuning {
    pub fn from_config(cfg: &VehicleConfig) -> Self {
        Self {
            acceleration: cfg.acceleration,
            friction: cfg.friction,
            turn_rate: cfg.turn_rate,
            max_speed: cfg.max_speed,
        }
    }

    pub fn max_reverse(&self) -> f32 {
        self.max_speed / 2.0
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    /// Positive = forward, negative = reverse
    pub speed: f32,
    pub width: f32,
    pub height: f32,
    pub tuning: VehicleTuning,
    /// Total distance actually covered since the last reset
    pub odometer: f32,
    spawn: Pose,
}

impl Vehicle {
    pub fn new(cfg: &VehicleConfig, spawn: Pose) -> Self {
        Self {
            x: spawn.x,
            y: spawn.y,
            heading: spawn.heading,
            speed: 0.0,
            width: cfg.width,
            height: cfg.height,
            tuning: VehicleTuning::from_config(cfg),
            odometer: 0.0,
            spawn,
        }
    }

    /// Back to the spawn pose, at rest
    pub fn reset(&mut self) {
        self.x = self.spawn.x;
        self.y = self.spawn.y;
        self.heading = self.spawn.heading;
        self.speed = 0.0;
        self.odometer = 0.0;
    }

    pub fn pose(&self) -> Pose {
        Pose {
            x: self.x,
            y: self.y,
            heading: self.heading,
        }
    }

    /// Clamp margins: half the footprint on each axis
    pub fn margins(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Advance one tick. Returns the distance moved (0 when frozen or
    /// pinned against the world edge).
    pub fn advance(&mut self, controls: Controls, frozen: bool, bounds: WorldBounds) -> f32 {
        if frozen {
            return 0.0;
        }

        let t = self.tuning;

        // --- Throttle / reverse / coast ---
        if controls.accelerate && self.speed < t.max_speed {
            self.speed = (self.speed + t.acceleration).min(t.max_speed);
        } else if controls.reverse && self.speed > -t.max_reverse() {
            self.speed = (self.speed - t.acceleration).max(-t.max_reverse());
        } else {
            self.speed *= t.friction;
            if self.speed.abs() < STOP_EPSILON {
                self.speed = 0.0;
            }
        }

        // --- Steering ---
        if self.speed.abs() > MIN_TURN_SPEED {
            let authority = t.turn_rate * (self.speed.abs() / t.max_speed);
            if controls.turn_left {
                self.heading -= authority;
            }
            if controls.turn_right {
                self.heading += authority;
            }
            self.heading = self.heading.rem_euclid(std::f32::consts::TAU);
        }

        // --- Movement ---
        let (old_x, old_y) = (self.x, self.y);
        self.x += self.heading.cos() * self.speed;
        self.y += self.heading.sin() * self.speed;
        self.clamp_to(bounds);

        let moved = ((self.x - old_x).powi(2) + (self.y - old_y).powi(2)).sqrt();
        self.odometer += moved;
        moved
    }

    fn clamp_to(&mut self, bounds: WorldBounds) {
        let (mx, my) = self.margins();
        self.x = self.x.clamp(mx, (bounds.width - mx).max(mx));
        self.y = self.y.clamp(my, (bounds.height - my).max(my));
    }

    /// Speed as shown on the HUD
    pub fn display_speed(&self) -> u32 {
        (self.speed.abs() * DISPLAY_SPEED_FACTOR).round() as u32
    }

    /// Rotated footprint corners (front-left, front-right, rear-right, rear-left)
    pub fn corners(&self) -> [(f32, f32); 4] {
        let (c, s) = (self.heading.cos(), self.heading.sin());
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let local = [(hw, -hh), (hw, hh), (-hw, hh), (-hw, -hh)];
        local.map(|(lx, ly)| (self.x + lx * c - ly * s, self.y + lx * s + ly * c))
    }

    /// Body plus a windshield strip toward the front
    pub fn render(&self, viewport: &Viewport, out: &mut DrawList) {
        let body: Vec<(f32, f32)> = self
            .corners()
            .iter()
            .map(|&(x, y)| viewport.to_screen(x, y))
            .collect();
        out.polygon(body, palette::VEHICLE);

        let (c, s) = (self.heading.cos(), self.heading.sin());
        let hw = self.width / 2.0;
        let hh = self.height / 2.0 - 3.0;
        let shield = [
            (hw * 0.55, -hh),
            (hw * 0.85, -hh),
            (hw * 0.85, hh),
            (hw * 0.55, hh),
        ];
        let shield: Vec<(f32, f32)> = shield
            .iter()
            .map(|&(lx, ly)| viewport.to_screen(self.x + lx * c - ly * s, self.y + lx * s + ly * c))
            .collect();
        out.polygon(shield, palette::WINDSHIELD);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
