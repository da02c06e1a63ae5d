//! Per-tick motion integration with boundary clamping.

use crate::config::{BOUNDARY_HIGH_MARGIN, BOUNDARY_LOW, HALF_EXTENT, START_SPEED};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Unit vector for an angle in degrees.
///
/// The angle goes through `360 - angle` before the trig calls, so a growing
/// heading turns counter-clockwise on screen (y grows downwards). Sensors and
/// corners use the same transform.
pub fn direction(angle: f64) -> (f64, f64) {
    let rad = (360.0 - angle).to_radians();
    (rad.cos(), rad.sin())
}

/// Reference point for the vehicle body: the truncated position offset by the half extent.
pub fn center_of(position: Point) -> Point {
    Point::new(position.x.trunc() + HALF_EXTENT, position.y.trunc() + HALF_EXTENT)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub position: Point,
    pub center: Point,
    /// Degrees, never wrapped.
    pub heading: f64,
    pub speed: f64,
    pub distance_traveled: f64,
    pub time_elapsed: u32,
    speed_initialized: bool,
}

impl Motion {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            center: center_of(position),
            heading: 0.0,
            speed: 0.0,
            distance_traveled: 0.0,
            time_elapsed: 0,
            speed_initialized: false,
        }
    }

    pub fn speed_initialized(&self) -> bool {
        self.speed_initialized
    }

    /// Advance one tick. Both axes clamp against the same `limit`.
    pub fn step(&mut self, limit: f64) {
        if !self.speed_initialized {
            self.speed = START_SPEED;
            self.speed_initialized = true;
        }

        let high = limit - BOUNDARY_HIGH_MARGIN;
        let (dx, dy) = direction(self.heading);

        self.position.x = (self.position.x + dx * self.speed).max(BOUNDARY_LOW).min(high);

        self.distance_traveled += self.speed;
        self.time_elapsed += 1;

        self.position.y = (self.position.y + dy * self.speed).max(BOUNDARY_LOW).min(high);

        self.center = center_of(self.position);
    }
}
