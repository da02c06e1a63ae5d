//! A single vehicle: motion, body corners, sensors and the alive flag.

use crate::collision;
use crate::config::{HALF_EXTENT, SENSOR_COUNT};
use crate::kinematics::{Motion, Point};
use crate::sensor::{self, RayHit, SensorReadings};
use crate::track::Track;

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub motion: Motion,
    pub corners: [Point; 4],
    hits: [RayHit; SENSOR_COUNT],
    readings: SensorReadings,
    alive: bool,
}

impl Vehicle {
    pub fn new(position: Point) -> Self {
        let motion = Motion::new(position);
        let corners = collision::corners(motion.center, motion.heading);
        Self {
            motion,
            corners,
            hits: [RayHit::default(); SENSOR_COUNT],
            readings: [0; SENSOR_COUNT],
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Last readings; zero until the first update, frozen after a crash.
    pub fn readings(&self) -> &SensorReadings {
        &self.readings
    }

    pub fn ray_hits(&self) -> &[RayHit; SENSOR_COUNT] {
        &self.hits
    }

    pub fn position(&self) -> Point {
        self.motion.position
    }

    pub fn center(&self) -> Point {
        self.motion.center
    }

    pub fn heading(&self) -> f64 {
        self.motion.heading
    }

    pub fn speed(&self) -> f64 {
        self.motion.speed
    }

    pub fn distance_traveled(&self) -> f64 {
        self.motion.distance_traveled
    }

    pub fn time_elapsed(&self) -> u32 {
        self.motion.time_elapsed
    }

    /// Move, test the body against the track, then rescan. Dead vehicles stay put.
    pub fn update(&mut self, track: &Track) {
        if !self.alive {
            return;
        }
        // both axes clamp against the track width
        self.motion.step(track.width() as f64);

        self.corners = collision::corners(self.motion.center, self.motion.heading);
        if collision::hits_obstacle(track, &self.corners) {
            self.alive = false;
        }

        self.hits = sensor::scan(track, self.motion.center, self.motion.heading);
        self.readings = sensor::readings(&self.hits);
    }

    /// Cumulative distance scaled by the half width.
    pub fn reward(&self) -> f64 {
        self.motion.distance_traveled / HALF_EXTENT
    }
}
