//! Five-ray distance sensors cast from the vehicle center.

use crate::config::{SENSOR_COUNT, SENSOR_OFFSETS, SENSOR_RANGE, SENSOR_SCALE};
use crate::kinematics::{Point, direction};
use crate::track::Track;

/// Quantized distances handed to the policy, index-aligned with `SENSOR_OFFSETS`.
pub type SensorReadings = [u32; SENSOR_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RayHit {
    /// Pixel where the march stopped.
    pub end: (i64, i64),
    /// Truncated Euclidean distance from the center to `end`.
    pub distance: u32,
}

impl RayHit {
    pub fn reading(&self) -> u32 {
        quantize(self.distance)
    }
}

pub fn quantize(distance: u32) -> u32 {
    distance / SENSOR_SCALE
}

fn ray_point(center: Point, dx: f64, dy: f64, length: u32) -> (i64, i64) {
    let len = length as f64;
    ((center.x + dx * len) as i64, (center.y + dy * len) as i64)
}

/// March in unit steps until the first obstacle pixel or the range is used up.
pub fn cast_ray(track: &Track, center: Point, angle: f64) -> RayHit {
    let (dx, dy) = direction(angle);
    let mut length = 0;
    let mut end = ray_point(center, dx, dy, length);
    while !track.is_obstacle(end.0, end.1) && length < SENSOR_RANGE {
        length += 1;
        end = ray_point(center, dx, dy, length);
    }
    let (ex, ey) = (end.0 as f64 - center.x, end.1 as f64 - center.y);
    RayHit { end, distance: (ex * ex + ey * ey).sqrt() as u32 }
}

pub fn scan(track: &Track, center: Point, heading: f64) -> [RayHit; SENSOR_COUNT] {
    SENSOR_OFFSETS.map(|offset| cast_ray(track, center, heading + offset))
}

pub fn readings(hits: &[RayHit; SENSOR_COUNT]) -> SensorReadings {
    hits.map(|hit| hit.reading())
}
