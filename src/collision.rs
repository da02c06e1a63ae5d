//! Oriented bounding box corners and their test against the track.

use crate::config::{CORNER_OFFSETS, HALF_EXTENT};
use crate::kinematics::{Point, direction};
use crate::track::Track;

/// Corners at 30, 150, 210 and 330 degrees off the heading, in that order.
pub fn corners(center: Point, heading: f64) -> [Point; 4] {
    CORNER_OFFSETS.map(|offset| {
        let (dx, dy) = direction(heading + offset);
        Point::new(center.x + dx * HALF_EXTENT, center.y + dy * HALF_EXTENT)
    })
}

/// True when any corner's truncated pixel is an obstacle.
pub fn hits_obstacle(track: &Track, corners: &[Point; 4]) -> bool {
    corners
        .iter()
        .any(|c| track.is_obstacle(c.x as i64, c.y as i64))
}
