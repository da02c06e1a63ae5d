//! Static collision surface the vehicles drive on.

use crate::config::CRASH_COLOR;
use crate::error::TrackError;
use std::path::Path;
use tracing::info;

/// Immutable crash mask, row-major, one cell per pixel.
#[derive(Debug, Clone)]
pub struct Track {
    width: u32,
    height: u32,
    obstacles: Vec<bool>,
}

impl Track {
    pub fn from_mask(width: u32, height: u32, obstacles: Vec<bool>) -> Result<Self, TrackError> {
        if width == 0 || height == 0 {
            return Err(TrackError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        if obstacles.len() != expected {
            return Err(TrackError::BufferSize { expected, actual: obstacles.len() });
        }
        Ok(Self { width, height, obstacles })
    }

    /// Builds the mask from an RGBA8 buffer; crash-coloured pixels become obstacles.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, TrackError> {
        let expected = width as usize * height as usize;
        if rgba.len() != expected * 4 {
            return Err(TrackError::BufferSize { expected: expected * 4, actual: rgba.len() });
        }
        let obstacles = rgba.chunks_exact(4).map(|px| px == CRASH_COLOR).collect();
        Self::from_mask(width, height, obstacles)
    }

    /// Track with no obstacles at all.
    pub fn open(width: u32, height: u32) -> Result<Self, TrackError> {
        Self::from_mask(width, height, vec![false; width as usize * height as usize])
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        let track = Self::from_rgba(width, height, img.as_raw())?;
        info!(
            path = %path.display(),
            width,
            height,
            obstacles = track.obstacle_count(),
            "Loaded track"
        );
        Ok(track)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Out-of-domain points are never obstacles.
    pub fn is_obstacle(&self, x: i64, y: i64) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        self.obstacles[y as usize * self.width as usize + x as usize]
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.iter().filter(|&&o| o).count()
    }

    /// Builder: marks every cell in the half-open rectangle as an obstacle.
    /// Consumes the track, so a shared `Track` never changes.
    pub fn with_block(mut self, x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        for y in y0.min(self.height)..y1.min(self.height) {
            for x in x0.min(self.width)..x1.min(self.width) {
                self.obstacles[y as usize * self.width as usize + x as usize] = true;
            }
        }
        self
    }
}
