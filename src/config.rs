//! Track geometry, vehicle constants and the run configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const TRACK_WIDTH: u32 = 1920;
pub const TRACK_HEIGHT: u32 = 1080;

pub const VEHICLE_WIDTH: f64 = 60.0;
pub const HALF_EXTENT: f64 = VEHICLE_WIDTH / 2.0;

/// Ray angles relative to heading, in degrees. Reading `i` belongs to offset `i`.
pub const SENSOR_OFFSETS: [f64; 5] = [-90.0, -45.0, 0.0, 45.0, 90.0];
pub const SENSOR_COUNT: usize = SENSOR_OFFSETS.len();
pub const SENSOR_RANGE: u32 = 300;
pub const SENSOR_SCALE: u32 = 30;

/// Corner angles relative to heading. 30 and 330 lead, 150 and 210 trail.
pub const CORNER_OFFSETS: [f64; 4] = [30.0, 150.0, 210.0, 330.0];

pub const START_SPEED: f64 = 20.0;
pub const MIN_SPEED: f64 = 12.0;
pub const SPEED_STEP: f64 = 2.0;
pub const TURN_STEP: f64 = 10.0;

pub const BOUNDARY_LOW: f64 = 20.0;
pub const BOUNDARY_HIGH_MARGIN: f64 = 120.0;

pub const TICKS_PER_SECOND: u32 = 30;
pub const MAX_TICKS: u32 = TICKS_PER_SECOND * 40;

/// Opaque white marks a crash pixel in the track asset.
pub const CRASH_COLOR: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub population_size: usize,
    pub generations: u64,
    pub max_ticks: u32,
    pub start_position: (f64, f64),
    /// Run per-agent tick work on the rayon pool.
    pub parallel: bool,
    pub seed: Option<u64>,
    pub hidden_neurons: usize,
    /// Probability that a single weight is perturbed during reproduction.
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            generations: 1000,
            max_ticks: MAX_TICKS,
            start_position: (830.0, 920.0),
            parallel: false,
            seed: None,
            hidden_neurons: 6,
            mutation_rate: 0.2,
            mutation_sigma: 0.5,
        }
    }
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::Invalid("population_size must be non-zero".into()));
        }
        if self.generations == 0 {
            return Err(ConfigError::Invalid("generations must be non-zero".into()));
        }
        if self.max_ticks == 0 {
            return Err(ConfigError::Invalid("max_ticks must be non-zero".into()));
        }
        if self.hidden_neurons == 0 {
            return Err(ConfigError::Invalid("hidden_neurons must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::Invalid(format!(
                "mutation_rate {} must be between 0.0 and 1.0",
                self.mutation_rate
            )));
        }
        if !self.mutation_sigma.is_finite() || self.mutation_sigma < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "mutation_sigma {} must be a non-negative number",
                self.mutation_sigma
            )));
        }
        Ok(())
    }
}
