//! Lockstep simulation of sensor-driven vehicles on a raster track, plus an
//! elitist trainer that evolves their policies generation by generation.

pub mod collision;
pub mod config;
pub mod draw;
pub mod error;
pub mod evolve;
pub mod kinematics;
pub mod policy;
pub mod sensor;
pub mod sim;
pub mod track;
pub mod vehicle;

pub use config::SimConfig;
pub use error::{CheckpointError, ConfigError, SimError, TrackError};
pub use policy::{Action, Policy};
pub use sim::{Generation, GenerationContext, GenerationReport, RunState, Termination, run_generation};
pub use track::Track;
pub use vehicle::Vehicle;
