use thiserror::Error;

/// Contract violations detected while advancing a generation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("policy for agent {agent} returned {len} outputs, expected at least {expected}")]
    PolicyOutput { agent: usize, len: usize, expected: usize },
    #[error("policy for agent {agent} returned a NaN output")]
    NonFiniteOutput { agent: usize },
    #[error("population has {vehicles} vehicles but {policies} policies and {fitness} fitness slots")]
    PopulationMismatch { vehicles: usize, policies: usize, fitness: usize },
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to decode track image: {0}")]
    Image(#[from] image::ImageError),
    #[error("track has zero-sized dimensions {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("track buffer holds {actual} cells, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode checkpoint: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("checkpoint policy has {weights} weights, which does not fit {hidden} hidden units")]
    Shape { hidden: usize, weights: usize },
}
