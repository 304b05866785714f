//! Error kinds raised by the simulation.

use thiserror::Error;

/// Invalid or unreadable configuration; fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures of the end-of-day reproduction step
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvolutionError {
    /// No creature ate two candies, so nobody can reproduce
    #[error("population extinct: no eligible parents")]
    NoEligibleParents,
}

/// Errors surfaced by a running simulation
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Evolution(#[from] EvolutionError),

    #[error("population went extinct at generation {generation}")]
    Extinct { generation: u64 },

    #[error(transparent)]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),
}
