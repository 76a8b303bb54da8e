//! Error taxonomy for a partitioned run
//!
//! Every failure that can abort a run is one variant of [`FanjoinError`]. The CLI maps
//! each variant to its own process exit code so scripts can tell a bad argument from a
//! worker that could not be started.

use thiserror::Error;

/// Errors that abort a partitioned run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FanjoinError {
    /// Caller error, detected before any worker is spawned
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A worker thread could not be created
    #[error("failed to spawn worker for partition {partition}: {reason}")]
    SpawnFailure { partition: usize, reason: String },

    /// The barrier itself failed while collecting worker completions
    #[error("failed waiting for workers: {0}")]
    WaitFailure(String),

    /// The shared output buffer could not be allocated
    #[error("failed to allocate shared buffer of {requested} slots: {reason}")]
    AllocationFailure { requested: usize, reason: String },

    /// One or more workers terminated abnormally, so their partitions have no answer
    #[error("worker failure in partition(s) {}", format_partitions(.0))]
    WorkerFailure(Vec<usize>),

    /// Malformed numeric argument or matrix cell
    #[error("{0}")]
    Input(String),
}

fn format_partitions(partitions: &[usize]) -> String {
    partitions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FanjoinError {
    /// Process exit code for this error. Zero is never returned.
    pub fn exit_code(&self) -> u8 {
        match self {
            FanjoinError::InvalidArgument(_) => 2,
            FanjoinError::SpawnFailure { .. } => 3,
            FanjoinError::WaitFailure(_) => 4,
            FanjoinError::AllocationFailure { .. } => 5,
            FanjoinError::WorkerFailure(_) => 6,
            FanjoinError::Input(_) => 7,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        FanjoinError::InvalidArgument(message.into())
    }
}

/// Result alias for engine operations
pub type EngineResult<T> = std::result::Result<T, FanjoinError>;
