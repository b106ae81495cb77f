//! # Errors
//!
//! Typed errors for the scheduler, the chunk builder, chunk access and
//! configuration loading.

use std::io;

use thiserror::Error;

use crate::engine_state::voxels::chunk::{ChunkPos, ChunkState};

/// Errors raised while starting or driving a [`WorkScheduler`](crate::engine_state::task_management::WorkScheduler).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The operating system refused to spawn the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),

    /// The scheduler has been shut down and cannot be restarted.
    #[error("scheduler has been shut down")]
    ShutDown,
}

/// Errors produced while building a chunk or wiring up the chunk builder.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A build was attempted before a world was bound with `initialize`.
    #[error("no world is bound to the chunk builder")]
    WorldNotBound,

    /// `initialize` was called on a builder that already has a world.
    #[error("chunk builder is already initialized")]
    AlreadyInitialized,

    /// The terrain generator failed to fill a chunk.
    #[error("terrain generation failed for chunk {position}: {reason}")]
    Generation {
        /// Position of the chunk being generated.
        position: ChunkPos,
        /// Human readable failure description.
        reason: String,
    },

    /// The underlying scheduler could not be started.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Errors returned by the checked chunk accessors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkAccessError {
    /// The chunk has not been released to the caller yet.
    #[error("chunk {position} is not accessible in state {state:?}")]
    NotAccessible {
        /// Position of the gated chunk.
        position: ChunkPos,
        /// Lifecycle state the chunk was in.
        state: ChunkState,
    },

    /// Local coordinates fall outside the chunk.
    #[error("local coordinates ({x}, {y}, {z}) are outside the chunk")]
    OutOfBounds {
        /// Local x.
        x: usize,
        /// Local y.
        y: usize,
        /// Local z.
        z: usize,
    },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),

    /// The settings file is not valid JSON for the expected schema.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
