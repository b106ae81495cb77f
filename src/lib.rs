#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Chunk Builder
//!
//! Background generation and sky lighting of voxel terrain chunks, prioritized
//! by distance to a moving player.
//!
//! ## Key Modules
//!
//! * `core` - Shared-state and lock-free primitives used across threads
//! * `engine_state` - The work scheduler, voxel data, and the chunk builder
//! * `config` - World and builder settings loaded from JSON
//! * `error` - Error types for every fallible operation
//!
//! ## Architecture
//!
//! A generic single-worker scheduler picks, every time it becomes free, the
//! pending item ranked best by a strategy trait. The chunk builder plugs a
//! strategy into it that ranks chunk positions by squared distance to the
//! player's last published position, builds each chunk from a pool, and hands
//! finished chunks back through a queue the main loop drains once per tick.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use voxel_chunk_builder::{config::WorldSettings, engine_state::EngineState};
//!
//! voxel_chunk_builder::init_logging();
//! let mut engine = EngineState::new(WorldSettings::default(), 2).unwrap();
//! loop {
//!     engine.tick();
//! }
//! ```

use log::info;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

/// Initializes `env_logger` on stdout, filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let initialized = env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init()
        .is_ok();

    if initialized {
        info!("Logger initialized");
    }
}
