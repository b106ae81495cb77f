//! # Configuration
//!
//! World settings and chunk builder tuning, loaded from JSON.
//!
//! Every field has a default, so an empty object (`{}`) is a valid settings
//! file.
//!
//! ```
//! use voxel_chunk_builder::config::WorldSettings;
//!
//! let settings = WorldSettings::from_json_str(r#"{ "seed": 42, "builder": { "pool_capacity": 8 } }"#).unwrap();
//! assert_eq!(settings.seed, 42);
//! assert_eq!(settings.builder.pool_capacity, 8);
//! assert_eq!(settings.builder.worker_thread_name, "chunk-builder");
//! ```

use std::{fs, path::Path};

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Initial parameters of a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Display name of the world.
    pub name: String,
    /// Seed fed to the terrain generator.
    pub seed: u32,
    /// Player spawn position in world space.
    pub player_position: [f32; 3],
    /// Chunk builder tuning.
    pub builder: ChunkBuilderConfig,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            name: String::from("New World"),
            seed: 0,
            player_position: [0.0, 128.0, 0.0],
            builder: ChunkBuilderConfig::default(),
        }
    }
}

impl WorldSettings {
    /// Parses settings from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serializes the settings as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The spawn position as a point.
    pub fn player_point(&self) -> Point3<f32> {
        let [x, y, z] = self.player_position;
        Point3::new(x, y, z)
    }
}

/// Tuning knobs for the [`ChunkBuilder`](crate::engine_state::voxels::tasks::chunk_builder::ChunkBuilder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkBuilderConfig {
    /// Name given to the worker thread.
    pub worker_thread_name: String,
    /// Maximum number of idle chunks the pool keeps. Chunks recycled past
    /// this bound are dropped.
    pub pool_capacity: usize,
    /// Number of chunks allocated into the pool up front.
    pub prewarm_chunks: usize,
}

impl Default for ChunkBuilderConfig {
    fn default() -> Self {
        ChunkBuilderConfig {
            worker_thread_name: String::from("chunk-builder"),
            pool_capacity: 256,
            prewarm_chunks: 0,
        }
    }
}
