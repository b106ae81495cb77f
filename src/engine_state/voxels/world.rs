//! # World Module
//!
//! The host side of chunk building.
//!
//! The [`World`] trait is everything the chunk builder asks of its host: where
//! the player is, what blocks mean for lighting, and how to generate terrain.
//! [`VoxelWorld`] is an in-memory implementation that also stores the chunks
//! the main loop has consumed.
//!
//! ## Thread Safety
//!
//! A world is shared between the main loop and the builder's worker thread
//! behind an `Arc`, so every mutable part of `VoxelWorld` sits behind an
//! `MtResource`.

use std::collections::HashMap;

use cgmath::Point3;

use crate::config::WorldSettings;
use crate::core::MtResource;

use super::block::{BlockTable, DefaultBlockTable};
use super::chunk::{Chunk, ChunkPos};
use super::generation::{EmptyTerrainGenerator, PerlinTerrainGenerator, TerrainGenerator};

/// Services the chunk builder consumes from its host world.
pub trait World: Send + Sync {
    /// Current player position in world space. Only x and z are used for
    /// build prioritization.
    fn player_position(&self) -> Point3<f32>;

    /// Per-block-type lighting queries.
    fn block_table(&self) -> &dyn BlockTable;

    /// Terrain generation entry point.
    fn terrain_generator(&self) -> &dyn TerrainGenerator;
}

/// An in-memory voxel world.
///
/// # Examples
///
/// ```
/// use voxel_chunk_builder::config::WorldSettings;
/// use voxel_chunk_builder::engine_state::voxels::world::{VoxelWorld, World};
/// use cgmath::Point3;
///
/// let world = VoxelWorld::new(WorldSettings::default());
/// world.set_player_position(Point3::new(40.0, 70.0, -8.0));
/// assert_eq!(world.player_position().x, 40.0);
/// assert_eq!(world.chunk_count(), 0);
/// ```
pub struct VoxelWorld {
    settings: WorldSettings,
    player_position: MtResource<Point3<f32>>,
    block_table: Box<dyn BlockTable>,
    generator: Box<dyn TerrainGenerator>,
    /// Chunks handed over by the main loop, keyed by position.
    chunks: MtResource<HashMap<ChunkPos, Chunk>>,
}

impl VoxelWorld {
    /// Creates a world with Perlin terrain seeded from the settings.
    pub fn new(settings: WorldSettings) -> Self {
        let generator = PerlinTerrainGenerator::new(settings.seed);
        Self::with_generator(settings, generator)
    }

    /// Creates a world with a custom terrain generator and the default block table.
    pub fn with_generator(
        settings: WorldSettings,
        generator: impl TerrainGenerator + 'static,
    ) -> Self {
        VoxelWorld {
            player_position: MtResource::new(settings.player_point()),
            settings,
            block_table: Box::new(DefaultBlockTable),
            generator: Box::new(generator),
            chunks: MtResource::new(HashMap::new()),
        }
    }

    /// Creates a world whose chunks are all air.
    pub fn empty() -> Self {
        Self::with_generator(WorldSettings::default(), EmptyTerrainGenerator)
    }

    /// Replaces the block table.
    pub fn with_block_table(mut self, block_table: impl BlockTable + 'static) -> Self {
        self.block_table = Box::new(block_table);
        self
    }

    /// The settings this world was created from.
    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Moves the player.
    pub fn set_player_position(&self, position: Point3<f32>) {
        *self.player_position.get_mut() = position;
    }

    /// Stores a consumed chunk, returning any chunk it replaced.
    pub fn insert_chunk(&self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.get_mut().insert(chunk.position(), chunk)
    }

    /// Removes a chunk, typically to recycle it.
    pub fn remove_chunk(&self, position: ChunkPos) -> Option<Chunk> {
        self.chunks.get_mut().remove(&position)
    }

    /// Whether a chunk is stored at `position`.
    pub fn contains_chunk(&self, position: ChunkPos) -> bool {
        self.chunks.get().contains_key(&position)
    }

    /// Number of stored chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.get().len()
    }

    /// Runs `f` against the chunk at `position`, if stored.
    pub fn with_chunk<R>(&self, position: ChunkPos, f: impl FnOnce(&Chunk) -> R) -> Option<R> {
        self.chunks.get().get(&position).map(f)
    }

    /// Positions of stored chunks farther than `radius` chunks from `center`
    /// on either axis.
    pub fn chunks_outside(&self, center: ChunkPos, radius: i32) -> Vec<ChunkPos> {
        self.chunks
            .get()
            .keys()
            .filter(|pos| {
                (pos.x() - center.x()).abs() > radius || (pos.z() - center.z()).abs() > radius
            })
            .copied()
            .collect()
    }
}

impl World for VoxelWorld {
    fn player_position(&self) -> Point3<f32> {
        *self.player_position.get()
    }

    fn block_table(&self) -> &dyn BlockTable {
        self.block_table.as_ref()
    }

    fn terrain_generator(&self) -> &dyn TerrainGenerator {
        self.generator.as_ref()
    }
}
