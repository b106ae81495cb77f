//! # Engine State Module
//!
//! Headless main-loop coordinator around the chunk builder.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the world and the builder and streams chunks around the player
//! * `task_management` - The single-worker scheduler the builder runs on
//! * `voxels` - Blocks, chunks, lighting, generation and the chunk builder itself
//!
//! ## Per-Tick Flow
//!
//! 1. The player position is published to the builder
//! 2. When the player enters a new chunk, every chunk within the load radius
//!    that is neither loaded nor requested is queued
//! 3. Finished chunks are drained into the world, and positions whose build
//!    failed are forgotten so the next request around the player retries them
//! 4. Loaded chunks that fell outside the radius are recycled

use std::{collections::HashSet, sync::Arc};

use cgmath::Point3;
use log::{debug, info};

use crate::{config::WorldSettings, error::BuildError};
use voxels::{
    chunk::{Chunk, ChunkPos, CHUNK_WIDTH},
    tasks::chunk_builder::ChunkBuilder,
    world::{VoxelWorld, World},
};

pub mod task_management;
pub mod voxels;

/// Default load radius around the player, in chunks.
pub const LOAD_DISTANCE: i32 = 2;

/// Counters reported after each tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Chunks requested this tick.
    pub requested: usize,
    /// Built chunks moved into the world this tick.
    pub received: usize,
    /// Requests whose build failed, reported this tick.
    pub failed: usize,
    /// Chunks recycled this tick.
    pub recycled: usize,
}

/// The main state container: one world, one builder, and the set of
/// positions currently being built.
pub struct EngineState {
    world: Arc<VoxelWorld>,
    chunk_builder: ChunkBuilder,
    requested: HashSet<ChunkPos>,
    load_distance: i32,
    current_player_chunk: Option<ChunkPos>,
}

impl EngineState {
    /// Creates the world from `settings` and starts the chunk builder.
    ///
    /// # Arguments
    /// * `settings` - World and builder configuration
    /// * `load_distance` - Chunks kept loaded on each side of the player's chunk
    pub fn new(settings: WorldSettings, load_distance: i32) -> Result<Self, BuildError> {
        let world = Arc::new(VoxelWorld::new(settings));
        Self::with_world(world, load_distance)
    }

    /// Starts a chunk builder on an existing world.
    pub fn with_world(world: Arc<VoxelWorld>, load_distance: i32) -> Result<Self, BuildError> {
        let mut chunk_builder = ChunkBuilder::new(&world.settings().builder);
        chunk_builder.initialize(world.clone())?;

        info!(
            "Engine state created for world '{}' with load distance {}",
            world.settings().name,
            load_distance
        );

        Ok(EngineState {
            world,
            chunk_builder,
            requested: HashSet::new(),
            load_distance,
            current_player_chunk: None,
        })
    }

    /// The world chunks are streamed into.
    pub fn world(&self) -> &Arc<VoxelWorld> {
        &self.world
    }

    /// The chunk builder.
    pub fn chunk_builder(&self) -> &ChunkBuilder {
        &self.chunk_builder
    }

    /// Number of positions requested but not yet received.
    pub fn in_flight_count(&self) -> usize {
        self.requested.len()
    }

    /// Moves the player in the world.
    pub fn move_player(&self, position: Point3<f32>) {
        self.world.set_player_position(position);
    }

    /// Runs one main-loop tick.
    pub fn tick(&mut self) -> TickStats {
        self.chunk_builder.update();

        let mut stats = TickStats::default();
        let player = self.world.player_position();
        let player_chunk = ChunkPos::from_world(
            player.x.floor() as i32,
            player.z.floor() as i32,
        );

        for position in self.chunk_builder.take_failed_positions() {
            self.requested.remove(&position);
            stats.failed += 1;
        }

        if self.current_player_chunk != Some(player_chunk) {
            stats.requested = self.request_around(player_chunk);
            self.current_player_chunk = Some(player_chunk);
        }

        let world = &self.world;
        let requested = &mut self.requested;
        let chunk_builder = &self.chunk_builder;
        stats.received = chunk_builder.get_built_chunks(Some(|chunk: Chunk| {
            requested.remove(&chunk.position());
            if let Some(replaced) = world.insert_chunk(chunk) {
                chunk_builder.recycle_chunk(replaced);
            }
        }));

        for position in self.world.chunks_outside(player_chunk, self.load_distance) {
            if let Some(chunk) = self.world.remove_chunk(position) {
                self.chunk_builder.recycle_chunk(chunk);
                stats.recycled += 1;
            }
        }

        if stats != TickStats::default() {
            debug!(
                "Tick: requested {}, received {}, failed {}, recycled {}, {} loaded",
                stats.requested,
                stats.received,
                stats.failed,
                stats.recycled,
                self.world.chunk_count()
            );
        }
        stats
    }

    /// Queues every position around `center` that is neither loaded nor in flight.
    fn request_around(&mut self, center: ChunkPos) -> usize {
        let mut count = 0;
        for x in -self.load_distance..=self.load_distance {
            for z in -self.load_distance..=self.load_distance {
                let position = ChunkPos::new(center.x() + x, center.z() + z);
                if self.world.contains_chunk(position) || self.requested.contains(&position) {
                    continue;
                }
                if self.chunk_builder.build_chunk(position) {
                    self.requested.insert(position);
                    count += 1;
                }
            }
        }
        count
    }

    /// Stops the builder. Requests that never started are forgotten.
    pub fn shutdown(&mut self) -> Vec<ChunkPos> {
        let abandoned = self.chunk_builder.shutdown();
        for position in &abandoned {
            self.requested.remove(position);
        }
        abandoned
    }
}

/// World-space coordinate of the centre of a chunk, handy for moving the
/// player onto a given chunk.
pub fn chunk_center(position: ChunkPos, y: f32) -> Point3<f32> {
    let half = CHUNK_WIDTH as f32 / 2.0;
    let (origin_x, origin_z) = position.world_origin();
    Point3::new(origin_x as f32 + half, y, origin_z as f32 + half)
}
