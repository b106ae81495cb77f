//! # Chunk Module
//!
//! This module provides the `Chunk` struct: the block, sky light and height
//! data of one `CHUNK_WIDTH x CHUNK_HEIGHT x CHUNK_WIDTH` tile of the world.
//!
//! ## Lifecycle
//!
//! ```text
//! Pooled --initialize--> Building --mark_built--> Built --allow_accessing--> Active
//!    ^                                                                          |
//!    +---------------------------------dispose----------------------------------+
//! ```
//!
//! A chunk is filled on the worker thread while `Building`, handed to the main
//! loop while `Built`, and only exposes its data through the checked accessors
//! once `allow_accessing` flipped it to `Active`. The flip is one-way; the only
//! way back is `dispose`, which wipes every array before the chunk is pooled.
//!
//! ## Layout
//!
//! Blocks and light nibbles share one index, `(x * CHUNK_HEIGHT + y) * CHUNK_WIDTH + z`,
//! so a vertical column is a strided walk. The height map is indexed
//! `x * CHUNK_WIDTH + z`.

use std::sync::{Arc, Weak};

use log::warn;

use crate::error::ChunkAccessError;

use super::block::Block;
use super::world::World;

mod chunk_pos;
pub mod nibble_array;
pub mod pool;

pub use chunk_pos::ChunkPos;
pub use nibble_array::NibbleArray;
pub use pool::ChunkPool;

/// Horizontal size of a chunk, in blocks.
pub const CHUNK_WIDTH: usize = 16;
/// Vertical size of a chunk, in blocks. Heights are stored as bytes, so this
/// must not exceed 256.
pub const CHUNK_HEIGHT: usize = 256;
/// Number of vertical columns in a chunk.
pub const CHUNK_COLUMN_COUNT: usize = CHUNK_WIDTH * CHUNK_WIDTH;
/// Number of blocks in a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_COLUMN_COUNT * CHUNK_HEIGHT;
/// Sky light level of open sky.
pub const MAX_SKY_LIGHT: u8 = 15;

/// Index of a block (and its light nibble) within the chunk arrays.
#[inline]
pub const fn block_index(x: usize, y: usize, z: usize) -> usize {
    (x * CHUNK_HEIGHT + y) * CHUNK_WIDTH + z
}

/// Index of a column within the height map.
#[inline]
pub const fn column_index(x: usize, z: usize) -> usize {
    x * CHUNK_WIDTH + z
}

/// Where a chunk is in its build and use cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Reset and idle in the pool.
    Pooled,
    /// Being filled by the worker thread.
    Building,
    /// Finished by the worker, waiting to be released to the caller.
    Built,
    /// Released to the caller; data may be read.
    Active,
}

/// Represents one horizontal tile of the voxel world.
pub struct Chunk {
    position: ChunkPos,
    /// Non-owning link to the world the chunk was built for.
    world: Option<Weak<dyn World>>,
    state: ChunkState,
    blocks: Box<[Block]>,
    sky_lights: NibbleArray,
    height_map: Box<[u8]>,
}

/// Unchecked mutable access to a chunk's arrays, used while building.
pub struct ChunkRawData<'a> {
    /// Position the chunk is being built for.
    pub position: ChunkPos,
    /// Blocks, indexed with [`block_index`].
    pub blocks: &'a mut [Block],
    /// Sky light nibbles, indexed with [`block_index`].
    pub sky_lights: &'a mut NibbleArray,
    /// Surface heights, indexed with [`column_index`].
    pub height_map: &'a mut [u8],
}

/// Unchecked read access to a chunk's arrays, regardless of state.
pub struct ChunkRawView<'a> {
    /// Blocks, indexed with [`block_index`].
    pub blocks: &'a [Block],
    /// Sky light nibbles, indexed with [`block_index`].
    pub sky_lights: &'a NibbleArray,
    /// Surface heights, indexed with [`column_index`].
    pub height_map: &'a [u8],
}

impl ChunkRawView<'_> {
    /// The block array as raw bytes, one per block.
    pub fn block_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.blocks)
    }
}

impl Chunk {
    /// Allocates a new, zeroed chunk in the `Pooled` state.
    pub fn new() -> Self {
        Chunk {
            position: ChunkPos::default(),
            world: None,
            state: ChunkState::Pooled,
            blocks: vec![Block::AIR; CHUNK_VOLUME].into_boxed_slice(),
            sky_lights: NibbleArray::new(CHUNK_VOLUME),
            height_map: vec![0; CHUNK_COLUMN_COUNT].into_boxed_slice(),
        }
    }

    /// Prepares the chunk to be built at `position` for `world`.
    ///
    /// Every array is reset, so nothing from a previous occupant survives.
    pub fn initialize(&mut self, position: ChunkPos, world: &Arc<dyn World>) {
        self.clear_contents();
        self.position = position;
        self.world = Some(Arc::downgrade(world));
        self.state = ChunkState::Building;
    }

    /// Marks the worker's writes as finished.
    pub fn mark_built(&mut self) {
        if self.state != ChunkState::Building {
            warn!(
                "Chunk {} marked built from state {:?}",
                self.position, self.state
            );
        }
        self.state = ChunkState::Built;
    }

    /// Releases a built chunk to the caller.
    ///
    /// # Returns
    /// `true` if the chunk is now `Active`. Chunks that were never built stay gated.
    pub fn allow_accessing(&mut self) -> bool {
        match self.state {
            ChunkState::Built => {
                self.state = ChunkState::Active;
                true
            }
            ChunkState::Active => true,
            state => {
                warn!(
                    "Refusing to open chunk {} for access in state {:?}",
                    self.position, state
                );
                false
            }
        }
    }

    /// Wipes the chunk and returns it to the `Pooled` state.
    pub fn dispose(&mut self) {
        self.clear_contents();
        self.position = ChunkPos::default();
        self.world = None;
        self.state = ChunkState::Pooled;
    }

    fn clear_contents(&mut self) {
        self.blocks.fill(bytemuck::Zeroable::zeroed());
        self.sky_lights.clear();
        self.height_map.fill(0);
    }

    /// The tile this chunk covers.
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    /// The lifecycle state.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Whether the checked accessors are open.
    pub fn is_accessible(&self) -> bool {
        self.state == ChunkState::Active
    }

    /// The world the chunk was built for, if it is still alive.
    pub fn world(&self) -> Option<Arc<dyn World>> {
        self.world.as_ref().and_then(Weak::upgrade)
    }

    /// Mutable access to every array without state checks.
    ///
    /// Intended for the thread that owns the chunk while it is `Building`.
    pub fn raw_data_mut(&mut self) -> ChunkRawData<'_> {
        ChunkRawData {
            position: self.position,
            blocks: &mut self.blocks,
            sky_lights: &mut self.sky_lights,
            height_map: &mut self.height_map,
        }
    }

    /// Read access to every array without state checks.
    pub fn raw_data(&self) -> ChunkRawView<'_> {
        ChunkRawView {
            blocks: &self.blocks,
            sky_lights: &self.sky_lights,
            height_map: &self.height_map,
        }
    }

    /// The block at local coordinates.
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> Result<Block, ChunkAccessError> {
        self.check_access()?;
        Self::check_bounds(x, y, z)?;
        Ok(self.blocks[block_index(x, y, z)])
    }

    /// The sky light level at local coordinates.
    pub fn sky_light_at(&self, x: usize, y: usize, z: usize) -> Result<u8, ChunkAccessError> {
        self.check_access()?;
        Self::check_bounds(x, y, z)?;
        Ok(self.sky_lights.get(block_index(x, y, z)))
    }

    /// The surface height of the column at local `(x, z)`.
    pub fn height_at(&self, x: usize, z: usize) -> Result<u8, ChunkAccessError> {
        self.check_access()?;
        Self::check_bounds(x, 0, z)?;
        Ok(self.height_map[column_index(x, z)])
    }

    fn check_access(&self) -> Result<(), ChunkAccessError> {
        if self.is_accessible() {
            Ok(())
        } else {
            Err(ChunkAccessError::NotAccessible {
                position: self.position,
                state: self.state,
            })
        }
    }

    fn check_bounds(x: usize, y: usize, z: usize) -> Result<(), ChunkAccessError> {
        if x < CHUNK_WIDTH && y < CHUNK_HEIGHT && z < CHUNK_WIDTH {
            Ok(())
        } else {
            Err(ChunkAccessError::OutOfBounds { x, y, z })
        }
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}
