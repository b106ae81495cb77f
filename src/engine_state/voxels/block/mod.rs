//! # Block Module
//!
//! Block data stored in chunks and the per-block-type queries the lighting
//! pass consumes.
//!
//! The world decides what a block means through a [`BlockTable`]: whether it
//! is always invisible (skipped when looking for a column's surface) and how
//! much sky light it absorbs. [`DefaultBlockTable`] covers the built-in
//! [`BlockType`]s.

use block_type::BlockType;

pub mod block_type;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u8;

/// Lighting-relevant properties of one block type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockProperties {
    /// Never rendered; ignored when computing the surface height.
    pub always_invisible: bool,
    /// Amount subtracted from sky light passing through the block.
    pub light_opacity: u8,
}

/// Properties of the built-in block types, indexed by `BlockType as usize`.
pub static BLOCK_TYPE_PROPERTIES: [BlockProperties; 7] = [
    BlockProperties { always_invisible: true, light_opacity: 0 },   // AIR
    BlockProperties { always_invisible: false, light_opacity: 15 }, // STONE
    BlockProperties { always_invisible: false, light_opacity: 15 }, // DIRT
    BlockProperties { always_invisible: false, light_opacity: 15 }, // GRASS
    BlockProperties { always_invisible: false, light_opacity: 2 },  // WATER
    BlockProperties { always_invisible: false, light_opacity: 1 },  // LEAVES
    BlockProperties { always_invisible: false, light_opacity: 0 },  // GLASS
];

/// Properties assumed for ids missing from the table.
pub const UNKNOWN_BLOCK_PROPERTIES: BlockProperties = BlockProperties {
    always_invisible: false,
    light_opacity: 15,
};

/// Represents a single voxel block in a chunk.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute and `Pod` derive allow block arrays to be viewed
/// as raw bytes, one byte per block.
#[repr(C)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct Block {
    /// The type of this block, encoded as a `BlockTypeSize` for compact storage.
    pub block_type: BlockTypeSize,
}

impl Block {
    /// The empty block. All-zero chunk data is all air.
    pub const AIR: Block = Block { block_type: 0 };

    /// Creates a new block of the specified type.
    pub const fn new(block_type: BlockType) -> Self {
        Block {
            block_type: block_type as BlockTypeSize,
        }
    }

    /// The decoded block type, if the stored id is known.
    pub fn block_type(self) -> Option<BlockType> {
        BlockType::from_id(self.block_type)
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::AIR
    }
}

impl From<BlockType> for Block {
    fn from(block_type: BlockType) -> Self {
        Block::new(block_type)
    }
}

/// Per-block-type queries supplied by the world.
pub trait BlockTable: Send + Sync {
    /// Whether the block is never visible.
    fn is_always_invisible(&self, block: Block) -> bool;

    /// How much sky light the block absorbs (0 lets light through untouched).
    fn light_opacity(&self, block: Block) -> u8;
}

/// Block table backed by [`BLOCK_TYPE_PROPERTIES`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultBlockTable;

impl DefaultBlockTable {
    /// Looks up the properties of a block.
    pub fn properties(block: Block) -> BlockProperties {
        BLOCK_TYPE_PROPERTIES
            .get(block.block_type as usize)
            .copied()
            .unwrap_or(UNKNOWN_BLOCK_PROPERTIES)
    }
}

impl BlockTable for DefaultBlockTable {
    fn is_always_invisible(&self, block: Block) -> bool {
        Self::properties(block).always_invisible
    }

    fn light_opacity(&self, block: Block) -> u8 {
        Self::properties(block).light_opacity
    }
}
