//! # Block Type Module
//!
//! The block types known to the default block table and their conversion
//! from the compact on-chunk representation.

use num_derive::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates the block types of the default block table.
///
/// The discriminant is what a [`Block`](super::Block) stores, so the order of
/// the variants is part of the chunk data format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Never rendered and lets sky light through untouched.
    AIR,

    /// Solid rock filling the lower part of every column.
    STONE,

    /// Soil layer between stone and the surface.
    DIRT,

    /// Surface block of dry land.
    GRASS,

    /// Water filling columns below sea level. Dims light slightly.
    WATER,

    /// Foliage. Visible but lets most light through.
    LEAVES,

    /// Visible block that does not attenuate light at all.
    GLASS,
}

impl BlockType {
    /// Converts a stored `BlockTypeSize` back to a `BlockType`.
    ///
    /// # Returns
    /// `None` if the value is not a known block type.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// The compact identifier stored in chunk data.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }
}
