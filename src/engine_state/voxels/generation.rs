//! # Terrain Generation
//!
//! Generators fill the block array of a chunk that has been initialized for a
//! position. They never touch light or height data; the lighting pass derives
//! those afterwards.
//!
//! Available generators:
//! - `PerlinTerrainGenerator`: seeded heightmap terrain with water and shrubs
//! - `FlatTerrainGenerator`: fixed horizontal layers, useful for tests
//! - `EmptyTerrainGenerator`: leaves every block as air

use noise::{NoiseFn, Perlin};

use crate::error::BuildError;

use super::block::{block_type::BlockType, Block};
use super::chunk::{block_index, Chunk, ChunkPos, CHUNK_HEIGHT, CHUNK_WIDTH};

/// Fills the blocks of a chunk.
pub trait TerrainGenerator: Send + Sync {
    /// Writes the blocks of `chunk`, which is in the `Building` state and
    /// holds only air.
    fn generate_chunk(&self, chunk: &mut Chunk) -> Result<(), BuildError>;
}

/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;
/// Surface height where the noise samples zero.
pub const PERLIN_BASE_HEIGHT: f64 = 64.0;
/// Height deviation at the noise extremes.
pub const PERLIN_AMPLITUDE: f64 = 24.0;
/// Columns whose surface is below this height are flooded up to it.
pub const SEA_LEVEL: usize = 60;
/// Depth of the dirt layer above stone.
pub const DIRT_DEPTH: usize = 4;
/// Chance that a grass column grows a shrub.
pub const SHRUB_DENSITY: f32 = 0.02;

/// Terrain from a seeded 2D Perlin heightmap.
///
/// Columns are stone, capped with a dirt layer and a grass (or dirt, when
/// submerged) surface. Columns below [`SEA_LEVEL`] are filled with water and
/// dry grass columns occasionally grow a leaf shrub.
pub struct PerlinTerrainGenerator {
    perlin: Perlin,
    seed: u32,
}

impl PerlinTerrainGenerator {
    /// Creates a generator for the given world seed.
    pub fn new(seed: u32) -> Self {
        PerlinTerrainGenerator {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    /// Surface height of the column at world-space block coordinates.
    pub fn surface_height(&self, world_x: i32, world_z: i32) -> usize {
        let sample = self.perlin.get([
            world_x as f64 * PERLIN_SCALE_FACTOR,
            world_z as f64 * PERLIN_SCALE_FACTOR,
        ]);
        let height = PERLIN_BASE_HEIGHT + sample * PERLIN_AMPLITUDE;
        (height.round().max(1.0) as usize).min(CHUNK_HEIGHT - 2)
    }

    fn chunk_rng(&self, position: ChunkPos) -> fastrand::Rng {
        let x = position.x() as u32 as u64;
        let z = position.z() as u32 as u64;
        fastrand::Rng::with_seed(
            ((self.seed as u64) << 32)
                ^ x.wrapping_mul(0x9E37_79B9_7F4A_7C15)
                ^ z.wrapping_mul(0xC2B2_AE3D_27D4_EB4F),
        )
    }
}

impl TerrainGenerator for PerlinTerrainGenerator {
    fn generate_chunk(&self, chunk: &mut Chunk) -> Result<(), BuildError> {
        let position = chunk.position();
        let (origin_x, origin_z) = position.world_origin();
        let mut rng = self.chunk_rng(position);
        let blocks = chunk.raw_data_mut().blocks;

        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                let surface = self.surface_height(origin_x + x as i32, origin_z + z as i32);
                let submerged = surface < SEA_LEVEL;

                for y in 0..=surface {
                    let block_type = if y == surface {
                        if submerged {
                            BlockType::DIRT
                        } else {
                            BlockType::GRASS
                        }
                    } else if y + DIRT_DEPTH > surface {
                        BlockType::DIRT
                    } else {
                        BlockType::STONE
                    };
                    blocks[block_index(x, y, z)] = block_type.into();
                }

                if submerged {
                    for y in surface + 1..=SEA_LEVEL {
                        blocks[block_index(x, y, z)] = BlockType::WATER.into();
                    }
                } else if rng.f32() < SHRUB_DENSITY {
                    blocks[block_index(x, surface + 1, z)] = BlockType::LEAVES.into();
                }
            }
        }

        Ok(())
    }
}

/// Terrain made of horizontal layers, listed from the bottom up.
#[derive(Clone, Debug)]
pub struct FlatTerrainGenerator {
    layers: Vec<BlockType>,
}

impl FlatTerrainGenerator {
    /// Creates a generator stacking `layers` from `y = 0` upwards.
    pub fn new(layers: Vec<BlockType>) -> Self {
        FlatTerrainGenerator { layers }
    }
}

impl TerrainGenerator for FlatTerrainGenerator {
    fn generate_chunk(&self, chunk: &mut Chunk) -> Result<(), BuildError> {
        let position = chunk.position();
        if self.layers.len() > CHUNK_HEIGHT {
            return Err(BuildError::Generation {
                position,
                reason: format!(
                    "{} layers do not fit in a chunk of height {}",
                    self.layers.len(),
                    CHUNK_HEIGHT
                ),
            });
        }

        let blocks = chunk.raw_data_mut().blocks;
        for (y, &block_type) in self.layers.iter().enumerate() {
            let block = Block::new(block_type);
            for x in 0..CHUNK_WIDTH {
                for z in 0..CHUNK_WIDTH {
                    blocks[block_index(x, y, z)] = block;
                }
            }
        }

        Ok(())
    }
}

/// Generator that leaves chunks empty.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyTerrainGenerator;

impl TerrainGenerator for EmptyTerrainGenerator {
    fn generate_chunk(&self, _chunk: &mut Chunk) -> Result<(), BuildError> {
        Ok(())
    }
}
