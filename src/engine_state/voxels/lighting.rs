//! # Column Lighting
//!
//! Initial sky light and surface height of a freshly generated chunk.
//!
//! Each `(x, z)` column is walked from the top of the chunk down. The voxel
//! receives the light still travelling down the column, then the light is
//! reduced by the voxel's opacity before moving one block lower. The first
//! block that is not always invisible (or the bottom of the chunk) is the
//! column's surface.
//!
//! Light only travels straight down here. Sideways spreading into caves and
//! light emitted by blocks are handled by a later pass once neighbours exist.

use super::block::{Block, BlockTable};
use super::chunk::{
    block_index, column_index, Chunk, NibbleArray, CHUNK_COLUMN_COUNT, CHUNK_HEIGHT,
    CHUNK_VOLUME, CHUNK_WIDTH, MAX_SKY_LIGHT,
};

/// Light left after passing through a block of the given opacity.
///
/// Saturates at zero.
#[inline]
pub fn blocked_light(light: u8, opacity: u8) -> u8 {
    light.saturating_sub(opacity)
}

/// Computes sky light and the height map for one chunk's block array.
///
/// Only `sky_lights` and `height_map` are written.
pub fn init_lights_and_columns(
    table: &dyn BlockTable,
    blocks: &[Block],
    sky_lights: &mut NibbleArray,
    height_map: &mut [u8],
) {
    debug_assert_eq!(blocks.len(), CHUNK_VOLUME);
    debug_assert_eq!(sky_lights.len(), CHUNK_VOLUME);
    debug_assert_eq!(height_map.len(), CHUNK_COLUMN_COUNT);

    for x in 0..CHUNK_WIDTH {
        for z in 0..CHUNK_WIDTH {
            let mut surface_y = None;
            let mut sky_light = MAX_SKY_LIGHT;

            for y in (0..CHUNK_HEIGHT).rev() {
                let index = block_index(x, y, z);
                let block = blocks[index];

                if surface_y.is_none() && (y == 0 || !table.is_always_invisible(block)) {
                    surface_y = Some(y);
                }

                sky_lights.set(index, sky_light);
                sky_light = blocked_light(sky_light, table.light_opacity(block));
            }

            height_map[column_index(x, z)] = surface_y.unwrap_or(0) as u8;
        }
    }
}

/// Runs [`init_lights_and_columns`] over a chunk's own arrays.
pub fn light_chunk(table: &dyn BlockTable, chunk: &mut Chunk) {
    let raw = chunk.raw_data_mut();
    init_lights_and_columns(table, raw.blocks, raw.sky_lights, raw.height_map);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{block_type::BlockType, DefaultBlockTable};

    struct Arrays {
        blocks: Vec<Block>,
        sky_lights: NibbleArray,
        height_map: Vec<u8>,
    }

    impl Arrays {
        fn air() -> Self {
            Arrays {
                blocks: vec![Block::AIR; CHUNK_VOLUME],
                sky_lights: NibbleArray::new(CHUNK_VOLUME),
                height_map: vec![0; CHUNK_COLUMN_COUNT],
            }
        }

        fn light(&mut self) {
            init_lights_and_columns(
                &DefaultBlockTable,
                &self.blocks,
                &mut self.sky_lights,
                &mut self.height_map,
            );
        }

        fn set(&mut self, x: usize, y: usize, z: usize, block_type: BlockType) {
            self.blocks[block_index(x, y, z)] = block_type.into();
        }

        fn light_at(&self, x: usize, y: usize, z: usize) -> u8 {
            self.sky_lights.get(block_index(x, y, z))
        }
    }

    #[test]
    fn blocked_light_saturates_at_zero() {
        assert_eq!(blocked_light(15, 0), 15);
        assert_eq!(blocked_light(15, 2), 13);
        assert_eq!(blocked_light(3, 15), 0);
        assert_eq!(blocked_light(0, 1), 0);
    }

    #[test]
    fn empty_column_is_fully_lit_with_height_zero() {
        let mut arrays = Arrays::air();
        arrays.light();

        assert!(arrays.height_map.iter().all(|&h| h == 0));
        assert!((0..CHUNK_HEIGHT).all(|y| arrays.light_at(4, y, 9) == MAX_SKY_LIGHT));
    }

    #[test]
    fn bottom_layer_only_keeps_full_light_everywhere() {
        let mut arrays = Arrays::air();
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                arrays.set(x, 0, z, BlockType::STONE);
            }
        }
        arrays.light();

        assert!(arrays.height_map.iter().all(|&h| h == 0));
        assert!(arrays
            .sky_lights
            .as_raw_slice()
            .iter()
            .all(|&b| b == 0xFF));
    }

    #[test]
    fn opaque_surface_darkens_everything_below() {
        let mut arrays = Arrays::air();
        arrays.set(2, 64, 3, BlockType::GRASS);
        arrays.light();

        assert_eq!(arrays.height_map[column_index(2, 3)], 64);
        assert_eq!(arrays.light_at(2, 65, 3), MAX_SKY_LIGHT);
        assert_eq!(arrays.light_at(2, 64, 3), MAX_SKY_LIGHT);
        assert_eq!(arrays.light_at(2, 63, 3), 0);
        assert_eq!(arrays.light_at(2, 0, 3), 0);
        assert_eq!(arrays.light_at(2, 63, 4), MAX_SKY_LIGHT);
    }

    #[test]
    fn translucent_layers_attenuate_gradually() {
        let mut arrays = Arrays::air();
        for y in 10..14 {
            arrays.set(0, y, 0, BlockType::WATER);
        }
        arrays.light();

        assert_eq!(arrays.height_map[column_index(0, 0)], 13);
        assert_eq!(arrays.light_at(0, 13, 0), 15);
        assert_eq!(arrays.light_at(0, 12, 0), 13);
        assert_eq!(arrays.light_at(0, 11, 0), 11);
        assert_eq!(arrays.light_at(0, 10, 0), 9);
        assert_eq!(arrays.light_at(0, 9, 0), 7);
        assert_eq!(arrays.light_at(0, 0, 0), 7);
    }

    #[test]
    fn glass_is_the_surface_but_does_not_dim() {
        let mut arrays = Arrays::air();
        arrays.set(7, 100, 7, BlockType::GLASS);
        arrays.set(7, 50, 7, BlockType::STONE);
        arrays.light();

        assert_eq!(arrays.height_map[column_index(7, 7)], 100);
        assert_eq!(arrays.light_at(7, 99, 7), MAX_SKY_LIGHT);
        assert_eq!(arrays.light_at(7, 49, 7), 0);
    }

    #[test]
    fn random_columns_satisfy_height_and_monotonic_light() {
        let table = DefaultBlockTable;
        let palette = [
            BlockType::AIR,
            BlockType::AIR,
            BlockType::AIR,
            BlockType::STONE,
            BlockType::WATER,
            BlockType::LEAVES,
            BlockType::GLASS,
        ];

        for seed in 0..4 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut arrays = Arrays::air();
            for block in arrays.blocks.iter_mut() {
                *block = palette[rng.usize(..palette.len())].into();
            }
            arrays.light();

            for x in 0..CHUNK_WIDTH {
                for z in 0..CHUNK_WIDTH {
                    let expected_height = (0..CHUNK_HEIGHT)
                        .rev()
                        .find(|&y| !table.is_always_invisible(arrays.blocks[block_index(x, y, z)]))
                        .unwrap_or(0);
                    assert_eq!(arrays.height_map[column_index(x, z)] as usize, expected_height);

                    assert_eq!(arrays.light_at(x, CHUNK_HEIGHT - 1, z), MAX_SKY_LIGHT);
                    for y in 1..CHUNK_HEIGHT {
                        assert!(arrays.light_at(x, y - 1, z) <= arrays.light_at(x, y, z));
                    }
                }
            }
        }
    }
}
