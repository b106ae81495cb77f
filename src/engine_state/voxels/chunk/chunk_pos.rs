//! # Chunk Position
//!
//! Horizontal tile coordinates identifying a chunk.

use std::fmt;

use cgmath::{InnerSpace, Vector2};

use super::CHUNK_WIDTH;

/// The `(x, z)` tile of a chunk, in chunk units.
///
/// Tile `(1, 0)` covers world blocks `16..32` on the x axis. Positions compare
/// and hash by value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    x: i32,
    z: i32,
}

impl ChunkPos {
    /// Creates a chunk position from tile coordinates.
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkPos { x, z }
    }

    /// The tile containing a world-space block coordinate.
    pub fn from_world(block_x: i32, block_z: i32) -> Self {
        let width = CHUNK_WIDTH as i32;
        ChunkPos::new(block_x.div_euclid(width), block_z.div_euclid(width))
    }

    /// Tile x coordinate.
    pub const fn x(self) -> i32 {
        self.x
    }

    /// Tile z coordinate.
    pub const fn z(self) -> i32 {
        self.z
    }

    /// World-space block coordinates of the chunk's minimum corner.
    pub const fn world_origin(self) -> (i32, i32) {
        (self.x * CHUNK_WIDTH as i32, self.z * CHUNK_WIDTH as i32)
    }

    /// The position as a floating point vector, for distance queries.
    pub fn xz(self) -> Vector2<f32> {
        Vector2::new(self.x as f32, self.z as f32)
    }

    /// Squared distance to a point given in chunk units.
    pub fn squared_distance_to(self, point: Vector2<f32>) -> f32 {
        (point - self.xz()).magnitude2()
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_world_floors_negative_coordinates() {
        assert_eq!(ChunkPos::from_world(0, 15), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::from_world(16, -1), ChunkPos::new(1, -1));
        assert_eq!(ChunkPos::from_world(-16, -17), ChunkPos::new(-1, -2));
        assert_eq!(ChunkPos::new(-1, 2).world_origin(), (-16, 32));
    }

    #[test]
    fn squared_distance_is_measured_in_chunk_units() {
        let player = Vector2::new(0.0, 0.0);
        assert_eq!(ChunkPos::new(0, 0).squared_distance_to(player), 0.0);
        assert_eq!(ChunkPos::new(1, 0).squared_distance_to(player), 1.0);
        assert_eq!(ChunkPos::new(0, 5).squared_distance_to(player), 25.0);
        assert_eq!(ChunkPos::new(-3, 4).squared_distance_to(Vector2::new(0.5, 0.5)), 24.5);
    }
}
