//! # Voxels
//!
//! Voxel data and the background pipeline that produces it.
//!
//! ## Architecture
//!
//! * **Block**: Block ids and the per-type lighting properties
//! * **Chunk**: Dense block, sky light and height arrays for one tile, plus the pool they cycle through
//! * **Generation**: Terrain generators that fill a chunk's blocks
//! * **Lighting**: The top-down sky light and height map pass
//! * **World**: The host interface the builder reads from, and an in-memory implementation
//! * **Tasks**: The chunk builder, which runs generation and lighting on a worker thread
//!
//! ## Data Flow
//!
//! 1. The main loop requests a `ChunkPos`
//! 2. The worker takes a pooled chunk, generates its blocks and lights it
//! 3. The finished chunk is queued back to the main loop
//! 4. The main loop releases it for access and stores it; later it is recycled into the pool

pub mod block;
pub mod chunk;
pub mod generation;
pub mod lighting;
pub mod tasks;
pub mod world;
