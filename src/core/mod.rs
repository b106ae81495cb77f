//! # Core Module
//!
//! Concurrency primitives shared by the scheduler, the chunk builder and the
//! host world.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted value with read-write locking
//! - `AtomicXz`: Lock-free published `(x, z)` position read by the worker thread
//!
//! ## Usage
//! ```rust
//! use voxel_chunk_builder::core::{AtomicXz, MtResource};
//!
//! let player = AtomicXz::default();
//! player.store(4.0, -2.0);
//! assert_eq!(player.load().x, 4.0);
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

pub mod atomic_xz;
pub mod mt_resource;

pub use atomic_xz::AtomicXz;
pub use mt_resource::MtResource;
