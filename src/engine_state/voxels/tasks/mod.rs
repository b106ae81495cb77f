//! # Voxel Task System
//!
//! Background work on voxel data. The chunk builder generates and lights
//! chunks on its own worker thread so the main loop never stalls on terrain.

pub mod chunk_builder;
