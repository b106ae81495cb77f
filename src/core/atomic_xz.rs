use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::Vector2;

/// A lock-free cell publishing a horizontal `(x, z)` position.
///
/// Both components are packed as `f32` bits into one `AtomicU64`, so a reader
/// never observes an `x` from one publish and a `z` from another. The writer
/// is the main loop (once per tick) and the reader is the worker thread; a
/// reader may see a value that is one publish old.
#[derive(Debug)]
pub struct AtomicXz {
    bits: AtomicU64,
}

impl AtomicXz {
    /// Creates a cell holding `(x, z)`.
    pub fn new(x: f32, z: f32) -> Self {
        Self {
            bits: AtomicU64::new(pack(x, z)),
        }
    }

    /// Publishes a new position.
    pub fn store(&self, x: f32, z: f32) {
        self.bits.store(pack(x, z), Ordering::Release);
    }

    /// Reads the most recently published position.
    pub fn load(&self) -> Vector2<f32> {
        let (x, z) = unpack(self.bits.load(Ordering::Acquire));
        Vector2::new(x, z)
    }
}

impl Default for AtomicXz {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

fn pack(x: f32, z: f32) -> u64 {
    ((x.to_bits() as u64) << 32) | z.to_bits() as u64
}

fn unpack(bits: u64) -> (f32, f32) {
    (f32::from_bits((bits >> 32) as u32), f32::from_bits(bits as u32))
}
