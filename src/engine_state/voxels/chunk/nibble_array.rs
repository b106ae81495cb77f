//! # Nibble Array
//!
//! Packed storage of one 4-bit value per voxel.

use bitvec::{field::BitField, prelude::*};

const BITS_PER_NIBBLE: usize = 4;

/// The largest value a nibble can hold.
pub const MAX_NIBBLE: u8 = 0x0F;

/// A fixed-length array of 4-bit values, two per byte.
///
/// Values written with [`set`](Self::set) are masked to their low four bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NibbleArray {
    bits: BitVec<u8, Lsb0>,
}

impl NibbleArray {
    /// Creates an array of `len` zero nibbles.
    pub fn new(len: usize) -> Self {
        NibbleArray {
            bits: bitvec![u8, Lsb0; 0; len * BITS_PER_NIBBLE],
        }
    }

    /// Number of nibbles.
    pub fn len(&self) -> usize {
        self.bits.len() / BITS_PER_NIBBLE
    }

    /// Whether the array holds no nibbles.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Reads the nibble at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn get(&self, index: usize) -> u8 {
        self.bits[Self::range(index)].load_le::<u8>()
    }

    /// Writes the low four bits of `value` at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn set(&mut self, index: usize, value: u8) {
        self.bits[Self::range(index)].store_le::<u8>(value & MAX_NIBBLE);
    }

    /// Sets every nibble to `value`.
    pub fn fill(&mut self, value: u8) {
        let value = value & MAX_NIBBLE;
        let byte = value | (value << BITS_PER_NIBBLE);
        self.bits.as_raw_mut_slice().fill(byte);
    }

    /// Sets every nibble to zero.
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// The packed bytes, low nibble first.
    pub fn as_raw_slice(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    fn range(index: usize) -> std::ops::Range<usize> {
        index * BITS_PER_NIBBLE..(index + 1) * BITS_PER_NIBBLE
    }
}
