//! Chunk coordinates and their packed 64-bit keys.
//!
//! # Key Format
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  ChunkKey (8 bytes)                                        │
//! ├────────────────────────────────────────────────────────────┤
//! │  high 32 bits: z as u32                                    │
//! │  low  32 bits: x as u32                                    │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

/// Chunk size in blocks.
pub const CHUNK_SHIFT: u32 = 4; // 16 blocks

/// Integer chunk coordinate on the unbounded 2D grid.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given world position.
    ///
    /// Uses floor division, so `-0.5` lands in chunk `-1`.
    #[must_use]
    pub fn from_world(x: f64, z: f64) -> Self {
        let chunk_size = f64::from(1_u32 << CHUNK_SHIFT);
        Self {
            x: (x / chunk_size).floor() as i32,
            z: (z / chunk_size).floor() as i32,
        }
    }

    /// Chunk containing the given block coordinate.
    #[must_use]
    pub const fn from_block(x: i32, z: i32) -> Self {
        Self {
            x: x >> CHUNK_SHIFT,
            z: z >> CHUNK_SHIFT,
        }
    }

    /// Offset by `(dx, dz)`, wrapping at the `i32` boundary.
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            z: self.z.wrapping_add(dz),
        }
    }

    #[inline]
    #[must_use]
    pub const fn key(self) -> ChunkKey {
        ChunkKey::new(self.x, self.z)
    }
}

impl From<ChunkKey> for ChunkPos {
    fn from(key: ChunkKey) -> Self {
        key.pos()
    }
}

/// A chunk coordinate packed into one `u64`.
///
/// Only equality and hashing are meaningful; the numeric order of keys
/// says nothing about spatial order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey(u64);

impl ChunkKey {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(((z as u32 as u64) << 32) | (x as u32 as u64))
    }

    #[inline]
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0 as u32 as i32
    }

    #[inline]
    #[must_use]
    pub const fn z(self) -> i32 {
        (self.0 >> 32) as u32 as i32
    }

    #[inline]
    #[must_use]
    pub const fn pos(self) -> ChunkPos {
        ChunkPos::new(self.x(), self.z())
    }

    /// Raw packed bits.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl From<ChunkPos> for ChunkKey {
    fn from(pos: ChunkPos) -> Self {
        pos.key()
    }
}

impl fmt::Debug for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkKey({}, {})", self.x(), self.z())
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x(), self.z())
    }
}
