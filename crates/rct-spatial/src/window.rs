//! Square view windows around a chunk.

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::{ChunkKey, ChunkPos};

/// Set of chunk keys (deterministic iteration order within a run).
pub type ChunkSet = HashSet<ChunkKey, FxBuildHasher>;

/// Number of chunks in a window of the given radius: `(2r + 1)^2`.
///
/// Used as a capacity hint for window sets and region lookups.
#[must_use]
pub const fn max_chunks(radius: u32) -> usize {
    let diameter = (radius as usize).saturating_mul(2).saturating_add(1);
    diameter.saturating_mul(diameter)
}

/// All chunks within Chebyshev distance `radius` of `center`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ViewWindow {
    pub center: ChunkPos,
    pub radius: u32,
}

impl ViewWindow {
    #[must_use]
    pub const fn new(center: ChunkPos, radius: u32) -> Self {
        Self { center, radius }
    }

    const fn signed_radius(self) -> i32 {
        if self.radius > i32::MAX as u32 {
            i32::MAX
        } else {
            self.radius as i32
        }
    }

    /// Iterate the keys of this window, row by row.
    pub fn keys(self) -> impl Iterator<Item = ChunkKey> {
        let r = self.signed_radius();
        (-r..=r).flat_map(move |dx| (-r..=r).map(move |dz| self.center.offset(dx, dz).key()))
    }

    /// Collect the window into a pre-sized set.
    #[must_use]
    pub fn to_set(self) -> ChunkSet {
        let mut set = ChunkSet::with_capacity_and_hasher(self.len(), FxBuildHasher);
        set.extend(self.keys());
        set
    }

    /// Whether `pos` lies inside the window.
    ///
    /// Distance is measured without wrapping at the `i32` boundary.
    #[must_use]
    pub fn contains(self, pos: ChunkPos) -> bool {
        chebyshev_distance(self.center, pos) <= u64::from(self.radius)
    }

    #[must_use]
    pub const fn len(self) -> usize {
        max_chunks(self.radius)
    }

    /// A window always contains at least its center.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }
}

/// Key set of the window centered on `(cx, cz)` with radius `r`.
#[must_use]
pub fn window(cx: i32, cz: i32, r: u32) -> ChunkSet {
    ViewWindow::new(ChunkPos::new(cx, cz), r).to_set()
}

/// Chebyshev distance between two chunk positions.
#[must_use]
pub fn chebyshev_distance(a: ChunkPos, b: ChunkPos) -> u64 {
    let dx = (i64::from(a.x) - i64::from(b.x)).unsigned_abs();
    let dz = (i64::from(a.z) - i64::from(b.z)).unsigned_abs();
    dx.max(dz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_size() {
        for r in 0..8 {
            let keys = window(5, -9, r);
            let side = 2 * r as usize + 1;
            assert_eq!(keys.len(), side * side, "radius {r}");
            assert_eq!(keys.len(), max_chunks(r));
        }
    }

    #[test]
    fn test_window_zero_radius_is_center() {
        let keys = window(3, 4, 0);
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&ChunkKey::new(3, 4)));
    }

    #[test]
    fn test_window_bounds() {
        let keys = window(0, 0, 2);
        assert!(keys.contains(&ChunkKey::new(-2, -2)));
        assert!(keys.contains(&ChunkKey::new(2, 2)));
        assert!(keys.contains(&ChunkKey::new(-2, 2)));
        assert!(!keys.contains(&ChunkKey::new(3, 0)));
        assert!(!keys.contains(&ChunkKey::new(0, -3)));
    }

    #[test]
    fn test_window_at_coordinate_edge() {
        // Straddling i32::MAX still yields distinct keys
        let keys = window(i32::MAX, i32::MIN, 1);
        assert_eq!(keys.len(), 9);
        assert!(keys.contains(&ChunkKey::new(i32::MIN, i32::MAX)));
    }

    #[test]
    fn test_contains_matches_keys() {
        let view = ViewWindow::new(ChunkPos::new(-4, 7), 3);
        for key in view.keys() {
            assert!(view.contains(key.pos()));
        }
        assert!(!view.contains(ChunkPos::new(0, 7)));
    }

    #[test]
    fn test_chebyshev_distance() {
        let d = |a: (i32, i32), b: (i32, i32)| {
            chebyshev_distance(ChunkPos::new(a.0, a.1), ChunkPos::new(b.0, b.1))
        };
        assert_eq!(d((0, 0), (0, 0)), 0);
        assert_eq!(d((0, 0), (1, 1)), 1);
        assert_eq!(d((0, 0), (2, 1)), 2);
        assert_eq!(d((-1, -1), (1, 1)), 2);
        assert_eq!(d((i32::MIN, 0), (i32::MAX, 0)), u64::from(u32::MAX));
    }
}
