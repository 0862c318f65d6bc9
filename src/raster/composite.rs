//! Front-to-back compositing of per-pixel fragments.
//!
//! Fragments are ordered by `(depth, instance_index)`. The key is total, so
//! the composited color does not depend on the order candidates were
//! visited in, and coincident depths resolve to the lower instance index
//! first.

use glam::Vec3;

use super::MAX_FRAGMENTS;

/// One shape hit on one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Ray parameter of the hit, `0` at the near plane.
    pub depth: f32,
    /// Index of the instance record.
    pub index: u32,
    /// Flat color.
    pub color: Vec3,
    /// Opacity, `clamp(density, 0, 1)`.
    pub alpha: f32,
}

impl Fragment {
    fn before(&self, other: &Self) -> bool {
        self.depth < other.depth || (self.depth == other.depth && self.index < other.index)
    }
}

/// The nearest [`MAX_FRAGMENTS`] fragments of a pixel, kept sorted.
#[derive(Debug, Clone)]
pub struct FragmentList {
    fragments: [Fragment; MAX_FRAGMENTS],
    len: usize,
}

impl Default for FragmentList {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fragments: [Fragment {
                depth: 0.0,
                index: 0,
                color: Vec3::ZERO,
                alpha: 0.0,
            }; MAX_FRAGMENTS],
            len: 0,
        }
    }

    /// Insert a fragment. When full, the farthest fragment by the sort key
    /// is dropped (possibly the new one).
    pub fn insert(&mut self, fragment: Fragment) {
        if self.len == MAX_FRAGMENTS && !fragment.before(&self.fragments[MAX_FRAGMENTS - 1]) {
            return;
        }
        let mut slot = self.len.min(MAX_FRAGMENTS - 1);
        while slot > 0 && fragment.before(&self.fragments[slot - 1]) {
            self.fragments[slot] = self.fragments[slot - 1];
            slot -= 1;
        }
        self.fragments[slot] = fragment;
        self.len = (self.len + 1).min(MAX_FRAGMENTS);
    }

    /// Kept fragments, nearest first.
    #[must_use]
    pub fn as_slice(&self) -> &[Fragment] {
        &self.fragments[..self.len]
    }

    /// Number of kept fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing hit the pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Alpha-under the fragments over `background`.
    ///
    /// Returns composited RGB and accumulated coverage.
    #[must_use]
    pub fn resolve(&self, background: Vec3) -> [f32; 4] {
        let mut color = Vec3::ZERO;
        let mut coverage = 0.0;
        for f in self.as_slice() {
            let weight = (1.0 - coverage) * f.alpha;
            color += f.color * weight;
            coverage += weight;
        }
        (color + background * (1.0 - coverage)).extend(coverage).to_array()
    }
}
