//! Axis-aligned bounding extents of a model.

use crate::Vec3;

/// Per-axis minimum and maximum over a set of positions.
///
/// An [`Extents`] that never saw a point keeps its initial `+inf` / `-inf`
/// corners, so callers can detect an empty model with [`Extents::is_finite`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub min: Vec3,
    pub max: Vec3,
}

impl Extents {
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Extents of a flat `[x, y, z, x, y, z, ...]` position array.
    /// Trailing components that do not form a full triple are ignored.
    pub fn from_positions(positions: &[f32]) -> Self {
        let mut extents = Self::EMPTY;
        extents.include_positions(positions);
        extents
    }

    #[inline]
    pub fn include_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn include_positions(&mut self, positions: &[f32]) {
        for xyz in positions.chunks_exact(3) {
            self.include_point(Vec3::new(xyz[0], xyz[1], xyz[2]));
        }
    }

    /// `max - min`.
    #[inline]
    pub fn range(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        self.min + self.range() * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn every_coordinate_lies_within_extents() {
        let positions = [
            1.0, -2.0, 0.5, //
            -3.0, 4.0, 0.0, //
            0.25, 0.0, -7.0, //
            2.0, 2.0, 2.0,
        ];
        let e = Extents::from_positions(&positions);
        for xyz in positions.chunks_exact(3) {
            for axis in 0..3 {
                assert!(e.min[axis] <= xyz[axis]);
                assert!(xyz[axis] <= e.max[axis]);
            }
        }
        assert_eq!(e.min, vec3(-3.0, -2.0, -7.0));
        assert_eq!(e.max, vec3(2.0, 4.0, 2.0));
    }

    #[test]
    fn single_vertex_is_degenerate_box() {
        let e = Extents::from_positions(&[1.5, -2.0, 3.0]);
        assert_eq!(e.min, e.max);
        assert_eq!(e.range(), Vec3::ZERO);
    }

    #[test]
    fn empty_model_is_not_finite() {
        let e = Extents::from_positions(&[]);
        assert!(!e.is_finite());
        assert_eq!(e, Extents::EMPTY);
    }
}
