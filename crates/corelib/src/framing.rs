//! Derives a camera that frames a whole model from its bounding extents.

use crate::{Camera, Extents, Vec3};

/// Vertical field of view used for every framed camera.
pub const FIELD_OF_VIEW_Y: f32 = 60.0 * std::f32::consts::PI / 180.0;

/// Orbit radius is the box diagonal plus this margin.
const RADIUS_MARGIN: f32 = 1.2;

/// One-time camera parameters computed from a model's extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    /// World-space translation that moves the model's center to the origin.
    pub offset: Vec3,
    pub target: Vec3,
    pub position: Vec3,
    pub radius: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl CameraFrame {
    /// Frame `extents` so the whole model is visible at any absolute scale.
    ///
    /// Non-finite extents (an empty model) produce a non-finite frame; the
    /// caller decides whether that is worth rendering.
    pub fn from_extents(extents: &Extents) -> Self {
        let range = extents.range();
        let offset = -extents.center();
        let target = Vec3::ZERO;
        let radius = range.length() * RADIUS_MARGIN;
        let position = target + Vec3::new(0.0, 0.0, radius);

        Self {
            offset,
            target,
            position,
            radius,
            z_near: radius / 100.0,
            z_far: radius * 3.0,
        }
    }

    /// Perspective camera looking from `position` at `target` with +Y up.
    pub fn camera(&self, aspect: f32) -> Camera {
        Camera::new_perspective(
            self.position,
            self.target,
            Vec3::Y,
            FIELD_OF_VIEW_Y,
            self.z_near,
            self.z_far,
            aspect,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-5 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn unit_cube_frame() {
        let e = Extents::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        let f = CameraFrame::from_extents(&e);
        let diag = 3f32.sqrt();
        assert_eq!(f.offset, Vec3::ZERO);
        assert_eq!(f.target, Vec3::ZERO);
        assert!(approx(f.radius, diag * 1.2));
        assert_eq!(f.position, vec3(0.0, 0.0, f.radius));
        assert!(approx(f.z_near, f.radius / 100.0));
        assert!(approx(f.z_far, f.radius * 3.0));
    }

    #[test]
    fn offset_recenters_model() {
        let e = Extents::new(vec3(2.0, 4.0, -6.0), vec3(4.0, 8.0, -2.0));
        let f = CameraFrame::from_extents(&e);
        assert_eq!(f.offset, vec3(-3.0, -6.0, 4.0));
        assert_eq!(e.center() + f.offset, Vec3::ZERO);
    }

    #[test]
    fn doubling_coordinates_doubles_radius_and_planes() {
        let e = Extents::new(vec3(-1.0, 0.5, -3.0), vec3(2.0, 4.0, 1.0));
        let doubled = Extents::new(e.min * 2.0, e.max * 2.0);
        let a = CameraFrame::from_extents(&e);
        let b = CameraFrame::from_extents(&doubled);

        assert!(approx(b.radius, a.radius * 2.0));
        assert!(approx(b.z_near, a.z_near * 2.0));
        assert!(approx(b.z_far, a.z_far * 2.0));

        // Same field of view, same projected framing.
        let ca = a.camera(1.5);
        let cb = b.camera(1.5);
        assert_eq!(ca.fov_y_rad, cb.fov_y_rad);
        let corner_a = ca.proj_view().project_point3(e.max + a.offset);
        let corner_b = cb.proj_view().project_point3(doubled.max + b.offset);
        assert!(approx(corner_a.x, corner_b.x));
        assert!(approx(corner_a.y, corner_b.y));
    }

    #[test]
    fn radius_scales_linearly_with_diagonal() {
        for scale in [0.001_f32, 1.0, 250.0, 1.0e4] {
            let e = Extents::new(Vec3::ZERO, Vec3::splat(scale));
            let f = CameraFrame::from_extents(&e);
            assert!(approx(f.radius, e.range().length() * 1.2));
        }
    }

    #[test]
    fn empty_extents_give_non_finite_frame() {
        let f = CameraFrame::from_extents(&Extents::EMPTY);
        assert!(!f.radius.is_finite());
    }
}
