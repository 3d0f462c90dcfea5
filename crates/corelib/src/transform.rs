use crate::{Mat4, Vec3};

/// Corrective tilt applied to every model: 270 degrees about +X.
pub const MODEL_TILT_X: f32 = std::f32::consts::PI * 3.0 / 2.0;

/// World transform of the displayed model.
///
/// The model is first moved by `offset` (recentering it at the origin), then
/// tilted about X, then spun about Y by the elapsed time in seconds.
#[derive(Clone, Copy, Debug)]
pub struct ModelTransform {
    pub offset: Vec3,
    pub tilt_x: f32,
}

impl ModelTransform {
    #[inline]
    pub fn new(offset: Vec3) -> Self {
        Self {
            offset,
            tilt_x: MODEL_TILT_X,
        }
    }

    /// `Ry(elapsed) * Rx(tilt) * T(offset)`; one revolution per 2π seconds.
    #[inline]
    pub fn matrix(&self, elapsed_secs: f32) -> Mat4 {
        Mat4::from_rotation_y(elapsed_secs)
            * Mat4::from_rotation_x(self.tilt_x)
            * Mat4::from_translation(self.offset)
    }
}
