//! Core types: math re-exports, camera, bounding extents and camera framing.

pub use glam::{Mat4, Vec3, vec3};

pub mod bounds;
pub mod camera;
pub mod framing;
pub mod transform;

pub use bounds::Extents;
pub use camera::Camera;
pub use framing::CameraFrame;
pub use transform::ModelTransform;
