//! Shader sources and the CPU-side layouts they consume.
//!
//! The `#[repr(C)]` structs here mirror the WGSL structs byte for byte
//! (vec3 members are padded to 16 bytes), so any backend that uploads them
//! verbatim satisfies the shader interface.

use asset::{
    mesh::{ColorSource, DEFAULT_NORMAL, DEFAULT_TEXCOORD},
    mtl::{
        DEFAULT_AMBIENT, DEFAULT_DIFFUSE, DEFAULT_EMISSIVE, DEFAULT_OPACITY, DEFAULT_SHININESS,
        DEFAULT_SPECULAR, Material,
    },
};
use bytemuck::{Pod, Zeroable};
use corelib::{Camera, Mat4, Vec3};
use wgpu::{VertexBufferLayout, VertexStepMode};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";
pub const FRAGMENT_TEXTURED_ENTRY: &str = "fs_textured";

/// Ambient light level shared by every material.
pub const AMBIENT_LIGHT: [f32; 3] = [0.2, 0.2, 0.2];

/// Direction towards the single directional light (normalized).
pub fn light_direction() -> Vec3 {
    Vec3::new(-1.0, 3.0, 5.0).normalize()
}

/// A vertex + fragment program, as source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

impl ShaderSources {
    /// The directional-light Phong program every model is drawn with.
    pub const PHONG: ShaderSources = ShaderSources {
        vertex: include_str!("shaders/phong.vert.wgsl"),
        fragment: include_str!("shaders/phong.frag.wgsl"),
    };
}

/// Per-frame values shared by every draw part (group 0).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
    pub view_world_position: [f32; 3],
    _pad0: f32,
    pub light_direction: [f32; 3],
    _pad1: f32,
    pub ambient_light: [f32; 3],
    _pad2: f32,
}

impl SceneUniforms {
    pub fn new(camera: &Camera, world: Mat4) -> Self {
        Self {
            projection: camera.proj().to_cols_array_2d(),
            view: camera.view().to_cols_array_2d(),
            world: world.to_cols_array_2d(),
            view_world_position: camera.eye.to_array(),
            _pad0: 0.0,
            light_direction: light_direction().to_array(),
            _pad1: 0.0,
            ambient_light: AMBIENT_LIGHT,
            _pad2: 0.0,
        }
    }
}

/// Per-part surface values (group 1).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub diffuse: [f32; 3],
    _pad0: f32,
    pub ambient: [f32; 3],
    _pad1: f32,
    pub emissive: [f32; 3],
    _pad2: f32,
    pub specular: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
    _pad3: [f32; 3],
}

impl MaterialUniforms {
    /// Uniforms for `material`; every unset property takes its default.
    pub fn from_material(material: &Material) -> Self {
        Self {
            diffuse: material.diffuse.unwrap_or(DEFAULT_DIFFUSE),
            _pad0: 0.0,
            ambient: material.ambient.unwrap_or(DEFAULT_AMBIENT),
            _pad1: 0.0,
            emissive: material.emissive.unwrap_or(DEFAULT_EMISSIVE),
            _pad2: 0.0,
            specular: material.specular.unwrap_or(DEFAULT_SPECULAR),
            shininess: material.shininess.unwrap_or(DEFAULT_SHININESS),
            opacity: material.opacity.unwrap_or(DEFAULT_OPACITY),
            _pad3: [0.0; 3],
        }
    }
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self::from_material(&Material::fallback())
    }
}

/// Interleaved vertex as the vertex stage reads it.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub texcoord: [f32; 2],
}

impl GpuVertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<GpuVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3, 1 => Float32x3, 2 => Float32x4, 3 => Float32x2
        ],
    };
}

/// Named attribute arrays of one draw part, as handed to a backend.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshUpload<'a> {
    pub position: &'a [f32],
    /// Empty when the geometry has no normals.
    pub normal: &'a [f32],
    /// Empty when the geometry has no texture coordinates.
    pub texcoord: &'a [f32],
    pub color: ColorSource,
}

impl MeshUpload<'_> {
    pub fn vertex_count(&self) -> usize {
        self.position.len() / 3
    }

    /// Interleave the streams. A stream that does not cover every vertex
    /// reads as +Z normals / zero texcoords for the uncovered ones.
    pub fn interleave(&self) -> Vec<GpuVertex> {
        (0..self.vertex_count())
            .map(|i| GpuVertex {
                position: triple(self.position, i).unwrap_or_default(),
                normal: triple(self.normal, i).unwrap_or(DEFAULT_NORMAL),
                color: self.color.rgba(i),
                texcoord: self
                    .texcoord
                    .get(i * 2..i * 2 + 2)
                    .map(|uv| [uv[0], uv[1]])
                    .unwrap_or(DEFAULT_TEXCOORD),
            })
            .collect()
    }
}

fn triple(data: &[f32], i: usize) -> Option<[f32; 3]> {
    data.get(i * 3..i * 3 + 3).map(|v| [v[0], v[1], v[2]])
}
