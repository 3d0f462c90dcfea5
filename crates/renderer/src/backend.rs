//! The graphics backend contract the scene assembler and render loop drive.

use asset::texture::TextureData;
use thiserror::Error;

use crate::shader::{MaterialUniforms, MeshUpload, SceneUniforms, ShaderSources};

/// Compiled program owned by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Device-resident vertex buffer owned by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Device-resident texture owned by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Error)]
pub enum BackendError {
    /// No adapter, device or surface could be obtained.
    #[error("graphics backend unavailable: {0}")]
    Unavailable(String),
    #[error("shader program failed to build: {0}")]
    Shader(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("texture of {width}x{height} exceeds the {max}x{max} limit")]
    TextureTooLarge { width: u32, height: u32, max: u32 },
    #[error("texture upload failed: {0}")]
    Texture(String),
    #[error("unknown {kind} handle {index}")]
    InvalidHandle { kind: &'static str, index: u32 },
    #[error("draw issued without a bound program and buffer")]
    NothingBound,
}

/// Operations a rendering backend exposes.
///
/// Calls within a frame are made in this order: `resize_to_display`,
/// `begin_frame`, `use_program`, `set_scene_uniforms`, then per part
/// `bind_buffer`, `set_material_uniforms`, optionally `bind_texture`, `draw`,
/// and finally `end_frame`. A texture binding lasts until the next
/// `bind_buffer`.
pub trait GraphicsBackend {
    fn create_program(&mut self, sources: &ShaderSources) -> Result<ProgramHandle, BackendError>;
    fn upload_mesh(&mut self, mesh: &MeshUpload<'_>) -> Result<BufferHandle, BackendError>;
    fn upload_texture(&mut self, texture: &TextureData) -> Result<TextureHandle, BackendError>;

    /// Match the surface to the display size. Returns `true` if it changed.
    fn resize_to_display(&mut self) -> bool;
    /// Current surface size in pixels, never zero.
    fn surface_size(&self) -> (u32, u32);

    /// Start a frame and clear colour and depth. `Ok(false)` means the frame
    /// has to be skipped (e.g. the surface was lost and has been rebuilt).
    fn begin_frame(&mut self) -> Result<bool, BackendError>;
    fn use_program(&mut self, program: ProgramHandle);
    fn set_scene_uniforms(&mut self, uniforms: &SceneUniforms);
    fn bind_buffer(&mut self, buffer: BufferHandle);
    fn set_material_uniforms(&mut self, uniforms: &MaterialUniforms);
    fn bind_texture(&mut self, texture: TextureHandle);
    fn draw(&mut self) -> Result<(), BackendError>;
    /// Submit and present.
    fn end_frame(&mut self) -> Result<(), BackendError>;
}
