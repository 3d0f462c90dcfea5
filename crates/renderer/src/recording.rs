//! A backend that records every call instead of touching a GPU.
//!
//! Handy for headless checks of the render loop: what was uploaded, bound and
//! drawn, in which order.

use asset::{mesh::ColorSource, texture::TextureData};

use crate::{
    backend::{BackendError, BufferHandle, GraphicsBackend, ProgramHandle, TextureHandle},
    shader::{MaterialUniforms, MeshUpload, SceneUniforms, ShaderSources},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateProgram,
    UploadMesh {
        vertex_count: usize,
        color: ColorSource,
    },
    UploadTexture {
        width: u32,
        height: u32,
    },
    Resize,
    BeginFrame,
    UseProgram(ProgramHandle),
    SceneUniforms(SceneUniforms),
    BindBuffer(BufferHandle),
    MaterialUniforms(MaterialUniforms),
    BindTexture(TextureHandle),
    Draw(BufferHandle),
    EndFrame,
}

#[derive(Debug)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    display: (u32, u32),
    surface: (u32, u32),
    programs: u32,
    buffers: u32,
    textures: u32,
    max_texture_size: u32,
    bound: Option<BufferHandle>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            display: (width.max(1), height.max(1)),
            surface: (width.max(1), height.max(1)),
            programs: 0,
            buffers: 0,
            textures: 0,
            max_texture_size: u32::MAX,
            bound: None,
        }
    }

    /// Change the "display" size; picked up by the next `resize_to_display`.
    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.display = (width.max(1), height.max(1));
    }

    /// Reject texture uploads wider or taller than `max`.
    pub fn set_max_texture_size(&mut self, max: u32) {
        self.max_texture_size = max;
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_program(&mut self, _sources: &ShaderSources) -> Result<ProgramHandle, BackendError> {
        self.calls.push(Call::CreateProgram);
        self.programs += 1;
        Ok(ProgramHandle(self.programs - 1))
    }

    fn upload_mesh(&mut self, mesh: &MeshUpload<'_>) -> Result<BufferHandle, BackendError> {
        self.calls.push(Call::UploadMesh {
            vertex_count: mesh.vertex_count(),
            color: mesh.color.clone(),
        });
        self.buffers += 1;
        Ok(BufferHandle(self.buffers - 1))
    }

    fn upload_texture(&mut self, texture: &TextureData) -> Result<TextureHandle, BackendError> {
        let max = self.max_texture_size;
        if texture.width > max || texture.height > max {
            return Err(BackendError::TextureTooLarge {
                width: texture.width,
                height: texture.height,
                max,
            });
        }
        self.calls.push(Call::UploadTexture {
            width: texture.width,
            height: texture.height,
        });
        self.textures += 1;
        Ok(TextureHandle(self.textures - 1))
    }

    fn resize_to_display(&mut self) -> bool {
        if self.surface == self.display {
            return false;
        }
        self.calls.push(Call::Resize);
        self.surface = self.display;
        true
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    fn begin_frame(&mut self) -> Result<bool, BackendError> {
        self.calls.push(Call::BeginFrame);
        self.bound = None;
        Ok(true)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(Call::UseProgram(program));
    }

    fn set_scene_uniforms(&mut self, uniforms: &SceneUniforms) {
        self.calls.push(Call::SceneUniforms(*uniforms));
    }

    fn bind_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(Call::BindBuffer(buffer));
        self.bound = Some(buffer);
    }

    fn set_material_uniforms(&mut self, uniforms: &MaterialUniforms) {
        self.calls.push(Call::MaterialUniforms(*uniforms));
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.calls.push(Call::BindTexture(texture));
    }

    fn draw(&mut self) -> Result<(), BackendError> {
        let buffer = self.bound.ok_or(BackendError::NothingBound)?;
        self.calls.push(Call::Draw(buffer));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        self.calls.push(Call::EndFrame);
        Ok(())
    }
}
