//! Per-frame orchestration: transforms, uniforms and draw calls.

use corelib::{CameraFrame, ModelTransform};

use crate::{
    backend::{BackendError, GraphicsBackend},
    scene::Scene,
    shader::{MaterialUniforms, SceneUniforms},
};

/// Supplies the elapsed time (seconds) of each frame to render, waiting for
/// the next display refresh if it has to. `None` ends the loop.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<f32>;
}

impl<I: Iterator<Item = f32>> FrameSource for I {
    fn next_frame(&mut self) -> Option<f32> {
        self.next()
    }
}

/// Render one frame of `scene` at `elapsed_secs`.
pub fn render_frame<B: GraphicsBackend>(
    backend: &mut B,
    scene: &Scene,
    frame: &CameraFrame,
    elapsed_secs: f32,
) -> Result<(), BackendError> {
    if backend.resize_to_display() {
        let (width, height) = backend.surface_size();
        log::debug!("Surface resized to {}x{}", width, height);
    }
    if !backend.begin_frame()? {
        log::debug!("Frame skipped");
        return Ok(());
    }

    let (width, height) = backend.surface_size();
    let camera = frame.camera(width as f32 / height.max(1) as f32);
    let world = ModelTransform::new(frame.offset).matrix(elapsed_secs);

    backend.use_program(scene.program());
    backend.set_scene_uniforms(&SceneUniforms::new(&camera, world));

    for part in scene.parts() {
        backend.bind_buffer(part.buffer);
        backend.set_material_uniforms(&MaterialUniforms::from_material(&part.material));
        if let Some(texture) = part.texture {
            backend.bind_texture(texture);
        }
        backend.draw()?;
    }

    backend.end_frame()
}

/// Render frames until `frames` runs dry. Returns the number of frames.
pub fn run<B: GraphicsBackend, F: FrameSource>(
    backend: &mut B,
    scene: &Scene,
    frame: &CameraFrame,
    mut frames: F,
) -> Result<u64, BackendError> {
    let mut rendered = 0;
    while let Some(elapsed) = frames.next_frame() {
        render_frame(backend, scene, frame, elapsed)?;
        rendered += 1;
    }
    Ok(rendered)
}
