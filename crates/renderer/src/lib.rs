//! Renderer: scene assembly, the per-frame draw loop and the graphics
//! backends it drives.
//! wgpu = 26.x, winit = 0.30.x

pub mod backend;
pub mod frame_loop;
pub mod gpu;
pub mod recording;
pub mod scene;
pub mod shader;

pub use backend::{BackendError, BufferHandle, GraphicsBackend, ProgramHandle, TextureHandle};
pub use frame_loop::{FrameSource, render_frame, run};
pub use gpu::WgpuBackend;
pub use recording::{Call, RecordingBackend};
pub use scene::{DrawPart, Scene};
