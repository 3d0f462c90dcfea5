//! Platform layer: window, event loop and the viewer lifecycle.
//!
//! The window is created on `resumed`; the model is loaded and uploaded right
//! after, then every redraw renders one frame and requests the next one, so
//! the display refresh paces the loop.

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use asset::{load_model, source::DirSource};
use corelib::CameraFrame;
use renderer::{BackendError, Scene, WgpuBackend, render_frame};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Startup settings chosen on the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// OBJ path, relative to the working directory.
    pub model: String,
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: "knight.obj".into(),
            backends: wgpu::Backends::all(),
            width: 1280,
            height: 720,
        }
    }
}

/// Everything that exists once the window is up and the model is on the GPU.
struct Viewer {
    window: Arc<Window>,
    backend: WgpuBackend,
    scene: Scene,
    frame: CameraFrame,
    start: Instant,
}

struct ViewerApp {
    config: ViewerConfig,
    viewer: Option<Viewer>,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            viewer: None,
            error: None,
        }
    }

    /// `Ok(None)` means no graphics backend is available; the viewer then
    /// quits quietly.
    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Option<Viewer>> {
        let attributes = Window::default_attributes()
            .with_title(format!("objview - {}", self.config.model))
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let mut backend =
            match pollster::block_on(WgpuBackend::new(window.clone(), self.config.backends)) {
                Ok(backend) => backend,
                Err(BackendError::Unavailable(reason)) => {
                    log::debug!("No graphics backend available ({}), exiting.", reason);
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

        let model = pollster::block_on(load_model(&DirSource::new("."), &self.config.model))
            .with_context(|| format!("failed to load model {}", self.config.model))?;
        let scene = Scene::assemble(&mut backend, &model)?;
        let frame = CameraFrame::from_extents(scene.extents());
        log::debug!(
            "Camera at {:?}, radius {:.3}, near {:.4}, far {:.3}",
            frame.position,
            frame.radius,
            frame.z_near,
            frame.z_far
        );

        Ok(Some(Viewer {
            window,
            backend,
            scene,
            frame,
            start: Instant::now(),
        }))
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(Some(viewer)) => {
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Ok(None) => event_loop.exit(),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::debug!("Resized: {}x{}", size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let Some(viewer) = self.viewer.as_mut() else {
                    return;
                };
                let elapsed = viewer.start.elapsed().as_secs_f32();
                match render_frame(&mut viewer.backend, &viewer.scene, &viewer.frame, elapsed) {
                    Ok(()) => viewer.window.request_redraw(),
                    Err(e) => self.fail(event_loop, e.into()),
                }
            }
            _ => {}
        }
    }
}

/// Open the viewer window and render until it is closed.
pub fn run_viewer(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ViewerApp::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_opens_knight() {
        let config = ViewerConfig::default();
        assert_eq!(config.model, "knight.obj");
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.backends, wgpu::Backends::all());
    }
}
