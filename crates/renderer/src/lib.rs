//! Renderer crate for blobwall, a procedural "morphing blob/ripple"
//! background.
//!
//! The crate glues a transparent window surface, a `wgpu` pipeline, and a
//! noise-driven fragment program together. The overall flow is:
//!
//! ```text
//!   CLI / blobwall
//!          │ RendererConfig (size, strength, reduced motion, phase)
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!          ▲                                      │
//!          │                                      └─▶ FrameClock::tick ─▶ GPU UBO
//! ```
//!
//! `WindowState` owns all GPU resources (surface, device, pipeline,
//! uniforms) while `Renderer` is the thin entry point. The surface is
//! acquired at one of two capability levels — modern or legacy — chosen once
//! at startup; the shader dialect and geometry setup follow that choice for
//! the process lifetime. Every failure is local to this component: the
//! background degrades to nothing, the host keeps running.

mod compile;
mod error;
pub mod field;
mod gpu;
mod types;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use gpu::GpuState;

pub use error::RenderError;
pub use gpu::timeline::{
    load_or_create_phase, FrameClock, LoopInput, LoopState, PhaseStore, PHASE_RANGE, TIME_SPEED,
    TIME_WRAP,
};
pub use types::{surface_pixel_size, ContextVariant, ShaderStage, SurfaceDescriptor};

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub surface_size: (u32, u32),
    /// Global opacity multiplier fed to the strength uniform.
    pub strength: f32,
    /// Captured once at startup; freezes the animation when set.
    pub reduced_motion: bool,
    /// Persisted per-installation phase offset in seconds.
    pub phase: f64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1920, 1080),
            strength: 1.0,
            reduced_motion: false,
            phase: 0.0,
        }
    }
}

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the background window and drives the event loop until the host
    /// closes it.
    ///
    /// Initialisation failures (no context, shader rejection) are returned
    /// to the caller, which logs and exits without rendering; nothing here
    /// panics or takes the host down.
    pub fn run(&mut self) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to initialize event loop")?;
        let window_size = PhysicalSize::new(self.config.surface_size.0, self.config.surface_size.1);
        let window = WindowBuilder::new()
            .with_title("blobwall")
            .with_inner_size(window_size)
            .with_transparent(true)
            .with_decorations(false)
            .build(&event_loop)
            .context("failed to create background window")?;
        let window = Arc::new(window);

        let mut state = WindowState::new(window.clone(), &self.config)?;
        state.window().request_redraw();

        event_loop
            .run(move |event, elwt| {
                // Drive redraws via vblank by waiting between events.
                elwt.set_control_flow(ControlFlow::Wait);

                match event {
                    Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                        match event {
                            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                                elwt.exit();
                            }
                            WindowEvent::Resized(_) => {
                                state.handle_resize();
                            }
                            WindowEvent::ScaleFactorChanged {
                                mut inner_size_writer,
                                ..
                            } => {
                                // Keep the current logical size; the backing
                                // store is recomputed on the next frame.
                                let _ = inner_size_writer
                                    .request_inner_size(state.window().inner_size());
                            }
                            WindowEvent::RedrawRequested => {
                                state.render_frame();
                            }
                            _ => {}
                        }
                    }
                    Event::AboutToWait => {
                        // Schedule the next frame only while the loop is
                        // running; a paused (reduced-motion) or stopped
                        // (context-lost) loop stays on its last frame.
                        if state.should_schedule() {
                            state.window().request_redraw();
                        }
                    }
                    _ => {}
                }
            })
            .map_err(|err| anyhow!("event loop error: {err}"))
    }
}

/// Owns the window, GPU resources, clock, and loop state for one surface.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    clock: FrameClock,
    loop_state: LoopState,
    reduced_motion: bool,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let scale_factor = window.scale_factor();
        let logical = window.inner_size().to_logical(scale_factor);
        let gpu = GpuState::new(window.as_ref(), logical, scale_factor, config.strength)?;
        tracing::info!(
            variant = ?gpu.variant(),
            width = gpu.descriptor().width,
            height = gpu.descriptor().height,
            reduced_motion = config.reduced_motion,
            "initialised background surface"
        );

        Ok(Self {
            window,
            gpu,
            clock: FrameClock::new(config.phase),
            loop_state: LoopState::new(config.reduced_motion),
            reduced_motion: config.reduced_motion,
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn should_schedule(&self) -> bool {
        self.loop_state.should_schedule()
    }

    /// Recomputes the backing store from the current logical size and scale
    /// factor. Idempotent; reallocation only happens when the pixel
    /// dimensions changed.
    fn handle_resize(&mut self) {
        let scale_factor = self.window.scale_factor();
        let logical = self.window.inner_size().to_logical(scale_factor);
        self.gpu.resize(logical, scale_factor);
        self.loop_state = self
            .loop_state
            .apply(LoopInput::ResizeEvent, self.reduced_motion);
    }

    /// Renders one frame: resize if needed, advance time, draw, present.
    fn render_frame(&mut self) {
        if self.loop_state == LoopState::Stopped {
            return;
        }

        // Resize is invoked unconditionally every frame; it skips the
        // backing-store reallocation when dimensions are unchanged but
        // always refreshes the resolution uniform.
        let scale_factor = self.window.scale_factor();
        let logical = self.window.inner_size().to_logical(scale_factor);
        self.gpu.resize(logical, scale_factor);

        let time = self.clock.tick(self.reduced_motion);
        match self.gpu.render_frame(time) {
            Ok(()) => {
                self.loop_state = self
                    .loop_state
                    .apply(LoopInput::FrameTick, self.reduced_motion);
                if self.loop_state == LoopState::Paused {
                    tracing::info!("reduced motion active; holding a single static frame");
                }
            }
            Err(wgpu::SurfaceError::Outdated) => {
                // The surface is still valid, only its configuration went
                // stale (typically mid-resize). Reconfigure and try again on
                // the next callback.
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface timeout; retrying next frame");
            }
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::OutOfMemory)) => {
                // Unrecoverable loss: log, stop, never reacquire. The window
                // stays up and the host is unaffected.
                let lost = RenderError::ContextLost(err.to_string());
                tracing::warn!(error = %lost, "rendering stopped");
                self.loop_state = self
                    .loop_state
                    .apply(LoopInput::ContextLostEvent, self.reduced_motion);
            }
            Err(other) => {
                tracing::warn!(error = %other, "surface error; retrying next frame");
            }
        }
    }
}
