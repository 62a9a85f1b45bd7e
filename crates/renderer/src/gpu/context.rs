//! Surface and device acquisition with capability fallback.
//!
//! `GpuContext::acquire` tries the modern capability level first (the full
//! limits the adapter advertises) and falls back to the legacy level
//! (downlevel WebGL2-class limits). The variant chosen here is fixed for the
//! process lifetime: the shader dialect and geometry setup in
//! `gpu/pipeline.rs` must match it.

use anyhow::{anyhow, Context as AnyhowContext};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::LogicalSize;

use crate::error::RenderError;
use crate::types::{surface_pixel_size, ContextVariant, SurfaceDescriptor};

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub variant: ContextVariant,
    descriptor: SurfaceDescriptor,
}

impl GpuContext {
    /// Acquires a rendering context, preferring the modern capability level.
    ///
    /// Failure to obtain either level is [`RenderError::NoContextAvailable`];
    /// the caller aborts initialisation and logs — there is no retry, and the
    /// host is left untouched.
    pub(crate) fn acquire<T>(
        target: &T,
        logical: LogicalSize<f64>,
        scale_factor: f64,
    ) -> Result<Self, RenderError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::default();

        let surface = create_surface(&instance, target).map_err(|err| {
            tracing::warn!(error = %err, "failed to create rendering surface");
            RenderError::NoContextAvailable
        })?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")
        .map_err(|err| {
            tracing::warn!(error = %err, "no suitable GPU adapter found");
            RenderError::NoContextAvailable
        })?;

        let adapter_info = adapter.get_info();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let (device, queue, variant) = request_device_with_fallback(&adapter)?;
        tracing::info!(?variant, "acquired rendering context");

        let descriptor = surface_pixel_size(logical, scale_factor);
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        // Straight (non-premultiplied) alpha where the platform offers it, so
        // the source-over blend in the pipeline composes correctly.
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::CompositeAlphaMode::PostMultiplied)
            .unwrap_or(surface_caps.alpha_modes[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: descriptor.width,
            height: descriptor.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            variant,
            descriptor,
        })
    }

    /// Current backing-store dimensions.
    pub(crate) fn descriptor(&self) -> SurfaceDescriptor {
        self.descriptor
    }

    /// Recomputes the backing-store size and reconfigures the surface only
    /// when the computed size differs. Returns the descriptor either way so
    /// the caller can re-push the resolution uniform unconditionally.
    pub(crate) fn resize(
        &mut self,
        logical: LogicalSize<f64>,
        scale_factor: f64,
    ) -> SurfaceDescriptor {
        let target = surface_pixel_size(logical, scale_factor);
        if target != self.descriptor {
            self.descriptor = target;
            self.config.width = target.width;
            self.config.height = target.height;
            self.surface.configure(&self.device, &self.config);
            tracing::debug!(
                width = target.width,
                height = target.height,
                "reconfigured surface backing store"
            );
        }
        self.descriptor
    }

    /// Reconfigures at the current size. Used when the surface reports
    /// `Outdated`; the surface itself remains valid.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn create_surface<T>(instance: &wgpu::Instance, target: &T) -> anyhow::Result<wgpu::Surface<'static>>
where
    T: HasDisplayHandle + HasWindowHandle,
{
    let window_handle = target
        .window_handle()
        .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
    let display_handle = target
        .display_handle()
        .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

    unsafe {
        instance
            .create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
            .map_err(|err| anyhow!("failed to create rendering surface: {err}"))
    }
}

/// Requests a device at the modern level, falling back to legacy limits.
fn request_device_with_fallback(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue, ContextVariant), RenderError> {
    let modern_descriptor = wgpu::DeviceDescriptor {
        label: Some("blobwall device (modern)"),
        required_features: wgpu::Features::empty(),
        required_limits: adapter.limits(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::default(),
    };

    match pollster::block_on(adapter.request_device(&modern_descriptor)) {
        Ok((device, queue)) => return Ok((device, queue, ContextVariant::Modern)),
        Err(err) => {
            tracing::warn!(error = %err, "modern device request failed; trying legacy limits");
        }
    }

    let legacy_descriptor = wgpu::DeviceDescriptor {
        label: Some("blobwall device (legacy)"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::default(),
    };

    match pollster::block_on(adapter.request_device(&legacy_descriptor)) {
        Ok((device, queue)) => Ok((device, queue, ContextVariant::Legacy)),
        Err(err) => {
            tracing::warn!(error = %err, "legacy device request failed");
            Err(RenderError::NoContextAvailable)
        }
    }
}
