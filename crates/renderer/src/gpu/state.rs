//! Aggregates the GPU context, pipeline, and uniforms into the per-frame
//! render path.

use winit::dpi::LogicalSize;

use crate::error::RenderError;
use crate::gpu::context::GpuContext;
use crate::gpu::pipeline::FieldPipeline;
use crate::gpu::uniforms::FieldUniforms;
use crate::types::{ContextVariant, SurfaceDescriptor};

pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: FieldPipeline,
    uniforms: FieldUniforms,
}

impl GpuState {
    /// Acquires a context and builds the variant-matched pipeline.
    pub(crate) fn new<T>(
        target: &T,
        logical: LogicalSize<f64>,
        scale_factor: f64,
        strength: f32,
    ) -> Result<Self, RenderError>
    where
        T: raw_window_handle::HasDisplayHandle + raw_window_handle::HasWindowHandle,
    {
        let context = GpuContext::acquire(target, logical, scale_factor)?;
        let descriptor = context.descriptor();
        let uniforms = FieldUniforms::new(descriptor.width, descriptor.height, strength);
        let pipeline = FieldPipeline::new(
            &context.device,
            context.config.format,
            context.variant,
            &uniforms,
        )?;

        Ok(Self {
            context,
            pipeline,
            uniforms,
        })
    }

    pub(crate) fn variant(&self) -> ContextVariant {
        self.context.variant
    }

    pub(crate) fn descriptor(&self) -> SurfaceDescriptor {
        self.context.descriptor()
    }

    /// Recomputes the backing-store size; reallocation happens only when the
    /// pixel dimensions changed, but the resolution uniform is refreshed
    /// either way because uniform state cannot be assumed to survive across
    /// frames.
    pub(crate) fn resize(&mut self, logical: LogicalSize<f64>, scale_factor: f64) {
        let descriptor = self.context.resize(logical, scale_factor);
        self.uniforms
            .set_resolution(descriptor.width as f32, descriptor.height as f32);
    }

    /// Reconfigures the surface at its current size after an `Outdated`
    /// report.
    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Pushes uniforms, clears to fully transparent, draws the triangle, and
    /// presents.
    pub(crate) fn render_frame(&mut self, time: f64) -> Result<(), wgpu::SurfaceError> {
        self.uniforms.set_time(time as f32);
        self.context.queue.write_buffer(
            &self.pipeline.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("field render encoder"),
                });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("field render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.pipeline.draw(&mut render_pass);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        tracing::trace!(
            time,
            width = self.descriptor().width,
            height = self.descriptor().height,
            "presented frame"
        );
        Ok(())
    }
}
