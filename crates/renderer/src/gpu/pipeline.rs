//! Render pipeline and geometry state for the full-screen triangle.
//!
//! The geometry strategy follows the context variant: the modern pipeline
//! binds no vertex buffer and lets the vertex stage synthesize the triangle
//! from the vertex index; the legacy pipeline feeds the same oversized
//! triangle through an explicit 3-vertex buffer and a 2-float attribute.

use wgpu::util::DeviceExt;

use crate::compile::{compile_fragment_shader, compile_vertex_shader};
use crate::error::RenderError;
use crate::gpu::uniforms::FieldUniforms;
use crate::types::ContextVariant;

/// One oversized triangle covering the viewport; cheaper than a quad and
/// free of a diagonal seam.
const TRIANGLE_VERTICES: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];

pub(crate) struct FieldPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    /// Present only for the legacy variant.
    vertex_buffer: Option<wgpu::Buffer>,
}

impl FieldPipeline {
    /// Compiles both stages for the variant and links the render pipeline.
    ///
    /// Stage modules are dropped as soon as the pipeline is created,
    /// regardless of outcome. A compile failure surfaces the stage and its
    /// diagnostic log; a link failure surfaces the validation log. Both are
    /// fatal for this program.
    pub(crate) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        variant: ContextVariant,
        uniforms: &FieldUniforms,
    ) -> Result<Self, RenderError> {
        let vertex_module = compile_vertex_shader(device, variant)?;
        let fragment_module = compile_fragment_shader(device, variant)?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("field uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("field pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffer_layout = wgpu::VertexBufferLayout {
            array_stride: (std::mem::size_of::<f32>() * 2) as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: 0,
            }],
        };
        let vertex_buffers: &[wgpu::VertexBufferLayout] = match variant {
            ContextVariant::Modern => &[],
            ContextVariant::Legacy => std::slice::from_ref(&vertex_buffer_layout),
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("field pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Pure 2D overlay: no depth testing, source-over alpha blending.
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::LinkError {
                log: error.to_string(),
            });
        }

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("field uniform buffer"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("field uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let vertex_buffer = match variant {
            ContextVariant::Modern => None,
            ContextVariant::Legacy => Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("fullscreen triangle vertices"),
                    contents: bytemuck::cast_slice(&TRIANGLE_VERTICES),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            )),
        };

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
        })
    }

    /// Records the single triangle draw into an open render pass.
    pub(crate) fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        if let Some(buffer) = &self.vertex_buffer {
            render_pass.set_vertex_buffer(0, buffer.slice(..));
        }
        render_pass.draw(0..3, 0..1);
    }
}
