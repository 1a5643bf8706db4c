use std::cell::Cell;

use wgpu::util::DeviceExt;

use super::backend::{
    BufferKind, DrawTarget, GraphicsContext, InstancedDraw, Mat4, ShaderStage, StepMode,
    VertexBufferLayout, VertexFormat,
};
use super::wgsl::{self, CompiledStage};
use crate::render::batch::geometry::fan_indices;

/// Renderer-facing wgpu context (device/queue + surface format).
///
/// Device and queue are reference-counted handles, so a context is cheap to
/// clone and can be kept by long-lived renderers.
#[derive(Clone)]
pub struct RenderCtx {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
}

impl RenderCtx {
    #[inline]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            queue,
            surface_format,
        }
    }
}

/// Target for drawing (encoder + color view + its size in physical pixels).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub size: (u32, u32),
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        size: (u32, u32),
    ) -> Self {
        Self { encoder, color_view, size }
    }
}

impl DrawTarget for RenderTarget<'_> {
    fn pixel_size(&self) -> (u32, u32) {
        self.size
    }

    // Pipeline, bindings and buffers are scoped to the render pass, which the
    // draw closes before returning. Nothing global survives it.
    fn reset_state(&mut self) {}
}

/// Compiled stage plus the wgpu module created from it.
pub struct WgpuShader {
    stage: CompiledStage,
    module: wgpu::ShaderModule,
}

/// Linked pipeline and its transform uniform.
///
/// The uniform is only ever written by copies recorded in a command encoder,
/// so each draw reads the transform of its own target even when the same
/// program is drawn several times before a submit. This assumes encoders are
/// submitted in the order they record draws.
pub struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
    transform_ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    // Value the most recently recorded copy leaves in `transform_ubo`.
    encoded_transform: Cell<Option<Mat4>>,
}

impl WgpuProgram {
    /// Records a copy of `transform` into the uniform unless the previous
    /// recorded copy already left it there.
    fn encode_transform(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        transform: &Mat4,
    ) {
        if self.encoded_transform.get().as_ref() == Some(transform) {
            return;
        }
        let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("circlet batch transform staging"),
            contents: bytemuck::bytes_of(transform),
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        encoder.copy_buffer_to_buffer(&staging, 0, &self.transform_ubo, 0, TRANSFORM_SIZE);
        self.encoded_transform.set(Some(*transform));
    }
}

/// wgpu has no fan topology; the fan is expressed as a static index list.
pub struct FanIndices {
    ibo: wgpu::Buffer,
    index_count: u32,
}

// wgpu rejects zero-sized vertex buffer bindings.
const MIN_BUFFER_SIZE: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

const TRANSFORM_SIZE: u64 = std::mem::size_of::<Mat4>() as u64;

impl GraphicsContext for RenderCtx {
    type Shader = WgpuShader;
    type Program = WgpuProgram;
    type Buffer = wgpu::Buffer;
    type VertexArray = FanIndices;
    type Target<'t> = RenderTarget<'t>;

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<WgpuShader, String> {
        // Validate up front so wgpu never sees an invalid module.
        let compiled = wgsl::compile(stage, source)?;
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(match stage {
                ShaderStage::Vertex => "circlet batch vertex shader",
                ShaderStage::Fragment => "circlet batch fragment shader",
            }),
            source: wgpu::ShaderSource::Wgsl(source.to_owned().into()),
        });
        Ok(WgpuShader { stage: compiled, module })
    }

    fn link_program(
        &self,
        vertex: &WgpuShader,
        fragment: &WgpuShader,
        buffers: &[VertexBufferLayout],
    ) -> Result<WgpuProgram, String> {
        wgsl::link(&vertex.stage, &fragment.stage, buffers)?;

        let bind_group_layout =
            self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("circlet batch bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: transform_min_binding_size(),
                    },
                    count: None,
                }],
            });

        let pipeline_layout =
            self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("circlet batch pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = buffers
            .iter()
            .map(|b| {
                b.attributes
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: map_format(a.format),
                        offset: a.offset,
                        shader_location: a.location,
                    })
                    .collect()
            })
            .collect();
        let layouts: Vec<wgpu::VertexBufferLayout<'_>> = buffers
            .iter()
            .zip(&attributes)
            .map(|(b, attrs)| wgpu::VertexBufferLayout {
                array_stride: b.stride,
                step_mode: match b.step {
                    StepMode::Vertex => wgpu::VertexStepMode::Vertex,
                    StepMode::Instance => wgpu::VertexStepMode::Instance,
                },
                attributes: attrs,
            })
            .collect();

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("circlet batch pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(vertex.stage.entry_point()),
                compilation_options: Default::default(),
                buffers: &layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(fragment.stage.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    // Instance colors are straight (non-premultiplied) alpha.
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let transform_ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("circlet batch transform ubo"),
            size: TRANSFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("circlet batch bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_ubo.as_entire_binding(),
            }],
        });

        Ok(WgpuProgram {
            pipeline,
            transform_ubo,
            bind_group,
            encoded_transform: Cell::new(None),
        })
    }

    fn create_buffer(&self, label: &str, kind: BufferKind, contents: &[u8]) -> wgpu::Buffer {
        let usage = match kind {
            BufferKind::StaticVertex => wgpu::BufferUsages::VERTEX,
            BufferKind::DynamicVertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        };
        if contents.is_empty() {
            return self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: MIN_BUFFER_SIZE,
                usage,
                mapped_at_creation: false,
            });
        }
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        })
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn create_vertex_array(&self, _geometry: &wgpu::Buffer, vertex_count: u32) -> FanIndices {
        let indices = fan_indices(vertex_count);
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("circlet batch fan ibo"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        FanIndices {
            ibo,
            index_count: indices.len() as u32,
        }
    }

    fn draw_instanced(&self, target: &mut RenderTarget<'_>, draw: &InstancedDraw<'_, Self>) {
        if draw.instance_count == 0 || draw.vertex_array.index_count == 0 {
            return;
        }

        draw.program
            .encode_transform(&self.device, target.encoder, &draw.transform);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("circlet batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&draw.program.pipeline);
        rpass.set_bind_group(0, &draw.program.bind_group, &[]);
        rpass.set_vertex_buffer(0, draw.geometry.slice(..));
        rpass.set_vertex_buffer(1, draw.instances.slice(..));
        rpass.set_index_buffer(draw.vertex_array.ibo.slice(..), wgpu::IndexFormat::Uint32);
        let first = draw.first_instance;
        rpass.draw_indexed(0..draw.vertex_array.index_count, 0, first..first + draw.instance_count);
    }
}

fn map_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32 => wgpu::VertexFormat::Float32,
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

fn transform_min_binding_size() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(TRANSFORM_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::batch::geometry::{unit_circle, RingVertex};
    use crate::render::batch::instance::{CircleInstance, pack};
    use crate::render::batch::transform::pixel_to_ndc;
    use crate::render::batch::{Circle, ShaderSources};

    // Tests needing a device return early on machines without an adapter.
    fn headless() -> Option<RenderCtx> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok()?;
        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
        Some(RenderCtx::new(device, queue, wgpu::TextureFormat::Rgba8Unorm))
    }

    fn read_back(ctx: &RenderCtx, buffer: &wgpu::Buffer) -> Mat4 {
        let slice = buffer.slice(..);
        slice.map_async(wgpu::MapMode::Read, |r| r.unwrap());
        let _ = ctx.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        });
        let bytes = slice.get_mapped_range();
        *bytemuck::from_bytes::<Mat4>(&bytes)
    }

    #[test]
    fn each_draw_sees_its_own_transform() {
        let Some(ctx) = headless() else {
            eprintln!("no wgpu adapter, skipping");
            return;
        };

        let sources = ShaderSources::circle();
        let vs = ctx.compile_shader(ShaderStage::Vertex, &sources.vertex).unwrap();
        let fs = ctx.compile_shader(ShaderStage::Fragment, &sources.fragment).unwrap();
        let program = ctx
            .link_program(&vs, &fs, &[RingVertex::layout(), CircleInstance::layout()])
            .unwrap();

        let ring = unit_circle(8).unwrap();
        let geometry = ctx.create_buffer("ring", BufferKind::StaticVertex, bytemuck::cast_slice(&ring));
        let vertex_array = ctx.create_vertex_array(&geometry, ring.len() as u32);
        let packed = pack(&[Circle::default()]);
        let instances = ctx.create_buffer("instances", BufferKind::StaticVertex, bytemuck::cast_slice(&packed));

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d { width: 8, height: 8, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let readback = |label| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: TRANSFORM_SIZE,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        };
        let after_wide = readback("after wide");
        let after_square = readback("after square");

        let mut encoder = ctx.device.create_command_encoder(&Default::default());
        for (size, out) in [((800, 400), &after_wide), ((400, 400), &after_square)] {
            let draw = InstancedDraw {
                program: &program,
                vertex_array: &vertex_array,
                geometry: &geometry,
                instances: &instances,
                vertex_count: ring.len() as u32,
                first_instance: 0,
                instance_count: 1,
                transform: pixel_to_ndc(size.0, size.1),
            };
            let mut target = RenderTarget::new(&mut encoder, &view, size);
            ctx.draw_instanced(&mut target, &draw);
            encoder.copy_buffer_to_buffer(&program.transform_ubo, 0, out, 0, TRANSFORM_SIZE);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));

        assert_eq!(read_back(&ctx, &after_wide), pixel_to_ndc(800, 400));
        assert_eq!(read_back(&ctx, &after_square), pixel_to_ndc(400, 400));
    }
}
