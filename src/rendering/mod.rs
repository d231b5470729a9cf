use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, Buffer, CommandEncoder, Device, FragmentState, IndexFormat, LoadOp,
    MultisampleState, Operations, PipelineCompilationOptions, PipelineLayoutDescriptor,
    PrimitiveState, RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline,
    RenderPipelineDescriptor, ShaderStages, StoreOp, TextureFormat, TextureView, VertexAttribute,
    VertexBufferLayout, VertexState, VertexStepMode,
};

use crate::{
    resources::{CellBuffers, QUAD_INDICES, Resources},
    sim::{Pair, Parity},
    util::Color,
};

const VERTEX_ATTRIBUTES: [VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

/// Cell-buffer bindings of the draw stage.
enum RenderBindings {
    Single(BindGroup),
    /// Keyed by the slot the bind group reads.
    Double(Pair<BindGroup>),
}

/// The display half of the pipeline: draws the current generation onto a
/// full-viewport quad.
pub struct RenderStage {
    pipeline: RenderPipeline,
    bindings: RenderBindings,
    clear_color: wgpu::Color,
}

impl RenderStage {
    pub fn new(
        device: &Device,
        resources: &Resources,
        target_format: TextureFormat,
        background: Color,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::include_wgsl!("./draw.wgsl"));
        let layout = bind_group_layout(device);

        let bind = |label: &str, cells: &Buffer| {
            device.create_bind_group(&BindGroupDescriptor {
                label: Some(label),
                layout: &layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: resources.uniform().as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: cells.as_entire_binding(),
                    },
                ],
            })
        };
        let bindings = match resources.cells() {
            CellBuffers::Single(cells) => RenderBindings::Single(bind("render cells", cells)),
            CellBuffers::Double(pair) => RenderBindings::Double(Pair::from_fn(|slot| {
                let label = format!("render cells ({slot:?})");
                bind(&label, pair.get(slot))
            })),
        };

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("render pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let [alive_r, alive_g, alive_b] = Color::WHITE.unit_channels();
        let [dead_r, dead_g, dead_b] = background.unit_channels();
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("render pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vert_stage"),
                buffers: &[VertexBufferLayout {
                    array_stride: 4 * 3,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("frag_stage"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions {
                    constants: &[
                        ("alive_r", alive_r),
                        ("alive_g", alive_g),
                        ("alive_b", alive_b),
                        ("dead_r", dead_r),
                        ("dead_g", dead_g),
                        ("dead_b", dead_b),
                    ],
                    ..Default::default()
                },
            }),
            primitive: PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: Some(IndexFormat::Uint16),
                front_face: wgpu::FrontFace::Cw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bindings,
            clear_color: background.to_wgpu(),
        }
    }

    /// Bind group exposing the generation that is current for `parity`.
    pub fn bind_group(&self, parity: Parity) -> &BindGroup {
        match &self.bindings {
            RenderBindings::Single(bind_group) => bind_group,
            RenderBindings::Double(pair) => pair.get(parity.source()),
        }
    }

    /// Records a render pass that clears `view` and draws the quad over it.
    pub fn record(
        &self,
        encoder: &mut CommandEncoder,
        view: &TextureView,
        parity: Parity,
        resources: &Resources,
    ) {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("render pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(self.clear_color),
                    store: StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.bind_group(parity), &[]);
        pass.set_vertex_buffer(0, resources.positions().slice(..));
        pass.set_index_buffer(resources.indices().slice(..), IndexFormat::Uint16);
        pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }
}

fn bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("render cells bind group layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(4),
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}
