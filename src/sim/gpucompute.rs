use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, Buffer, CommandEncoder, ComputePassDescriptor, ComputePipeline,
    ComputePipelineDescriptor, Device, PipelineCompilationOptions, PipelineLayoutDescriptor,
    ShaderStages,
};

use crate::sim::{EdgePolicy, Pair, Parity, Slot};

/// Invocations per workgroup; must match `@workgroup_size` in `compute.wgsl`.
pub const WORKGROUP_SIZE: u32 = 64;

/// Workgroups needed for one invocation per cell.
pub fn workgroup_count(cells: u32) -> u32 {
    cells.div_ceil(WORKGROUP_SIZE)
}

/// The simulation half of the pipeline: one generation per dispatch.
pub struct ComputeStage {
    pipeline: ComputePipeline,
    /// Keyed by the slot each bind group reads from.
    bind_groups: Pair<BindGroup>,
    workgroups: u32,
}

impl ComputeStage {
    pub fn new(
        device: &Device,
        uniform: &Buffer,
        cells: &Pair<Buffer>,
        grid_width: u32,
        edges: EdgePolicy,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::include_wgsl!("./compute.wgsl"));
        let layout = bind_group_layout(device);

        let bind_groups = Pair::from_fn(|source| {
            let destination = source.other();
            device.create_bind_group(&BindGroupDescriptor {
                label: Some(match source {
                    Slot::A => "cells bind group (A -> B)",
                    Slot::B => "cells bind group (B -> A)",
                }),
                layout: &layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: cells.get(source).as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 2,
                        resource: cells.get(destination).as_entire_binding(),
                    },
                ],
            })
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("simulation pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
            label: Some("simulation compute pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: PipelineCompilationOptions {
                constants: &[("wrap_edges", edges.shader_constant())],
                ..Default::default()
            },
            cache: None,
        });

        Self {
            pipeline,
            bind_groups,
            workgroups: workgroup_count(grid_width * grid_width),
        }
    }

    pub fn bind_group(&self, parity: Parity) -> &BindGroup {
        self.bind_groups.get(parity.source())
    }

    /// Records one generation: reads `parity.source()`, writes `parity.destination()`.
    pub fn record(&self, encoder: &mut CommandEncoder, parity: Parity) {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("simulation step compute pass"),
            ..Default::default()
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.bind_group(parity), &[]);
        pass.dispatch_workgroups(self.workgroups, 1, 1);
    }
}

fn bind_group_layout(device: &Device) -> BindGroupLayout {
    let storage = |binding, read_only| BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("cells bind group layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(4),
                },
                count: None,
            },
            // current generation
            storage(1, true),
            // next generation
            storage(2, false),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_invocation_per_cell() {
        assert_eq!(workgroup_count(64 * 64), 64);
        assert_eq!(workgroup_count(1), 1);
        assert_eq!(workgroup_count(65), 2);
        let width = crate::config::MAX_GRID_WIDTH;
        assert!(workgroup_count(width * width) <= 65_535);
    }
}
