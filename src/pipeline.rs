//! Compiled pipelines and their double-buffered bind groups.

use wgpu::{CommandEncoderDescriptor, Device, Queue, SubmissionIndex, TextureFormat, TextureView};

use crate::{
    config::LifeConfig,
    rendering::RenderStage,
    resources::{CellBuffers, Resources},
    sim::{FrameStep, gpucompute::ComputeStage},
};

/// Compute and render stages built over one [`Resources`].
///
/// The compute stage exists only when the cells are double buffered; a
/// render-only configuration is the same pipeline without it.
pub struct PipelineSet {
    compute: Option<ComputeStage>,
    render: RenderStage,
}

impl PipelineSet {
    pub fn new(
        device: &Device,
        resources: &Resources,
        config: &LifeConfig,
        target_format: TextureFormat,
    ) -> Self {
        let compute = Self::build_compute_pipeline(device, resources, config);
        let render = Self::build_render_pipeline(device, resources, config, target_format);
        log::debug!(
            "pipelines built: compute stage {}, target {target_format:?}",
            if compute.is_some() { "on" } else { "off" }
        );
        Self { compute, render }
    }

    /// Uniform width, read-only source and writable destination, with one bind
    /// group per parity. `None` for single-buffered cells.
    pub fn build_compute_pipeline(
        device: &Device,
        resources: &Resources,
        config: &LifeConfig,
    ) -> Option<ComputeStage> {
        match resources.cells() {
            CellBuffers::Single(_) => None,
            CellBuffers::Double(cells) => Some(ComputeStage::new(
                device,
                resources.uniform(),
                cells,
                resources.grid_width(),
                config.edge_policy,
            )),
        }
    }

    pub fn build_render_pipeline(
        device: &Device,
        resources: &Resources,
        config: &LifeConfig,
        target_format: TextureFormat,
    ) -> RenderStage {
        RenderStage::new(device, resources, target_format, config.clear_color)
    }

    pub fn compute(&self) -> Option<&ComputeStage> {
        self.compute.as_ref()
    }

    /// Records and submits one advanced frame as a single batch: the compute
    /// pass first, then the render pass into `target`.
    ///
    /// With no `target` (image acquisition failed) only the compute pass is
    /// submitted, so the generation still advances in step with the parity.
    pub fn submit_frame(
        &self,
        device: &Device,
        queue: &Queue,
        resources: &Resources,
        target: Option<&TextureView>,
        frame: FrameStep,
    ) -> SubmissionIndex {
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("compute and render encoder"),
        });
        if let Some(compute) = &self.compute {
            compute.record(&mut encoder, frame.parity);
        }
        if let Some(view) = target {
            self.render
                .record(&mut encoder, view, frame.parity, resources);
        }
        queue.submit(std::iter::once(encoder.finish()))
    }
}
