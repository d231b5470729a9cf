//! Integrated GPU context that drives both the simulation and its display
//!
//! `GpuLifeRenderer` owns the device, the surface, every buffer and both
//! pipelines, and turns display-refresh callbacks into submitted frames.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use wgpu::{Instance, SurfaceError};
use winit::window::Window;

use crate::{
    config::{LifeConfig, Variant},
    device::GpuContext,
    pipeline::PipelineSet,
    resources::Resources,
    sim::FrameScheduler,
    surface::{self, SurfaceErrorAction, SurfaceManager},
};

/// How often the achieved generation rate is logged.
const RATE_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of one refresh callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// The throttle was not due; nothing was submitted.
    Skipped,
    /// A frame was submitted and presented.
    Presented,
    /// The generation advanced but there is no surface to present to yet.
    Hidden,
}

pub struct GpuLifeRenderer {
    gpu: GpuContext,
    surface: SurfaceManager,
    resources: Resources,
    pipelines: PipelineSet,
    scheduler: FrameScheduler,
    window: Arc<Window>,
    /// Start of the current rate-logging window and the steps seen at that point.
    rate_window: Option<(Duration, u64)>,
}

impl GpuLifeRenderer {
    /// Acquires the GPU for `window` and builds everything the frame loop needs,
    /// in dependency order: device, resources, pipelines, surface configuration.
    ///
    /// Errors mean the platform is unsupported (no adapter, no compute shaders,
    /// device rejected); the loop must not be started.
    pub async fn new(window: Arc<Window>, config: LifeConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let instance = Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let needs_compute = config.variant == Variant::Simulated;
        let gpu = GpuContext::new(instance, Some(&surface), needs_compute).await?;
        let mut surface = SurfaceManager::new(surface, gpu.adapter())?;

        let resources = Resources::new(gpu.device(), &config);
        let pipelines = PipelineSet::new(gpu.device(), &resources, &config, surface.format());

        let size = window.inner_size();
        let (width, height) = surface::startup_size(size.width, size.height);
        surface.configure(gpu.device(), width, height);

        let scheduler = match config.variant {
            Variant::Simulated => FrameScheduler::throttled(config.tick_interval),
            Variant::Static => FrameScheduler::unthrottled(),
        };

        log::info!(
            "{}x{} grid ready ({:?}, {:?} edges)",
            config.grid_width,
            config.grid_width,
            config.variant,
            config.edge_policy
        );

        Ok(Self {
            gpu,
            surface,
            resources,
            pipelines,
            scheduler,
            window,
            rate_window: None,
        })
    }

    /// Handles one display-refresh callback at host time `now`.
    ///
    /// On an advanced frame the compute pass is submitted even if the surface
    /// image cannot be acquired; the error is returned after the generation
    /// has advanced.
    pub fn advance_frame(&mut self, now: Duration) -> Result<FrameOutcome, SurfaceError> {
        let Some(frame) = self.scheduler.advance_frame(now) else {
            return Ok(FrameOutcome::Skipped);
        };
        self.log_rate(now);

        let device = self.gpu.device();
        let queue = self.gpu.queue();
        if !self.surface.is_configured() {
            self.pipelines
                .submit_frame(device, queue, &self.resources, None, frame);
            return Ok(FrameOutcome::Hidden);
        }
        match self.surface.acquire_current_image() {
            Ok(image) => {
                self.pipelines
                    .submit_frame(device, queue, &self.resources, Some(&image.view), frame);
                image.present();
                Ok(FrameOutcome::Presented)
            }
            Err(e) => {
                self.pipelines
                    .submit_frame(device, queue, &self.resources, None, frame);
                Err(e)
            }
        }
    }

    /// Lets the surface recover from an acquisition error.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        log::warn!("surface error: {err}");
        self.surface.handle_error(self.gpu.device(), err)
    }

    /// Reconfigures the surface for new display dimensions.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.surface.configure(self.gpu.device(), width, height);
    }

    /// Request a redraw of the window
    /// Call this after every callback to keep the loop going
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Frames advanced so far.
    pub fn steps(&self) -> u64 {
        self.scheduler.steps()
    }

    pub fn grid_width(&self) -> u32 {
        self.resources.grid_width()
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface.size()
    }

    fn log_rate(&mut self, now: Duration) {
        let steps = self.scheduler.steps();
        match self.rate_window {
            None => self.rate_window = Some((now, steps)),
            Some((start, start_steps)) => {
                let elapsed = now.saturating_sub(start);
                if elapsed >= RATE_LOG_INTERVAL {
                    let advanced = steps - start_steps;
                    log::debug!(
                        "{:.1} generations/sec ({advanced} in {:.1}s)",
                        advanced as f64 / elapsed.as_secs_f64(),
                        elapsed.as_secs_f64()
                    );
                    self.rate_window = Some((now, steps));
                }
            }
        }
    }
}
