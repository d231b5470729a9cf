use anyhow::{Context, ensure};
use wgpu::{Adapter, Device, Instance, Queue, Surface};

/// The logical device and its queue, plus what was needed to get them.
///
/// Acquisition is attempted exactly once. Any error here means the platform
/// cannot run the pipeline; callers report it and never start the frame loop.
pub struct GpuContext {
    #[allow(dead_code)]
    instance: Instance, // Keep instance alive for the lifetime of the device
    adapter: Adapter,
    device: Device,
    queue: Queue,
}

impl GpuContext {
    /// Acquires an adapter able to present to `surface` (if any) and a device on it.
    ///
    /// `needs_compute` rejects adapters without compute shader support, such as
    /// WebGL2 fallbacks.
    pub async fn new(
        instance: Instance,
        surface: Option<&Surface<'_>>,
        needs_compute: bool,
    ) -> anyhow::Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: surface,
            })
            .await
            .context("no suitable GPU adapter")?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        if needs_compute {
            let downlevel_caps = adapter.get_downlevel_capabilities();
            ensure!(
                downlevel_caps
                    .flags
                    .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
                "adapter does not support compute shaders"
            );
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lifesim device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("device request rejected")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// A device with no presentation surface, for offscreen rendering.
    pub async fn headless() -> anyhow::Result<Self> {
        let instance = Instance::new(&wgpu::InstanceDescriptor::default());
        Self::new(instance, None, true).await
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}
