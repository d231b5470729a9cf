use std::{sync::Arc, time::Duration};

use crate::{
    config::LifeConfig,
    gpu::GpuLifeRenderer,
    surface::SurfaceErrorAction,
};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use winit::{
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowAttributes},
};

#[cfg(target_arch = "wasm32")]
use winit::platform::web::WindowAttributesExtWebSys;

pub mod config;
pub mod device;
pub mod gpu;
pub mod logging;
pub mod pipeline;
pub mod rendering;
pub mod resources;
pub mod sim;
pub mod surface;
pub mod util;

/// Id of the canvas element the web build draws into.
#[cfg(target_arch = "wasm32")]
pub const CANVAS_ID: &str = "gfx";

/// Message type for GPU renderer events
pub enum GpuMessage {
    Initialized(GpuLifeRenderer),
    /// No usable adapter or device; the frame loop never starts.
    Unsupported(String),
}

struct Application {
    config: LifeConfig,
    proxy: Option<EventLoopProxy<GpuMessage>>,
    gpu_renderer: Option<GpuLifeRenderer>,
    /// `Some` once initialization has finished either way.
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    supported: Option<bool>,
    #[cfg(not(target_arch = "wasm32"))]
    epoch: std::time::Instant,
}

impl Application {
    fn new(event_loop: &EventLoop<GpuMessage>, config: LifeConfig) -> Self {
        Self {
            config,
            proxy: Some(event_loop.create_proxy()),
            gpu_renderer: None,
            supported: None,
            #[cfg(not(target_arch = "wasm32"))]
            epoch: std::time::Instant::now(),
        }
    }

    /// Host time for the frame scheduler.
    #[cfg(not(target_arch = "wasm32"))]
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    #[cfg(target_arch = "wasm32")]
    fn now(&self) -> Duration {
        Duration::from_secs_f64(js_sys::Date::now() / 1000.0)
    }

    #[cfg(target_arch = "wasm32")]
    fn window_attributes(&self) -> anyhow::Result<WindowAttributes> {
        use anyhow::{Context, anyhow};

        let dom_window = web_sys::window().context("no DOM window")?;
        let canvas: web_sys::HtmlCanvasElement = dom_window
            .document()
            .context("no document")?
            .get_element_by_id(CANVAS_ID)
            .with_context(|| format!("no element with id `{CANVAS_ID}`"))?
            .dyn_into()
            .map_err(|_| anyhow!("`{CANVAS_ID}` is not a canvas"))?;

        let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let side = dimension(dom_window.inner_width()).min(dimension(dom_window.inner_height()));
        canvas.set_width(side as u32);
        canvas.set_height(side as u32);

        Ok(WindowAttributes::default().with_canvas(Some(canvas)))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn window_attributes(&self) -> anyhow::Result<WindowAttributes> {
        Ok(WindowAttributes::default()
            .with_title("lifesim")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 800)))
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.now();
        let Some(ref mut renderer) = self.gpu_renderer else {
            return;
        };

        match renderer.advance_frame(now) {
            Ok(_) => {}
            Err(e) => match renderer.handle_surface_error(e) {
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {}
                SurfaceErrorAction::Fatal => {
                    log::error!("Out of memory!");
                    self.gpu_renderer = None;
                    event_loop.exit();
                    return;
                }
            },
        }
        renderer.request_redraw();
    }
}

/// Builds the renderer for `window` and reports the result to the loop.
async fn initialize(window: Arc<Window>, config: LifeConfig, proxy: EventLoopProxy<GpuMessage>) {
    let message = match GpuLifeRenderer::new(window, config).await {
        Ok(renderer) => GpuMessage::Initialized(renderer),
        Err(e) => GpuMessage::Unsupported(format!("{e:#}")),
    };
    if proxy.send_event(message).is_err() {
        log::warn!("event loop closed before GPU initialization finished");
    }
}

impl winit::application::ApplicationHandler<GpuMessage> for Application {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(proxy) = self.proxy.take() else {
            return;
        };

        let window = match self
            .window_attributes()
            .and_then(|attrs| Ok(event_loop.create_window(attrs)?))
        {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.supported = Some(false);
                event_loop.exit();
                return;
            }
        };
        let config = self.config.clone();

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(initialize(window, config, proxy));

        // On native, use pollster to block on the future
        #[cfg(not(target_arch = "wasm32"))]
        pollster::block_on(initialize(window, config, proxy));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.gpu_renderer = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut renderer) = self.gpu_renderer {
                    renderer.on_resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        };
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: GpuMessage) {
        match event {
            GpuMessage::Initialized(renderer) => {
                log::info!(
                    "GPU renderer initialized, {}x{} surface",
                    renderer.surface_size().0,
                    renderer.surface_size().1
                );
                self.supported = Some(true);
                // Request first redraw to kick off the animation loop
                renderer.request_redraw();
                self.gpu_renderer = Some(renderer);
            }
            GpuMessage::Unsupported(e) => {
                log::error!("WebGPU is not supported here: {e}");
                self.supported = Some(false);
                event_loop.exit();
            }
        }
    }
}

/// Runs the simulation in a window until it is closed.
///
/// Returns `false` if the pipeline could not start: no event loop, no window,
/// or no usable GPU. On the web the loop runs detached, so `true` only means
/// it was launched; GPU failures are then reported through the log.
pub fn run(config: LifeConfig) -> bool {
    if let Err(e) = config.validate() {
        log::error!("invalid configuration: {e:#}");
        return false;
    }

    let event_loop = match EventLoop::<GpuMessage>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            return false;
        }
    };

    #[allow(unused_mut)]
    let mut app = Application::new(&event_loop, config);

    // On web, we need to spawn the event loop
    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(app);
        true
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = event_loop.run_app(&mut app) {
            log::error!("event loop error: {e}");
            return false;
        }
        app.supported.unwrap_or(false)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn initialize_logging() {
    logging::init_logging(LifeConfig::default().log_level);
}

/// Start the Game of Life simulation on the `gfx` canvas
///
/// `static_checkerboard` selects the render-only checkerboard instead of the
/// simulated glider gun.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start(static_checkerboard: bool) -> bool {
    let config = if static_checkerboard {
        LifeConfig::checkerboard()
    } else {
        LifeConfig::glider_gun()
    };
    log::info!("Starting Game of Life with GPU rendering");
    run(config)
}
