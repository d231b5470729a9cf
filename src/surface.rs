use wgpu::{
    Adapter, Device, Surface, SurfaceCapabilities, SurfaceConfiguration, SurfaceError,
    SurfaceTexture, TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

/// The presentable image of one advanced frame.
///
/// Frame-scoped: it is presented (or dropped) right after submission and never
/// reused.
pub struct SurfaceFrame {
    pub texture: SurfaceTexture,
    pub view: TextureView,
}

impl SurfaceFrame {
    pub fn present(self) {
        drop(self.view);
        self.texture.present();
    }
}

/// What the caller should do after a failed acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame can present again.
    Reconfigured,
    /// Transient; only this presentation is lost.
    SkipFrame,
    /// Unrecoverable (out of memory); stop the loop.
    Fatal,
}

/// Owns the presentation surface and its configuration.
///
/// The surface handle lives as long as the window; only its configuration
/// changes on resize.
pub struct SurfaceManager {
    surface: Surface<'static>,
    config: SurfaceConfiguration,
}

impl SurfaceManager {
    /// Picks a fixed pixel format for the surface. Nothing is presented until
    /// [`SurfaceManager::configure`] runs.
    pub fn new(surface: Surface<'static>, adapter: &Adapter) -> anyhow::Result<Self> {
        let caps = surface.get_capabilities(adapter);
        let format = choose_format(&caps)
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        log::debug!("surface format {format:?}, alpha mode {alpha_mode:?}");

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: 0,
            height: 0,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        Ok(Self { surface, config })
    }

    pub fn format(&self) -> TextureFormat {
        self.config.format
    }

    /// Current presentable size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Binds the surface to `device` at the given size.
    ///
    /// A zero dimension (minimized window, hidden canvas) is ignored: wgpu
    /// cannot configure an empty surface, so the previous size is kept.
    pub fn configure(&mut self, device: &Device, width: u32, height: u32) {
        if !apply_size(&mut self.config, width, height) {
            log::debug!("ignoring empty surface size {width}x{height}");
            return;
        }
        self.surface.configure(device, &self.config);
        log::debug!("surface configured at {width}x{height}");
    }

    pub fn is_configured(&self) -> bool {
        self.config.width > 0 && self.config.height > 0
    }

    /// Returns the next presentable image and a view onto it.
    pub fn acquire_current_image(&self) -> Result<SurfaceFrame, SurfaceError> {
        let texture = self.surface.get_current_texture()?;
        let view = texture
            .texture
            .create_view(&TextureViewDescriptor::default());
        Ok(SurfaceFrame { texture, view })
    }

    /// Maps an acquisition error to an action, reconfiguring when the surface
    /// was lost or went stale.
    pub fn handle_error(&mut self, device: &Device, err: SurfaceError) -> SurfaceErrorAction {
        let action = error_action(self.is_configured(), &err);
        if action == SurfaceErrorAction::Reconfigured {
            self.surface.configure(device, &self.config);
        }
        action
    }
}

/// Size to configure at startup; a window that is not laid out yet still gets
/// a 1x1 surface.
pub(crate) fn startup_size(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}

/// Only a configured surface can be reconfigured with its last size.
pub(crate) fn error_action(configured: bool, err: &SurfaceError) -> SurfaceErrorAction {
    match err {
        SurfaceError::Lost | SurfaceError::Outdated if configured => {
            SurfaceErrorAction::Reconfigured
        }
        SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        _ => SurfaceErrorAction::SkipFrame,
    }
}

/// Writes a non-empty size into `config`; returns whether it did.
pub(crate) fn apply_size(config: &mut SurfaceConfiguration, width: u32, height: u32) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    config.width = width;
    config.height = height;
    true
}

/// Prefers plain `Bgra8Unorm`, then its sRGB twin, then whatever comes first.
pub(crate) fn choose_format(caps: &SurfaceCapabilities) -> Option<TextureFormat> {
    let preferred = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb];
    preferred
        .into_iter()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.first().copied())
}

/// Sizing and error mapping are checked on the pure helpers that
/// `SurfaceManager` delegates to. Calling `SurfaceManager::configure` itself
/// needs a window-backed surface, which headless test runs do not have.
#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: Vec<TextureFormat>) -> SurfaceCapabilities {
        SurfaceCapabilities {
            formats,
            ..Default::default()
        }
    }

    fn config() -> SurfaceConfiguration {
        SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: TextureFormat::Bgra8Unorm,
            width: 0,
            height: 0,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    #[test]
    fn resize_reports_latest_size() {
        let mut c = config();
        assert!(apply_size(&mut c, 400, 400));
        assert!(apply_size(&mut c, 800, 800));
        assert_eq!((c.width, c.height), (800, 800));
    }

    #[test]
    fn same_size_twice_is_equivalent() {
        let mut once = config();
        apply_size(&mut once, 640, 480);
        let mut twice = once.clone();
        apply_size(&mut twice, 640, 480);
        assert_eq!((once.width, once.height), (twice.width, twice.height));
        assert_eq!(once.format, twice.format);
    }

    #[test]
    fn empty_size_keeps_previous() {
        let mut c = config();
        apply_size(&mut c, 300, 200);
        assert!(!apply_size(&mut c, 0, 200));
        assert!(!apply_size(&mut c, 300, 0));
        assert_eq!((c.width, c.height), (300, 200));
    }

    #[test]
    fn zero_sized_window_still_configures_at_startup() {
        let mut c = config();
        let (w, h) = startup_size(0, 0);
        assert!(apply_size(&mut c, w, h));
        assert_eq!((c.width, c.height), (1, 1));
        assert_eq!(startup_size(800, 0), (800, 1));
        assert_eq!(startup_size(640, 480), (640, 480));
    }

    #[test]
    fn lost_surface_is_reconfigured_only_once_configured() {
        for err in [SurfaceError::Lost, SurfaceError::Outdated] {
            assert_eq!(error_action(true, &err), SurfaceErrorAction::Reconfigured);
            assert_eq!(error_action(false, &err), SurfaceErrorAction::SkipFrame);
        }
        assert_eq!(
            error_action(false, &SurfaceError::OutOfMemory),
            SurfaceErrorAction::Fatal
        );
        assert_eq!(
            error_action(true, &SurfaceError::Timeout),
            SurfaceErrorAction::SkipFrame
        );
    }

    #[test]
    fn prefers_bgra8_unorm() {
        let c = caps(vec![
            TextureFormat::Rgba8Unorm,
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Bgra8Unorm,
        ]);
        assert_eq!(choose_format(&c), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        let c = caps(vec![TextureFormat::Rgba16Float, TextureFormat::Rgba8Unorm]);
        assert_eq!(choose_format(&c), Some(TextureFormat::Rgba16Float));
        assert_eq!(choose_format(&caps(vec![])), None);
    }
}
