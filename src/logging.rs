use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global `fern` logger once; later calls are ignored.
pub fn init_logging(level: log::LevelFilter) {
    INIT.call_once(|| {
        if let Err(e) = dispatch(level).apply() {
            // Another logger was installed by the host; keep using it.
            eprintln!("lifesim: logger already set: {e}");
        }
        log::debug!("logging initialized at {level}");
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn dispatch(level: log::LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_millis(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("wgpu_core", log::LevelFilter::Warn)
        .level_for("wgpu_hal", log::LevelFilter::Warn)
        .level_for("naga", log::LevelFilter::Warn)
        .chain(std::io::stderr())
}

#[cfg(target_arch = "wasm32")]
fn dispatch(level: log::LevelFilter) -> fern::Dispatch {
    console_error_panic_hook::set_once();
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("wgpu_core", log::LevelFilter::Warn)
        .level_for("wgpu_hal", log::LevelFilter::Warn)
        .chain(fern::Output::call(console_log::log))
}
