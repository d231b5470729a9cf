use anyhow::{Context, bail};

use lifesim::{config::LifeConfig, logging};

fn main() -> anyhow::Result<()> {
    let config = LifeConfig::from_env().context("reading LIFESIM_* environment")?;
    logging::init_logging(config.log_level);

    log::info!(
        "starting {}x{} {:?} grid, seed {:?}",
        config.grid_width,
        config.grid_width,
        config.variant,
        config.seed
    );

    if !lifesim::run(config) {
        bail!("GPU pipeline could not start on this machine");
    }
    Ok(())
}
