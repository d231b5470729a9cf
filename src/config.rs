use std::time::Duration;

use anyhow::{Context, anyhow, bail, ensure};

use crate::{
    sim::{EdgePolicy, SeedPattern},
    util::Color,
};

/// Largest grid width whose cell count still fits in one dispatch dimension
/// (65 535 workgroups of 64 invocations).
pub const MAX_GRID_WIDTH: u32 = 2047;

/// Which pipeline configuration runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Compute + render over a double-buffered grid, throttled to `tick_interval`.
    Simulated,
    /// Render-only over a single buffer; every callback draws.
    Static,
}

/// Startup configuration for the simulation and display pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct LifeConfig {
    /// Cells per side of the square grid.
    pub grid_width: u32,
    pub variant: Variant,
    pub seed: SeedPattern,
    pub edge_policy: EdgePolicy,
    /// Minimum wall-clock time between two generations.
    pub tick_interval: Duration,
    /// Clear color of the render pass; dead cells are drawn in it as well.
    pub clear_color: Color,
    pub log_level: log::LevelFilter,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self::glider_gun()
    }
}

impl LifeConfig {
    pub fn glider_gun() -> Self {
        Self {
            grid_width: 64,
            variant: Variant::Simulated,
            seed: SeedPattern::GosperGliderGun,
            edge_policy: EdgePolicy::Wrap,
            tick_interval: Duration::from_millis(100),
            clear_color: Color::rgb(51, 51, 51),
            log_level: log::LevelFilter::Info,
        }
    }

    pub fn checkerboard() -> Self {
        Self {
            grid_width: 32,
            variant: Variant::Static,
            seed: SeedPattern::Checkerboard,
            ..Self::glider_gun()
        }
    }

    /// Default configuration overlaid with `LIFESIM_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by `var`; unknown values are errors.
    pub fn overlay(mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        if let Some(v) = var("LIFESIM_VARIANT") {
            let preset = match v.as_str() {
                "simulated" => Self::glider_gun(),
                "static" => Self::checkerboard(),
                other => bail!("unknown LIFESIM_VARIANT `{other}`"),
            };
            self.variant = preset.variant;
            self.seed = preset.seed;
            self.grid_width = preset.grid_width;
        }
        if let Some(v) = var("LIFESIM_GRID_WIDTH") {
            self.grid_width = v
                .parse()
                .with_context(|| format!("invalid LIFESIM_GRID_WIDTH `{v}`"))?;
        }
        if let Some(v) = var("LIFESIM_SEED") {
            self.seed = match v.as_str() {
                "gun" => SeedPattern::GosperGliderGun,
                "checkerboard" => SeedPattern::Checkerboard,
                "random" => SeedPattern::Random {
                    density: 0.25,
                    seed: fastrand::u64(..),
                },
                other => bail!("unknown LIFESIM_SEED `{other}`"),
            };
        }
        if let Some(v) = var("LIFESIM_EDGES") {
            self.edge_policy = match v.as_str() {
                "wrap" => EdgePolicy::Wrap,
                "dead" => EdgePolicy::Dead,
                other => bail!("unknown LIFESIM_EDGES `{other}`"),
            };
        }
        if let Some(v) = var("LIFESIM_TICK") {
            self.tick_interval = humantime::parse_duration(&v)
                .with_context(|| format!("invalid LIFESIM_TICK `{v}`"))?;
        }
        if let Some(v) = var("LIFESIM_CLEAR_COLOR") {
            self.clear_color = Color::from_hex(&v)
                .with_context(|| format!("invalid LIFESIM_CLEAR_COLOR `{v}`"))?;
        }
        if let Some(v) = var("LIFESIM_LOG") {
            self.log_level = v
                .parse()
                .map_err(|_| anyhow!("invalid LIFESIM_LOG `{v}`"))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.grid_width > 0, "grid width must be positive");
        ensure!(
            self.grid_width <= MAX_GRID_WIDTH,
            "grid width {} exceeds the maximum of {MAX_GRID_WIDTH}",
            self.grid_width
        );
        let min = self.seed.min_width();
        ensure!(
            self.grid_width >= min,
            "seed {:?} needs a grid at least {min} cells wide, got {}",
            self.seed,
            self.grid_width
        );
        if let SeedPattern::Random { density, .. } = self.seed {
            ensure!(
                (0.0..=1.0).contains(&density),
                "random seed density {density} is outside [0, 1]"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn presets_are_valid() {
        LifeConfig::glider_gun().validate().unwrap();
        LifeConfig::checkerboard().validate().unwrap();
        assert_eq!(LifeConfig::default().tick_interval, Duration::from_millis(100));
    }

    #[test]
    fn empty_overlay_keeps_defaults() {
        let cfg = LifeConfig::default().overlay(env(&[])).unwrap();
        assert_eq!(cfg, LifeConfig::default());
    }

    #[test]
    fn overlay_parses_every_key() {
        let cfg = LifeConfig::default()
            .overlay(env(&[
                ("LIFESIM_GRID_WIDTH", "128"),
                ("LIFESIM_EDGES", "dead"),
                ("LIFESIM_TICK", "250ms"),
                ("LIFESIM_CLEAR_COLOR", "#102030"),
                ("LIFESIM_LOG", "debug"),
            ]))
            .unwrap();
        assert_eq!(cfg.grid_width, 128);
        assert_eq!(cfg.edge_policy, EdgePolicy::Dead);
        assert_eq!(cfg.tick_interval, Duration::from_millis(250));
        assert_eq!(cfg.clear_color, Color::rgb(0x10, 0x20, 0x30));
        assert_eq!(cfg.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn static_variant_switches_preset() {
        let cfg = LifeConfig::default()
            .overlay(env(&[("LIFESIM_VARIANT", "static")]))
            .unwrap();
        assert_eq!(cfg.variant, Variant::Static);
        assert_eq!(cfg.seed, SeedPattern::Checkerboard);
        assert_eq!(cfg.grid_width, 32);
    }

    #[test]
    fn malformed_values_are_rejected() {
        for (key, value) in [
            ("LIFESIM_GRID_WIDTH", "wide"),
            ("LIFESIM_EDGES", "mirror"),
            ("LIFESIM_TICK", "soon"),
            ("LIFESIM_VARIANT", "fancy"),
            ("LIFESIM_SEED", "acorn"),
        ] {
            assert!(
                LifeConfig::default().overlay(env(&[(key, value)])).is_err(),
                "{key}={value} should fail"
            );
        }
    }

    #[test]
    fn validation_bounds() {
        let mut cfg = LifeConfig::glider_gun();
        cfg.grid_width = 0;
        assert!(cfg.validate().is_err());
        cfg.grid_width = MAX_GRID_WIDTH + 1;
        assert!(cfg.validate().is_err());
        // The glider gun is 37 columns wide.
        cfg.grid_width = 36;
        assert!(cfg.validate().is_err());
        cfg.grid_width = 37;
        assert!(cfg.validate().is_ok());

        cfg.seed = SeedPattern::Random {
            density: 1.5,
            seed: 1,
        };
        assert!(cfg.validate().is_err());
    }
}
