use atmospherics::AtmosSettings;
use bevy::log::warn;
use bevy::prelude::Resource;
use serde::Deserialize;

use ::config::{Config, Environment, File, FileFormat};

const CONFIG_BASENAME: &str = "config";

#[derive(Debug, Clone, Deserialize, Resource)]
pub struct AppConfig {
    pub atmospherics: AtmosConfig,
    pub world: WorldConfig,
    pub debug: DebugConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let atmos = AtmosSettings::default();
        Self {
            atmospherics: AtmosConfig {
                diffusion_rate: atmos.diffusion_rate,
                move_threshold: atmos.move_threshold,
                perf_refresh_secs: atmos.perf_refresh_secs,
                tick_hz: 20.0,
            },
            world: WorldConfig {
                layout_path: "assets/station.ron".to_string(),
            },
            debug: DebugConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtmosConfig {
    pub diffusion_rate: f32,
    pub move_threshold: f32,
    pub perf_refresh_secs: f32,
    /// Atmosphere ticks per second.
    pub tick_hz: f64,
}

impl AtmosConfig {
    pub fn settings(&self) -> AtmosSettings {
        AtmosSettings {
            diffusion_rate: self.diffusion_rate,
            move_threshold: self.move_threshold,
            perf_refresh_secs: self.perf_refresh_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    /// RON station layout; the built-in test station is used when missing.
    pub layout_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    pub log_level: String,
}

pub fn load_config() -> AppConfig {
    match load_config_inner() {
        Ok(config) => config,
        Err(error) => {
            warn!("Failed to load config, using defaults: {error}");
            AppConfig::default()
        }
    }
}

fn load_config_inner() -> Result<AppConfig, ::config::ConfigError> {
    builder()?
        .add_source(File::new(CONFIG_BASENAME, FileFormat::Toml).required(false))
        .add_source(File::new(CONFIG_BASENAME, FileFormat::Ron).required(false))
        .add_source(Environment::with_prefix("OUTPOST").separator("__"))
        .build()?
        .try_deserialize()
}

fn builder() -> Result<::config::ConfigBuilder<::config::builder::DefaultState>, ::config::ConfigError>
{
    let defaults = AppConfig::default();
    let atmos = defaults.atmospherics;

    Config::builder()
        .set_default("atmospherics.diffusion_rate", f64::from(atmos.diffusion_rate))?
        .set_default("atmospherics.move_threshold", f64::from(atmos.move_threshold))?
        .set_default(
            "atmospherics.perf_refresh_secs",
            f64::from(atmos.perf_refresh_secs),
        )?
        .set_default("atmospherics.tick_hz", atmos.tick_hz)?
        .set_default("world.layout_path", defaults.world.layout_path)?
        .set_default("debug.log_level", defaults.debug.log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let config: AppConfig = builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.atmospherics.diffusion_rate, 0.2);
        assert_eq!(config.atmospherics.move_threshold, 1000.0);
        assert_eq!(config.atmospherics.tick_hz, 20.0);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_toml_overrides_single_field() {
        let config: AppConfig = builder()
            .unwrap()
            .add_source(File::from_str(
                "[atmospherics]\nmove_threshold = 2500.0\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.atmospherics.move_threshold, 2500.0);
        assert_eq!(config.atmospherics.diffusion_rate, 0.2);
        assert_eq!(config.world.layout_path, "assets/station.ron");
    }

    #[test]
    fn test_settings_carry_config_values() {
        let mut config = AppConfig::default();
        config.atmospherics.diffusion_rate = 0.1;
        let settings = config.atmospherics.settings();
        assert_eq!(settings.diffusion_rate, 0.1);
        assert_eq!(settings.move_threshold, 1000.0);
    }
}
