use atmospherics::AtmosphericsPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use tiles::TilesPlugin;

mod config;
mod world_setup;

fn parse_log_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() {
    let app_config = config::load_config();
    let log_level = parse_log_level(&app_config.debug.log_level);

    let mut app = App::new();
    app.insert_resource(app_config.clone());

    // Headless: the station only needs a fixed-rate tick and logging.
    app.add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin {
            level: log_level,
            ..default()
        })
        .insert_resource(Time::<Fixed>::from_hz(app_config.atmospherics.tick_hz))
        .add_plugins(TilesPlugin)
        .add_plugins(AtmosphericsPlugin::with_settings(
            app_config.atmospherics.settings(),
        ))
        .add_plugins(world_setup::WorldSetupPlugin {
            layout_path: app_config.world.layout_path.clone(),
        });

    info!(
        "Atmosphere ticking at {} Hz",
        app_config.atmospherics.tick_hz
    );
    app.run();
}
