use bevy::prelude::*;
use tiles::{Dir, Tilemap};

mod atmosphere;
mod cell;
mod grid;
mod map;
mod perf;
mod timing;

pub use atmosphere::Atmosphere;
pub use cell::{Cell, CellFlags};
pub use grid::AtmosGrid;
pub use map::{AtmosMap, GasEffect, GasHolder, TilemapAtmos};
pub use perf::{AtmosPerfText, PerfRefreshTimer};
pub use timing::{Phase, PhaseTimings};

/// Fraction of a gas difference that crosses one open edge per pass.
pub const DEFAULT_DIFFUSION_RATE: f32 = 0.2;

/// Largest per-edge fraction that still keeps a cell from giving away more
/// than it holds to its four neighbours.
pub const MAX_DIFFUSION_RATE: f32 = 0.25;

/// Pressure difference in pascal a tile must exceed before gas
/// starts pushing things around.
pub const DEFAULT_MOVE_THRESHOLD: f32 = 1000.0;

pub const DEFAULT_PERF_REFRESH_SECS: f32 = 1.0;

/// Tunables for the atmosphere engine.
#[derive(Debug, Clone, Copy, PartialEq, Resource, Reflect)]
#[reflect(Debug, Resource)]
pub struct AtmosSettings {
    pub diffusion_rate: f32,
    pub move_threshold: f32,
    pub perf_refresh_secs: f32,
}

impl Default for AtmosSettings {
    fn default() -> Self {
        Self {
            diffusion_rate: DEFAULT_DIFFUSION_RATE,
            move_threshold: DEFAULT_MOVE_THRESHOLD,
            perf_refresh_secs: DEFAULT_PERF_REFRESH_SECS,
        }
    }
}

impl AtmosSettings {
    /// Replaces out-of-range values with their defaults, warning about each.
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        let mut settings = self;

        if !(settings.diffusion_rate > 0.0 && settings.diffusion_rate <= MAX_DIFFUSION_RATE) {
            warn!(
                "Diffusion rate {} outside (0, {MAX_DIFFUSION_RATE}], using {}",
                settings.diffusion_rate, defaults.diffusion_rate
            );
            settings.diffusion_rate = defaults.diffusion_rate;
        }
        if !(settings.move_threshold.is_finite() && settings.move_threshold >= 0.0) {
            warn!(
                "Move threshold {} is invalid, using {}",
                settings.move_threshold, defaults.move_threshold
            );
            settings.move_threshold = defaults.move_threshold;
        }
        if !(settings.perf_refresh_secs.is_finite() && settings.perf_refresh_secs > 0.0) {
            warn!(
                "Perf refresh interval {}s is invalid, using {}s",
                settings.perf_refresh_secs, defaults.perf_refresh_secs
            );
            settings.perf_refresh_secs = defaults.perf_refresh_secs;
        }
        settings
    }
}

/// Gas pressure slammed into a barrier at `position`.
///
/// `inside` is set when the barrier belongs to the high-pressure tile itself
/// (e.g. a closed windoor facing out), as opposed to the neighbour it faces.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasBumped {
    pub position: UVec2,
    pub dir: Dir,
    pub inside: bool,
}

/// Gas pressure shoved `entity` along `force`.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPushed {
    pub position: UVec2,
    pub entity: Entity,
    pub force: IVec2,
}

/// Simulates the station atmosphere on the fixed timestep.
///
/// Runs against the [`Tilemap`] resource whenever it exists, reallocating the
/// grid when the map changes size, and reports gas effects as [`GasBumped`]
/// and [`GasPushed`] messages.
#[derive(Default)]
pub struct AtmosphericsPlugin {
    settings: AtmosSettings,
}

impl AtmosphericsPlugin {
    pub fn with_settings(settings: AtmosSettings) -> Self {
        Self {
            settings: settings.validated(),
        }
    }
}

impl Plugin for AtmosphericsPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<AtmosSettings>();
        app.insert_resource(self.settings);
        app.insert_resource(Atmosphere::new(&self.settings));
        app.insert_resource(PerfRefreshTimer::from_seconds(
            self.settings.perf_refresh_secs,
        ));
        app.init_resource::<AtmosPerfText>();
        app.add_message::<GasBumped>();
        app.add_message::<GasPushed>();
        app.add_systems(FixedUpdate, process_atmosphere);
        app.add_systems(Update, perf::refresh_perf_text);
    }
}

/// Runs one atmosphere tick over the tilemap and forwards its effects.
pub fn process_atmosphere(
    tilemap: Option<ResMut<Tilemap>>,
    settings: Res<AtmosSettings>,
    mut atmosphere: ResMut<Atmosphere>,
    mut effects: Local<Vec<GasEffect>>,
    mut bumped: MessageWriter<GasBumped>,
    mut pushed: MessageWriter<GasPushed>,
) {
    let Some(mut tilemap) = tilemap else { return };

    if settings.is_changed() {
        atmosphere.apply_settings(&settings.validated());
    }

    let dims = UVec3::new(tilemap.width(), tilemap.height(), tilemap.depth());
    if atmosphere.grid().is_none() || atmosphere.size() != dims {
        atmosphere.resize(dims.x, dims.y, dims.z);
    }

    effects.clear();
    atmosphere.process(&mut TilemapAtmos::new(&mut tilemap, &mut effects));

    for effect in effects.drain(..) {
        match effect {
            GasEffect::Bumped {
                position,
                dir,
                inside,
            } => {
                bumped.write(GasBumped {
                    position,
                    dir,
                    inside,
                });
            }
            GasEffect::Pushed {
                position,
                entity,
                force,
            } => {
                pushed.write(GasPushed {
                    position,
                    entity,
                    force,
                });
            }
        }
    }
}
