use std::fs;

use atmospherics::{GasBumped, GasPushed, process_atmosphere};
use bevy::prelude::*;
use tiles::{Occupant, Passable, Tilemap};

/// Loads the station layout and drops a few things into it.
pub struct WorldSetupPlugin {
    pub layout_path: String,
}

#[derive(Resource)]
struct LayoutPath(String);

impl Plugin for WorldSetupPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(LayoutPath(self.layout_path.clone()));
        app.add_systems(Startup, setup_world);
        app.add_systems(
            FixedUpdate,
            (log_gas_bumps, log_gas_pushes).after(process_atmosphere),
        );
    }
}

/// Reads a RON station layout from `path`, falling back to the built-in
/// test station when the file is missing or malformed.
pub fn load_station(path: &str) -> Tilemap {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            warn!("Could not read station layout {path}: {error}; using the test station");
            return Tilemap::test_station();
        }
    };

    match Tilemap::from_ron(&source) {
        Ok(tilemap) => {
            info!(
                "Loaded station layout {path} ({}x{})",
                tilemap.width(),
                tilemap.height()
            );
            tilemap
        }
        Err(error) => {
            warn!("Invalid station layout {path}: {error}; using the test station");
            Tilemap::test_station()
        }
    }
}

/// Things placed at startup: name, tile, passability class.
const STARTING_THINGS: [(&str, IVec2, Passable); 3] = [
    ("crate", IVec2::new(12, 4), Passable::BigItem),
    ("crewmember", IVec2::new(13, 4), Passable::BigCreature),
    ("ghost", IVec2::new(13, 4), Passable::Empty),
];

fn setup_world(mut commands: Commands, layout_path: Res<LayoutPath>) {
    let mut tilemap = load_station(&layout_path.0);

    for (name, pos, passable) in STARTING_THINGS {
        if !tilemap.is_walkable(pos) {
            warn!("Skipping {name}: {pos} is not walkable on this station");
            continue;
        }
        let entity = commands.spawn(Name::new(name)).id();
        tilemap.add_occupant(pos, Occupant { entity, passable });
    }

    commands.insert_resource(tilemap);
}

fn log_gas_bumps(mut bumps: MessageReader<GasBumped>) {
    let count = bumps.read().count();
    if count > 0 {
        debug!("Gas pressure hit {count} barriers this tick");
    }
}

fn log_gas_pushes(mut pushes: MessageReader<GasPushed>, names: Query<&Name>) {
    for push in pushes.read() {
        let name = names
            .get(push.entity)
            .map(|name| name.as_str().to_owned())
            .unwrap_or_else(|_| format!("{}", push.entity));
        info!(
            "Gas pushed {name} at {} towards {}",
            push.position, push.force
        );
    }
}
