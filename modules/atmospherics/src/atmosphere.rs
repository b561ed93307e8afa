use std::time::Instant;

use bevy::prelude::*;
use tiles::{Dir, GASES_NUM, Passable};

use crate::AtmosSettings;
use crate::grid::AtmosGrid;
use crate::map::{AtmosMap, GasHolder};
use crate::timing::{Phase, PhaseTimings};

/// Sides queried during load, with `Dir::All` standing for the whole tile.
const LOAD_SIDES: [Dir; 5] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right, Dir::All];

/// The atmosphere engine: owns the working grid and runs the per-tick
/// load, diffuse, unload and movement passes against an [`AtmosMap`].
#[derive(Debug, Resource)]
pub struct Atmosphere {
    grid: Option<AtmosGrid>,
    size: UVec3,
    diffusion_rate: f32,
    move_threshold: f32,
    timings: PhaseTimings,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self::new(&AtmosSettings::default())
    }
}

impl Atmosphere {
    pub fn new(settings: &AtmosSettings) -> Self {
        Self {
            grid: None,
            size: UVec3::ZERO,
            diffusion_rate: settings.diffusion_rate,
            move_threshold: settings.move_threshold,
            timings: PhaseTimings::default(),
        }
    }

    /// World size the grid was last allocated for.
    pub fn size(&self) -> UVec3 {
        self.size
    }

    pub fn grid(&self) -> Option<&AtmosGrid> {
        self.grid.as_ref()
    }

    pub fn timings(&self) -> &PhaseTimings {
        &self.timings
    }

    /// Throws away the current grid and allocates a fresh one.
    /// Only the base layer is simulated; `depth` is recorded as given.
    pub fn resize(&mut self, width: u32, height: u32, depth: u32) {
        info!("Atmosphere resized to {width}x{height}x{depth}");
        self.size = UVec3::new(width, height, depth);
        self.grid = Some(AtmosGrid::new(width, height, self.diffusion_rate));
        self.timings.reset();
    }

    /// Picks up new tunables. The grid keeps its contents.
    pub fn apply_settings(&mut self, settings: &AtmosSettings) {
        self.diffusion_rate = settings.diffusion_rate;
        self.move_threshold = settings.move_threshold;
        if let Some(grid) = self.grid.as_mut() {
            grid.set_diffusion_rate(settings.diffusion_rate);
        }
    }

    /// Runs one full tick: load, diffuse, unload, then pressure movement.
    ///
    /// Panics if [`Atmosphere::resize`] has not been called yet or the map
    /// size differs from the grid size.
    pub fn process<M: AtmosMap>(&mut self, map: &mut M) {
        let timer = Instant::now();
        self.load(map);
        self.timings.record(Phase::Load, timer.elapsed());

        let timer = Instant::now();
        self.grid_mut().process();
        self.timings.record(Phase::GridProcessing, timer.elapsed());

        let timer = Instant::now();
        self.unload(map);
        self.timings.record(Phase::Unload, timer.elapsed());

        let timer = Instant::now();
        self.process_move(map);
        self.timings.record(Phase::Movement, timer.elapsed());
    }

    fn grid_mut(&mut self) -> &mut AtmosGrid {
        self.grid
            .as_mut()
            .expect("atmosphere processed before resize")
    }

    /// The grid, checked against the map it is about to be used with.
    fn grid_for<M: AtmosMap>(&mut self, map: &M) -> &mut AtmosGrid {
        let dims = map.dimensions();
        let grid = self.grid_mut();
        assert_eq!(
            (dims.x, dims.y),
            (grid.width(), grid.height()),
            "map size does not match the atmos grid; resize before processing"
        );
        grid
    }

    /// Snapshots passability, space state and holder contents into the grid.
    pub fn load<M: AtmosMap>(&mut self, map: &M) {
        let dims = map.dimensions();
        let grid = self.grid_for(map);
        for y in 0..dims.y {
            for x in 0..dims.x {
                let pos = UVec2::new(x, y);
                let cell = grid.at(x, y);
                cell.reset_passable();

                for dir in LOAD_SIDES {
                    if !map.passability(pos, dir).allows(Passable::Air) {
                        cell.set_unpassable(dir);
                    }
                }
                if map.is_space(pos) {
                    cell.set_space();
                }

                let holder = map.holder(pos);
                cell.energy = holder.energy();
                for (i, gas) in cell.gases.iter_mut().enumerate() {
                    *gas = holder.gas(i);
                }
            }
        }
    }

    /// Writes the grid back into the holders and derives cell pressure.
    /// Space tiles are emptied and read as zero pressure.
    pub fn unload<M: AtmosMap>(&mut self, map: &mut M) {
        let dims = map.dimensions();
        let grid = self.grid_for(map);
        for y in 0..dims.y {
            for x in 0..dims.x {
                let pos = UVec2::new(x, y);
                let cell = grid.at(x, y);
                let holder = map.holder_mut(pos);
                holder.truncate();
                if cell.is_space() {
                    cell.pressure = 0.0;
                    continue;
                }

                for i in 0..GASES_NUM {
                    holder.add_gas(i, cell.gases[i]);
                }
                holder.add_energy(cell.energy);
                cell.pressure = holder.pressure();
            }
        }
    }

    /// Lets pressure differences act on the world: bumps barriers or pushes
    /// one occupant per cell.
    pub fn process_move<M: AtmosMap>(&mut self, map: &mut M) {
        let threshold = self.move_threshold;
        let dims = map.dimensions();
        let grid = self.grid_for(map);
        for x in 0..dims.x {
            for y in 0..dims.y {
                process_tile_move(grid, map, UVec2::new(x, y), threshold);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn grid_for_test(&mut self) -> &mut AtmosGrid {
        self.grid_mut()
    }
}

fn process_tile_move<M: AtmosMap>(grid: &AtmosGrid, map: &mut M, pos: UVec2, threshold: f32) {
    let cell = grid.get(pos.x, pos.y);
    if cell.is_space() {
        return;
    }

    let mut max_diff = 0.0;
    let mut target = None;
    for dir in Dir::CARDINALS {
        let Some(next) = map.neighbour(pos, dir) else {
            continue;
        };
        let diff = cell.pressure - grid.get(next.x, next.y).pressure;
        // Strict comparison: on a tie the earlier direction wins.
        if diff > max_diff {
            max_diff = diff;
            target = Some((dir, next));
        }
    }

    let Some((dir, next)) = target else {
        return;
    };
    if max_diff <= threshold {
        return;
    }

    if !cell.can_pass(dir) {
        map.bump_by_gas(pos, dir, true);
        return;
    }

    let neighbour = grid.get(next.x, next.y);
    if !neighbour.can_pass(Dir::All) || !neighbour.can_pass(dir.reverse()) {
        map.bump_by_gas(next, dir, false);
        return;
    }

    let pushed = map
        .occupants(pos)
        .iter()
        .rposition(|occupant| occupant.passable != Passable::Empty);
    if let Some(index) = pushed {
        map.apply_force(pos, index, dir.offset());
    }
}
