use bevy::prelude::*;
use tiles::{Dir, GASES_NUM};

use crate::cell::Cell;

/// Gas slots plus one trailing slot for energy.
const QUANTITIES: usize = GASES_NUM + 1;
const ENERGY_SLOT: usize = GASES_NUM;

/// Dense row-major array of [`Cell`]s for one simulation layer.
///
/// Neighbours are found by index arithmetic; there are no links between cells.
#[derive(Debug, Clone)]
pub struct AtmosGrid {
    width: u32,
    height: u32,
    diffusion_rate: f32,
    cells: Vec<Cell>,
    // Reused across passes to avoid per-tick allocations
    scratch_delta: Vec<[f32; QUANTITIES]>,
}

impl AtmosGrid {
    /// Creates a grid of default cells. `diffusion_rate` is the fraction of
    /// a difference that crosses one open edge per pass.
    pub fn new(width: u32, height: u32, diffusion_rate: f32) -> Self {
        let size = (width * height) as usize;
        Self {
            width,
            height,
            diffusion_rate,
            cells: vec![Cell::default(); size],
            scratch_delta: vec![[0.0; QUANTITIES]; size],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_diffusion_rate(&mut self, rate: f32) {
        self.diffusion_rate = rate;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "atmos grid access ({x}, {y}) outside {}x{}",
            self.width,
            self.height
        );
        (y * self.width + x) as usize
    }

    /// Mutable cell at `(x, y)`. Panics when out of bounds.
    pub fn at(&mut self, x: u32, y: u32) -> &mut Cell {
        let idx = self.index(x, y);
        &mut self.cells[idx]
    }

    /// Cell at `(x, y)`. Panics when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    /// Position one step from `pos` towards `dir`, or `None` past the edge.
    pub fn neighbour(&self, pos: UVec2, dir: Dir) -> Option<UVec2> {
        let next = pos.as_ivec2() + dir.offset();
        if next.x < 0 || next.y < 0 || next.x >= self.width as i32 || next.y >= self.height as i32
        {
            return None;
        }
        Some(next.as_uvec2())
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Sum of one gas over every non-space cell.
    pub fn total_gas(&self, index: usize) -> f32 {
        self.cells
            .iter()
            .filter(|cell| !cell.is_space())
            .map(|cell| cell.gases[index])
            .sum()
    }

    /// Sum of energy over every non-space cell.
    pub fn total_energy(&self) -> f32 {
        self.cells
            .iter()
            .filter(|cell| !cell.is_space())
            .map(|cell| cell.energy)
            .sum()
    }

    /// Runs one equalization pass.
    ///
    /// Every pair of adjacent cells whose shared edge is open on both sides
    /// trades `(a - b) * diffusion_rate` of each gas and of energy. Flows are
    /// computed from the state at the start of the pass and applied together,
    /// so the outcome does not depend on visiting order and totals are kept.
    /// Space and sealed cells trade nothing.
    pub fn process(&mut self) {
        let width = self.width as usize;
        let height = self.height as usize;
        let rate = self.diffusion_rate;
        let Self {
            cells,
            scratch_delta,
            ..
        } = self;

        for delta in scratch_delta.iter_mut() {
            *delta = [0.0; QUANTITIES];
        }

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if x + 1 < width {
                    exchange(cells, scratch_delta, rate, idx, idx + 1, Dir::Right);
                }
                if y + 1 < height {
                    exchange(cells, scratch_delta, rate, idx, idx + width, Dir::Down);
                }
            }
        }

        for (cell, delta) in cells.iter_mut().zip(scratch_delta.iter()) {
            for (gas, change) in cell.gases.iter_mut().zip(delta.iter()) {
                *gas = (*gas + change).max(0.0);
            }
            cell.energy = (cell.energy + delta[ENERGY_SLOT]).max(0.0);
        }
    }
}

/// Accumulates the flow between `from` and its neighbour `to`, which lies
/// towards `dir`.
fn exchange(
    cells: &[Cell],
    deltas: &mut [[f32; QUANTITIES]],
    rate: f32,
    from: usize,
    to: usize,
    dir: Dir,
) {
    let a = &cells[from];
    let b = &cells[to];
    if !a.exchanges_through(dir) || !b.exchanges_through(dir.reverse()) {
        return;
    }

    for slot in 0..GASES_NUM {
        let flow = (a.gases[slot] - b.gases[slot]) * rate;
        deltas[from][slot] -= flow;
        deltas[to][slot] += flow;
    }
    let flow = (a.energy - b.energy) * rate;
    deltas[from][ENERGY_SLOT] -= flow;
    deltas[to][ENERGY_SLOT] += flow;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_DIFFUSION_RATE;

    fn grid_with_gas(width: u32, height: u32, fills: &[((u32, u32), f32)]) -> AtmosGrid {
        let mut grid = AtmosGrid::new(width, height, DEFAULT_DIFFUSION_RATE);
        for &((x, y), moles) in fills {
            let cell = grid.at(x, y);
            cell.gases[0] = moles;
            cell.energy = moles * 100.0;
        }
        grid
    }

    #[test]
    fn test_grid_creation() {
        let grid = AtmosGrid::new(5, 4, DEFAULT_DIFFUSION_RATE);
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.cells().len(), 20);
    }

    #[test]
    fn test_at_addresses_row_major() {
        let mut grid = AtmosGrid::new(3, 2, DEFAULT_DIFFUSION_RATE);
        grid.at(2, 1).energy = 7.0;
        assert_eq!(grid.cells()[5].energy, 7.0);
        assert_eq!(grid.get(2, 1).energy, 7.0);
    }

    #[test]
    #[should_panic(expected = "outside 3x2")]
    fn test_at_out_of_bounds_panics() {
        let mut grid = AtmosGrid::new(3, 2, DEFAULT_DIFFUSION_RATE);
        grid.at(3, 0);
    }

    #[test]
    fn test_neighbour_stops_at_edges() {
        let grid = AtmosGrid::new(2, 2, DEFAULT_DIFFUSION_RATE);
        assert_eq!(
            grid.neighbour(UVec2::new(0, 0), Dir::Right),
            Some(UVec2::new(1, 0))
        );
        assert_eq!(
            grid.neighbour(UVec2::new(0, 0), Dir::Down),
            Some(UVec2::new(0, 1))
        );
        assert_eq!(grid.neighbour(UVec2::new(0, 0), Dir::Left), None);
        assert_eq!(grid.neighbour(UVec2::new(1, 1), Dir::Down), None);
    }

    #[test]
    fn test_process_moves_gas_down_the_gradient() {
        let mut grid = grid_with_gas(2, 1, &[((0, 0), 10.0)]);
        grid.process();

        let left = grid.get(0, 0).gases[0];
        let right = grid.get(1, 0).gases[0];
        assert!((left - 8.0).abs() < 1e-5, "left should lose 20%, got {}", left);
        assert!((right - 2.0).abs() < 1e-5, "right should gain 20%, got {}", right);
        assert!((grid.get(1, 0).energy - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_process_conserves_totals() {
        let mut grid = grid_with_gas(
            4,
            3,
            &[((0, 0), 50.0), ((3, 2), 5.0), ((1, 1), 12.5), ((2, 0), 0.25)],
        );
        grid.at(2, 1).set_unpassable(Dir::Left);
        grid.at(1, 2).set_unpassable(Dir::All);

        let gas_before = grid.total_gas(0);
        let energy_before = grid.total_energy();
        for _ in 0..50 {
            grid.process();
        }

        assert!(
            (grid.total_gas(0) - gas_before).abs() < 1e-3,
            "gas should be conserved; before={}, after={}",
            gas_before,
            grid.total_gas(0)
        );
        assert!((grid.total_energy() - energy_before).abs() / energy_before < 1e-4);
        for cell in grid.cells() {
            assert!(cell.gases[0] >= 0.0);
            assert!(cell.gases[0].is_finite());
        }
    }

    #[test]
    fn test_space_cells_take_no_part() {
        let mut grid = grid_with_gas(3, 1, &[((0, 0), 10.0), ((1, 0), 10.0)]);
        grid.at(2, 0).set_space();
        grid.at(2, 0).gases[0] = 99.0;

        grid.process();

        assert_eq!(grid.get(1, 0).gases[0], 10.0, "nothing flows into space");
        assert_eq!(grid.get(2, 0).gases[0], 99.0, "space cells are left alone");
    }

    #[test]
    fn test_one_sided_block_stops_flow() {
        let mut grid = grid_with_gas(2, 1, &[((0, 0), 10.0)]);
        grid.at(1, 0).set_unpassable(Dir::Left);
        grid.process();
        assert_eq!(grid.get(0, 0).gases[0], 10.0);
        assert_eq!(grid.get(1, 0).gases[0], 0.0);

        let mut grid = grid_with_gas(2, 1, &[((0, 0), 10.0)]);
        grid.at(0, 0).set_unpassable(Dir::Right);
        grid.process();
        assert_eq!(grid.get(1, 0).gases[0], 0.0);
    }

    #[test]
    fn test_vertical_exchange() {
        let mut grid = grid_with_gas(1, 3, &[((0, 1), 9.0)]);
        grid.process();
        assert!((grid.get(0, 0).gases[0] - 1.8).abs() < 1e-5);
        assert!((grid.get(0, 2).gases[0] - 1.8).abs() < 1e-5);
        assert!((grid.get(0, 1).gases[0] - 5.4).abs() < 1e-5);
    }

    #[test]
    fn test_process_is_deterministic() {
        let fills = [((0, 0), 30.0), ((2, 2), 7.0), ((1, 0), 3.0)];
        let mut a = grid_with_gas(3, 3, &fills);
        let mut b = grid_with_gas(3, 3, &fills);
        for _ in 0..10 {
            a.process();
            b.process();
        }
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn test_repeated_passes_converge() {
        let mut grid = grid_with_gas(6, 6, &[((0, 0), 360.0)]);
        for _ in 0..400 {
            grid.process();
        }
        let (min, max) = grid
            .cells()
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), c| {
                (lo.min(c.gases[0]), hi.max(c.gases[0]))
            });
        assert!(max - min < 0.01, "expected near-uniform gas, spread {}", max - min);
    }
}
