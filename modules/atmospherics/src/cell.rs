use bitflags::bitflags;
use tiles::{Dir, GASES_NUM};

bitflags! {
    /// Per-cell flags. The direction bits mark sides that gas cannot cross;
    /// `CENTER` seals the whole cell; `SPACE` marks vacuum.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const CENTER = 1 << 4;
        const SPACE = 1 << 5;
    }
}

impl CellFlags {
    /// Blocking bit for a direction. `Dir::All` maps to `CENTER`.
    pub fn blocking(dir: Dir) -> CellFlags {
        match dir {
            Dir::Up => CellFlags::UP,
            Dir::Down => CellFlags::DOWN,
            Dir::Left => CellFlags::LEFT,
            Dir::Right => CellFlags::RIGHT,
            Dir::All => CellFlags::CENTER,
        }
    }
}

/// Transient simulation state of one grid position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    pub gases: [f32; GASES_NUM],
    pub energy: f32,
    /// Derived during unload; read by the movement pass.
    pub pressure: f32,
    pub flags: CellFlags,
}

impl Cell {
    /// Clears every blocking bit and the space bit.
    pub fn reset_passable(&mut self) {
        self.flags.remove(CellFlags::all());
    }

    pub fn set_unpassable(&mut self, dir: Dir) {
        self.flags.insert(CellFlags::blocking(dir));
    }

    pub fn set_space(&mut self) {
        self.flags.insert(CellFlags::SPACE);
    }

    pub fn is_space(&self) -> bool {
        self.flags.contains(CellFlags::SPACE)
    }

    /// Whether air may cross this cell's `dir` side (or the cell as a whole
    /// for `Dir::All`).
    pub fn can_pass(&self, dir: Dir) -> bool {
        !self.flags.contains(CellFlags::blocking(dir))
    }

    /// Whether this cell trades gas through its `dir` side during diffusion.
    pub(crate) fn exchanges_through(&self, dir: Dir) -> bool {
        !self.is_space() && self.can_pass(Dir::All) && self.can_pass(dir)
    }
}
