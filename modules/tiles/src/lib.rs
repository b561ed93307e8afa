use bevy::prelude::*;
use serde::{Deserialize, Serialize};

mod holder;
mod layout;

pub use holder::{
    AtmosHolder, GAS_CONSTANT, GASES_NUM, Gas, STANDARD_TEMPERATURE, TILE_VOLUME,
};
pub use layout::{LayoutError, TileLayout, WindoorSpec};

/// Direction on the tile grid. The four cardinals are indexed 0..4 in the
/// order below; `All` is the pseudo-direction for "the tile as a whole".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[reflect(Debug, PartialEq)]
pub enum Dir {
    Left,
    Right,
    Up,
    Down,
    All,
}

impl Dir {
    pub const CARDINALS: [Dir; 4] = [Dir::Left, Dir::Right, Dir::Up, Dir::Down];

    pub fn reverse(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::All => Dir::All,
        }
    }

    /// Unit step for this direction. Up is towards row 0.
    pub fn offset(self) -> IVec2 {
        match self {
            Dir::Left => IVec2::new(-1, 0),
            Dir::Right => IVec2::new(1, 0),
            Dir::Up => IVec2::new(0, -1),
            Dir::Down => IVec2::new(0, 1),
            Dir::All => IVec2::ZERO,
        }
    }
}

/// How much a tile side lets through, from nothing to everything.
/// Levels are ordered: something passable at a level is passable at every
/// lower level too.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect, Serialize, Deserialize,
)]
#[reflect(Debug, PartialEq)]
pub enum Passable {
    Empty,
    Air,
    BigCreature,
    SmallCreature,
    BigItem,
    SmallItem,
    Full,
}

impl Passable {
    pub fn allows(self, level: Passable) -> bool {
        self >= level
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Debug, PartialEq)]
pub enum TileKind {
    Floor,
    Wall,
    Space,
}

impl TileKind {
    pub fn is_walkable(&self) -> bool {
        match self {
            TileKind::Floor | TileKind::Space => true,
            TileKind::Wall => false,
        }
    }
}

/// Structures standing on a tile that change how gas gets through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Debug, PartialEq)]
pub enum Structure {
    /// Airlock: seals the whole tile while closed.
    Door { open: bool },
    /// Glass door mounted on one side of the tile: seals that side only.
    Windoor { facing: Dir, open: bool },
}

/// Something sitting on a tile that can be pushed around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Debug, PartialEq)]
pub struct Occupant {
    pub entity: Entity,
    /// Passability class of the occupant; `Passable::Empty` marks things
    /// that take no physical space and never get pushed.
    pub passable: Passable,
}

#[derive(Debug, Clone, PartialEq, Reflect)]
#[reflect(Debug, PartialEq)]
pub struct Tile {
    pub kind: TileKind,
    pub structure: Option<Structure>,
    pub holder: AtmosHolder,
    /// Oldest first; the last entry is the most recently added.
    pub occupants: Vec<Occupant>,
}

impl Tile {
    fn new(kind: TileKind) -> Self {
        Self {
            kind,
            structure: None,
            holder: AtmosHolder::default(),
            occupants: Vec::new(),
        }
    }

    /// Passability of one side of the tile, or of the whole tile for `Dir::All`.
    pub fn passability(&self, dir: Dir) -> Passable {
        if self.kind == TileKind::Wall {
            return Passable::Empty;
        }
        match self.structure {
            Some(Structure::Door { open: false }) => Passable::Empty,
            Some(Structure::Windoor {
                facing,
                open: false,
            }) if facing == dir => Passable::Empty,
            _ => Passable::Full,
        }
    }
}

#[derive(Debug, Clone, Resource, Reflect)]
#[reflect(Debug, Resource)]
pub struct Tilemap {
    width: u32,
    height: u32,
    depth: u32,
    tiles: Vec<Tile>,
}

impl Tilemap {
    pub fn new(width: u32, height: u32, fill: TileKind) -> Self {
        let size = (width * height) as usize;
        Self {
            width,
            height,
            depth: 1,
            tiles: vec![Tile::new(fill); size],
        }
    }

    /// Records extra z-levels. Only the base layer carries tiles.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth.max(1);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    fn coord_to_index(&self, pos: IVec2) -> Option<usize> {
        if pos.x >= 0 && pos.x < self.width as i32 && pos.y >= 0 && pos.y < self.height as i32 {
            Some((pos.y * self.width as i32 + pos.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, pos: IVec2) -> Option<TileKind> {
        self.tile(pos).map(|tile| tile.kind)
    }

    pub fn set(&mut self, pos: IVec2, kind: TileKind) -> bool {
        if let Some(tile) = self.tile_mut(pos) {
            tile.kind = kind;
            true
        } else {
            false
        }
    }

    pub fn tile(&self, pos: IVec2) -> Option<&Tile> {
        self.coord_to_index(pos).map(|idx| &self.tiles[idx])
    }

    pub fn tile_mut(&mut self, pos: IVec2) -> Option<&mut Tile> {
        self.coord_to_index(pos).map(|idx| &mut self.tiles[idx])
    }

    pub fn is_walkable(&self, pos: IVec2) -> bool {
        self.get(pos).is_some_and(|kind| kind.is_walkable())
    }

    pub fn is_space(&self, pos: IVec2) -> bool {
        self.get(pos) == Some(TileKind::Space)
    }

    pub fn set_structure(&mut self, pos: IVec2, structure: Option<Structure>) -> bool {
        if let Some(tile) = self.tile_mut(pos) {
            tile.structure = structure;
            true
        } else {
            false
        }
    }

    /// Opens or closes the door or windoor at `pos`.
    /// Returns false if there is nothing to open there.
    pub fn set_door_open(&mut self, pos: IVec2, open: bool) -> bool {
        let Some(tile) = self.tile_mut(pos) else {
            return false;
        };
        match &mut tile.structure {
            Some(Structure::Door { open: state }) | Some(Structure::Windoor { open: state, .. }) => {
                *state = open;
                true
            }
            None => false,
        }
    }

    /// Passability of a tile side. Out-of-bounds positions pass nothing.
    pub fn passability(&self, pos: IVec2, dir: Dir) -> Passable {
        self.tile(pos)
            .map_or(Passable::Empty, |tile| tile.passability(dir))
    }

    pub fn neighbour(&self, pos: IVec2, dir: Dir) -> Option<IVec2> {
        let next = pos + dir.offset();
        self.coord_to_index(next).map(|_| next)
    }

    pub fn holder(&self, pos: IVec2) -> Option<&AtmosHolder> {
        self.tile(pos).map(|tile| &tile.holder)
    }

    pub fn holder_mut(&mut self, pos: IVec2) -> Option<&mut AtmosHolder> {
        self.tile_mut(pos).map(|tile| &mut tile.holder)
    }

    pub fn occupants(&self, pos: IVec2) -> &[Occupant] {
        self.tile(pos).map_or(&[], |tile| tile.occupants.as_slice())
    }

    pub fn add_occupant(&mut self, pos: IVec2, occupant: Occupant) -> bool {
        if let Some(tile) = self.tile_mut(pos) {
            tile.occupants.push(occupant);
            true
        } else {
            false
        }
    }

    /// Seeds every floor tile with a standard atmosphere and empties the rest.
    pub fn fill_standard_atmosphere(&mut self) {
        for tile in &mut self.tiles {
            tile.holder = match tile.kind {
                TileKind::Floor => AtmosHolder::standard(),
                TileKind::Wall | TileKind::Space => AtmosHolder::default(),
            };
        }
    }

    /// Total moles of one gas across every tile.
    pub fn total_gas(&self, gas: Gas) -> f32 {
        self.tiles
            .iter()
            .map(|tile| tile.holder.gas(gas.index()))
            .sum()
    }

    /// Two rooms joined by a closed door, the right room breached to space.
    ///
    /// ```text
    /// ################
    /// #......#.......#
    /// #......#.......#
    /// #......D.......#
    /// #......#.......~
    /// #......#.......~
    /// ################
    /// ```
    pub fn test_station() -> Self {
        let (width, height) = (16, 7);
        let mut tilemap = Tilemap::new(width, height, TileKind::Floor);
        for x in 0..width as i32 {
            tilemap.set(IVec2::new(x, 0), TileKind::Wall);
            tilemap.set(IVec2::new(x, height as i32 - 1), TileKind::Wall);
        }
        for y in 0..height as i32 {
            tilemap.set(IVec2::new(0, y), TileKind::Wall);
            tilemap.set(IVec2::new(7, y), TileKind::Wall);
            tilemap.set(IVec2::new(width as i32 - 1, y), TileKind::Wall);
        }
        tilemap.set(IVec2::new(7, 3), TileKind::Floor);
        tilemap.set_structure(IVec2::new(7, 3), Some(Structure::Door { open: false }));
        tilemap.set(IVec2::new(15, 4), TileKind::Space);
        tilemap.set(IVec2::new(15, 5), TileKind::Space);
        tilemap.fill_standard_atmosphere();
        tilemap
    }
}

pub struct TilesPlugin;

impl Plugin for TilesPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Dir>();
        app.register_type::<Passable>();
        app.register_type::<TileKind>();
        app.register_type::<Structure>();
        app.register_type::<Tilemap>();
    }
}
