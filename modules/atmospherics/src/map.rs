use bevy::prelude::*;
use tiles::{AtmosHolder, Dir, Occupant, Passable, Tilemap};

/// Persistent per-tile gas store owned by the world.
pub trait GasHolder {
    fn gas(&self, index: usize) -> f32;
    fn add_gas(&mut self, index: usize, amount: f32);
    fn energy(&self) -> f32;
    fn add_energy(&mut self, amount: f32);
    fn pressure(&self) -> f32;
    /// Drops whatever the holder still stores.
    fn truncate(&mut self);
}

/// The world as seen by the atmosphere: topology, holders, occupants, and
/// the entry points through which gas pressure acts on it.
///
/// Positions are base-layer `(x, y)` coordinates. The atmosphere only
/// queries positions inside [`AtmosMap::dimensions`].
pub trait AtmosMap {
    type Holder: GasHolder;

    /// Width, height and depth of the world.
    fn dimensions(&self) -> UVec3;

    /// How much gets through one side of a tile (`Dir::All` for the tile as
    /// a whole).
    fn passability(&self, pos: UVec2, dir: Dir) -> Passable;

    fn is_space(&self, pos: UVec2) -> bool;

    /// Tile one step from `pos` towards `dir`, or `None` past the map edge.
    fn neighbour(&self, pos: UVec2, dir: Dir) -> Option<UVec2> {
        let dims = self.dimensions().truncate().as_ivec2();
        let next = pos.as_ivec2() + dir.offset();
        (next.cmpge(IVec2::ZERO).all() && next.cmplt(dims).all()).then(|| next.as_uvec2())
    }

    fn holder(&self, pos: UVec2) -> &Self::Holder;

    fn holder_mut(&mut self, pos: UVec2) -> &mut Self::Holder;

    /// Oldest first.
    fn occupants(&self, pos: UVec2) -> &[Occupant];

    /// Pushes the occupant at `index` of `occupants(pos)`.
    fn apply_force(&mut self, pos: UVec2, index: usize, force: IVec2);

    /// Gas pressure hit a barrier at `pos`. `inside` means the gas is
    /// trying to leave this very tile.
    fn bump_by_gas(&mut self, pos: UVec2, dir: Dir, inside: bool);
}

impl GasHolder for AtmosHolder {
    fn gas(&self, index: usize) -> f32 {
        AtmosHolder::gas(self, index)
    }

    fn add_gas(&mut self, index: usize, amount: f32) {
        AtmosHolder::add_gas(self, index, amount);
    }

    fn energy(&self) -> f32 {
        AtmosHolder::energy(self)
    }

    fn add_energy(&mut self, amount: f32) {
        AtmosHolder::add_energy(self, amount);
    }

    fn pressure(&self) -> f32 {
        AtmosHolder::pressure(self)
    }

    fn truncate(&mut self) {
        AtmosHolder::truncate(self);
    }
}

/// Side effect of a movement pass, recorded for the ECS to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasEffect {
    Bumped {
        position: UVec2,
        dir: Dir,
        inside: bool,
    },
    Pushed {
        position: UVec2,
        entity: Entity,
        force: IVec2,
    },
}

/// [`AtmosMap`] over a [`Tilemap`], collecting bumps and pushes into `effects`.
pub struct TilemapAtmos<'a> {
    tilemap: &'a mut Tilemap,
    effects: &'a mut Vec<GasEffect>,
}

impl<'a> TilemapAtmos<'a> {
    pub fn new(tilemap: &'a mut Tilemap, effects: &'a mut Vec<GasEffect>) -> Self {
        Self { tilemap, effects }
    }
}

impl AtmosMap for TilemapAtmos<'_> {
    type Holder = AtmosHolder;

    fn dimensions(&self) -> UVec3 {
        UVec3::new(
            self.tilemap.width(),
            self.tilemap.height(),
            self.tilemap.depth(),
        )
    }

    fn passability(&self, pos: UVec2, dir: Dir) -> Passable {
        self.tilemap.passability(pos.as_ivec2(), dir)
    }

    fn is_space(&self, pos: UVec2) -> bool {
        self.tilemap.is_space(pos.as_ivec2())
    }

    fn holder(&self, pos: UVec2) -> &AtmosHolder {
        self.tilemap
            .holder(pos.as_ivec2())
            .unwrap_or_else(|| panic!("no tile at {pos} for atmos holder"))
    }

    fn holder_mut(&mut self, pos: UVec2) -> &mut AtmosHolder {
        self.tilemap
            .holder_mut(pos.as_ivec2())
            .unwrap_or_else(|| panic!("no tile at {pos} for atmos holder"))
    }

    fn occupants(&self, pos: UVec2) -> &[Occupant] {
        self.tilemap.occupants(pos.as_ivec2())
    }

    fn apply_force(&mut self, pos: UVec2, index: usize, force: IVec2) {
        let entity = self.tilemap.occupants(pos.as_ivec2())[index].entity;
        self.effects.push(GasEffect::Pushed {
            position: pos,
            entity,
            force,
        });
    }

    fn bump_by_gas(&mut self, pos: UVec2, dir: Dir, inside: bool) {
        self.effects.push(GasEffect::Bumped {
            position: pos,
            dir,
            inside,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiles::{Gas, Structure, TileKind};

    #[test]
    fn test_adapter_reports_tilemap_state() {
        let mut tilemap = Tilemap::new(3, 2, TileKind::Floor).with_depth(2);
        tilemap.set(IVec2::new(2, 0), TileKind::Space);
        tilemap.set_structure(IVec2::new(1, 1), Some(Structure::Door { open: false }));
        tilemap.fill_standard_atmosphere();
        let mut effects = Vec::new();
        let map = TilemapAtmos::new(&mut tilemap, &mut effects);

        assert_eq!(map.dimensions(), UVec3::new(3, 2, 2));
        assert!(map.is_space(UVec2::new(2, 0)));
        assert!(!map.is_space(UVec2::new(0, 0)));
        assert_eq!(map.passability(UVec2::new(1, 1), Dir::All), Passable::Empty);
        assert_eq!(map.passability(UVec2::new(0, 0), Dir::Up), Passable::Full);
        assert_eq!(map.neighbour(UVec2::new(2, 1), Dir::Up), Some(UVec2::new(2, 0)));
        assert_eq!(map.neighbour(UVec2::new(2, 1), Dir::Right), None);
        assert_eq!(map.neighbour(UVec2::new(0, 0), Dir::Left), None);
        assert!(
            GasHolder::gas(map.holder(UVec2::new(0, 0)), Gas::Oxygen.index()) > 0.0
        );
    }

    #[test]
    fn test_adapter_records_effects() {
        let mut world = World::new();
        let crate_entity = world.spawn_empty().id();
        let mut tilemap = Tilemap::new(2, 1, TileKind::Floor);
        tilemap.add_occupant(
            IVec2::new(0, 0),
            Occupant {
                entity: crate_entity,
                passable: Passable::BigItem,
            },
        );
        let mut effects = Vec::new();
        {
            let mut map = TilemapAtmos::new(&mut tilemap, &mut effects);
            map.bump_by_gas(UVec2::new(1, 0), Dir::Right, false);
            map.apply_force(UVec2::new(0, 0), 0, IVec2::new(1, 0));
        }

        assert_eq!(
            effects,
            vec![
                GasEffect::Bumped {
                    position: UVec2::new(1, 0),
                    dir: Dir::Right,
                    inside: false,
                },
                GasEffect::Pushed {
                    position: UVec2::new(0, 0),
                    entity: crate_entity,
                    force: IVec2::new(1, 0),
                },
            ]
        );
    }

    #[test]
    fn test_holder_trait_delegates_to_tile_holder() {
        let mut holder = AtmosHolder::default();
        GasHolder::add_gas(&mut holder, Gas::Nitrogen.index(), 4.0);
        GasHolder::add_energy(&mut holder, 800.0);
        assert_eq!(holder.gas(Gas::Nitrogen.index()), 4.0);
        assert_eq!(GasHolder::pressure(&holder), holder.pressure());

        GasHolder::truncate(&mut holder);
        assert_eq!(holder.total_gas(), 0.0);
    }
}
