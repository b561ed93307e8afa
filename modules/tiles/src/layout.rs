use std::fmt;

use bevy::prelude::*;
use serde::Deserialize;

use crate::{Dir, Structure, TileKind, Tilemap};

/// A windoor placed by a layout. The tile underneath must be floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindoorSpec {
    pub x: u32,
    pub y: u32,
    pub facing: Dir,
    #[serde(default)]
    pub open: bool,
}

/// Station layout as written in RON.
///
/// Row glyphs: `.` floor, `#` wall, `~` space, `D` closed door, `O` open door.
///
/// ```ron
/// (
///     rows: [
///         "#####",
///         "#.D.~",
///         "#####",
///     ],
///     windoors: [(x: 1, y: 1, facing: Right)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileLayout {
    pub rows: Vec<String>,
    #[serde(default)]
    pub windoors: Vec<WindoorSpec>,
    #[serde(default = "default_depth")]
    pub depth: u32,
}

fn default_depth() -> u32 {
    1
}

#[derive(Debug)]
pub enum LayoutError {
    Parse(ron::error::SpannedError),
    Empty,
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    UnknownGlyph {
        row: usize,
        col: usize,
        glyph: char,
    },
    WindoorOffFloor {
        x: u32,
        y: u32,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Parse(err) => write!(f, "invalid layout RON: {err}"),
            LayoutError::Empty => write!(f, "layout has no tiles"),
            LayoutError::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "layout row {row} has {found} tiles, expected {expected}"
            ),
            LayoutError::UnknownGlyph { row, col, glyph } => {
                write!(f, "unknown tile glyph {glyph:?} at row {row}, column {col}")
            }
            LayoutError::WindoorOffFloor { x, y } => {
                write!(f, "windoor at ({x}, {y}) is not on a floor tile")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

impl From<ron::error::SpannedError> for LayoutError {
    fn from(err: ron::error::SpannedError) -> Self {
        LayoutError::Parse(err)
    }
}

impl TileLayout {
    pub fn from_ron(src: &str) -> Result<Self, LayoutError> {
        Ok(ron::from_str(src)?)
    }

    /// Builds a tilemap from the layout. Floors start with a standard atmosphere.
    pub fn build(&self) -> Result<Tilemap, LayoutError> {
        let width = self.rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(LayoutError::Empty);
        }

        let mut tilemap =
            Tilemap::new(width as u32, self.rows.len() as u32, TileKind::Floor).with_depth(self.depth);
        let mut doors = Vec::new();

        for (y, row) in self.rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let pos = IVec2::new(x as i32, y as i32);
                let kind = match glyph {
                    '.' => TileKind::Floor,
                    '#' => TileKind::Wall,
                    '~' => TileKind::Space,
                    'D' => {
                        doors.push((pos, false));
                        TileKind::Floor
                    }
                    'O' => {
                        doors.push((pos, true));
                        TileKind::Floor
                    }
                    _ => {
                        return Err(LayoutError::UnknownGlyph {
                            row: y,
                            col: x,
                            glyph,
                        });
                    }
                };
                tilemap.set(pos, kind);
            }
        }

        for (pos, open) in doors {
            tilemap.set_structure(pos, Some(Structure::Door { open }));
        }

        for windoor in &self.windoors {
            let pos = IVec2::new(windoor.x as i32, windoor.y as i32);
            if tilemap.get(pos) != Some(TileKind::Floor) {
                return Err(LayoutError::WindoorOffFloor {
                    x: windoor.x,
                    y: windoor.y,
                });
            }
            tilemap.set_structure(
                pos,
                Some(Structure::Windoor {
                    facing: windoor.facing,
                    open: windoor.open,
                }),
            );
        }

        tilemap.fill_standard_atmosphere();
        Ok(tilemap)
    }
}

impl Tilemap {
    /// Parses and builds a RON station layout in one go.
    pub fn from_ron(src: &str) -> Result<Self, LayoutError> {
        TileLayout::from_ron(src)?.build()
    }
}
