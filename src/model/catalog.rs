//! The fixed symbol → tile table.
//!
//! Tile numbers are baked into the encoded level data, so the order of
//! `tiles` must stay stable across a build. The first tile is the blank
//! background that pads short rows and sits underneath monsters.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TileEntry {
    pub symbol: char,
    pub image: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonsterSpec {
    pub symbol: char,
    /// 1..=7; 0 means "no monster" in the monster row.
    pub kind: u8,
    pub axis: Axis,
    /// Animation frames.
    #[serde(default)]
    pub images: Vec<PathBuf>,
}

impl MonsterSpec {
    /// Pack kind, axis and row into one monster row byte.
    pub fn encode(&self, row: usize) -> u8 {
        let axis = match self.axis {
            Axis::Horizontal => 0,
            Axis::Vertical => 1,
        };
        (self.kind << 5) | (axis << 4) | (row as u8 & 0x0f)
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    tiles: Vec<TileEntry>,
    #[serde(default)]
    monsters: Vec<MonsterSpec>,
}

/// Immutable once built; pass it by reference into the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileCatalog {
    tiles: Vec<TileEntry>,
    monsters: Vec<MonsterSpec>,
}

impl TileCatalog {
    pub fn new(tiles: Vec<TileEntry>, monsters: Vec<MonsterSpec>) -> Result<Self, CatalogError> {
        if tiles.is_empty() {
            return Err(CatalogError::Empty);
        }
        if tiles.len() > 16 {
            return Err(CatalogError::TooManyTiles(tiles.len()));
        }
        let mut seen = BTreeSet::new();
        for symbol in tiles.iter().map(|t| t.symbol).chain(monsters.iter().map(|m| m.symbol)) {
            if !seen.insert(symbol) {
                return Err(CatalogError::DuplicateSymbol(symbol));
            }
        }
        if let Some(m) = monsters.iter().find(|m| !(1..=7).contains(&m.kind)) {
            return Err(CatalogError::MonsterKind { symbol: m.symbol, kind: m.kind });
        }
        Ok(Self { tiles, monsters })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::new(raw.tiles, raw.monsters)
    }

    pub fn tile_number(&self, symbol: char) -> Option<u8> {
        self.tiles.iter().position(|t| t.symbol == symbol).map(|n| n as u8)
    }

    pub fn blank(&self) -> char {
        self.tiles[0].symbol
    }

    pub fn monster(&self, symbol: char) -> Option<&MonsterSpec> {
        self.monsters.iter().find(|m| m.symbol == symbol)
    }

    pub fn tiles(&self) -> &[TileEntry] {
        &self.tiles
    }

    pub fn monsters(&self) -> &[MonsterSpec] {
        &self.monsters
    }
}

impl Default for TileCatalog {
    /// The game's own tile order.
    fn default() -> Self {
        let tile = |symbol, image: &str| TileEntry { symbol, image: PathBuf::from(image) };
        let tiles = vec![
            tile('.', "images/blank.png"),
            tile('@', "images/brick.png"),
            tile('+', "images/grass.png"),
            tile('~', "images/grass2.png"),
            tile('#', "images/ground.png"),
            tile('X', "images/rock.png"),
            tile('-', "images/floor.png"),
            tile('|', "images/door.png"),
            tile('/', "images/window-topleft.png"),
            tile('\\', "images/window-topright.png"),
            tile('[', "images/brick-left.png"),
            tile(']', "images/brick-right.png"),
            tile('{', "images/rope.png"),
            tile('?', "images/flag.png"),
            tile('I', "images/gate.png"),
            tile('%', "images/foliage.png"),
        ];
        let monsters = vec![
            MonsterSpec {
                symbol: 'B',
                kind: 1,
                axis: Axis::Horizontal,
                images: vec!["images/bat1.png".into(), "images/bat2.png".into()],
            },
            MonsterSpec {
                symbol: 'S',
                kind: 2,
                axis: Axis::Vertical,
                images: vec!["images/spider1.png".into(), "images/spider2.png".into()],
            },
        ];
        Self { tiles, monsters }
    }
}
