//! Level data shared by the parser, encoder and writers.

pub const LEVEL_ROWS: usize = 16;

/// Encoded rows (and the monster row / action block) must stay below this.
pub const SPAN_BUDGET: usize = 512;

/// Special tile indices start here so that scenery keeps 0..16.
pub const SPECIAL_BASE: u8 = 0x10;
pub const MAX_SPECIAL_TILES: usize = 16;

/// Portal indices start here; the low nibble is the table slot.
pub const PORTAL_BASE: u8 = 0x80;
pub const MAX_PORTALS: usize = 16;

/// Trigger bytes use high nibbles 2..=7.
pub const MAX_ACTIONS: usize = 6;

/// Columns between the left edge of the screen and a portal exit.
pub const SCREEN_OFFSET: u16 = 19;

pub mod catalog;

pub use catalog::{Axis, MonsterSpec, TileCatalog};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Flags stored in the initial visibility table for one special tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialFlags(pub u8);

impl SpecialFlags {
    pub const VISIBLE: u8 = 0x01;
    pub const COLLECTABLE: u8 = 0x02;
    pub const DOOR: u8 = 0x04;
    pub const TREASURE: u8 = 0x08;

    pub const NAMES: &'static [(&'static str, u8)] = &[
        ("visible", Self::VISIBLE),
        ("collectable", Self::COLLECTABLE),
        ("door", Self::DOOR),
        ("treasure", Self::TREASURE),
    ];

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

impl FromStr for SpecialFlags {
    type Err = String;

    /// `visible,door` or `-` for none.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Self(0));
        }
        let mut bits = 0;
        for word in s.split(',') {
            let (_, bit) = Self::NAMES
                .iter()
                .find(|(name, _)| *name == word)
                .ok_or_else(|| format!("unknown flag `{word}`"))?;
            bits |= bit;
        }
        Ok(Self(bits))
    }
}

/// The eight colours a portal can be drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Colour {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Colour {
    pub const ALL: [Colour; 8] = [
        Colour::Black,
        Colour::Red,
        Colour::Green,
        Colour::Yellow,
        Colour::Blue,
        Colour::Magenta,
        Colour::Cyan,
        Colour::White,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Colour::Black => "black",
            Colour::Red => "red",
            Colour::Green => "green",
            Colour::Yellow => "yellow",
            Colour::Blue => "blue",
            Colour::Magenta => "magenta",
            Colour::Cyan => "cyan",
            Colour::White => "white",
        }
    }
}

impl FromStr for Colour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Colour::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown colour `{s}`"))
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A symbol whose tile can be hidden, collected or opened at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialTile {
    /// Scenery symbol drawn for this special.
    pub tile: char,
    /// Index into the special tile and visibility tables (>= 16).
    pub index: u8,
    pub flags: SpecialFlags,
}

/// A symbol whose spans flip from one tile to another when triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub initial: char,
    pub replacement: char,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    /// Index into the portal table (>= 128).
    pub index: u8,
    pub destination: char,
    pub colour: Colour,
}

impl Portal {
    pub fn slot(&self) -> usize {
        (self.index - PORTAL_BASE) as usize
    }
}

/// One named block of 16 rows, exactly as written in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSource {
    pub name: String,
    pub rows: Vec<String>,
}

impl LevelSource {
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0)
    }
}

/// Immediately-after-parse representation of a level file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelFile {
    pub levels: Vec<LevelSource>,
    pub specials: BTreeMap<char, SpecialTile>,
    pub triggers: BTreeMap<char, Trigger>,
    pub portals: BTreeMap<char, Portal>,
    pub finish: u16,
}

/// Which parts of the level format an encoding run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub specials: bool,
    pub portals: bool,
    pub monsters: bool,
    pub actions: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            specials: true,
            portals: true,
            monsters: true,
            actions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub capabilities: Capabilities,
    pub max_special_tiles: usize,
    pub max_portals: usize,
    pub max_actions: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            max_special_tiles: MAX_SPECIAL_TILES,
            max_portals: MAX_PORTALS,
            max_actions: MAX_ACTIONS,
        }
    }
}

/// Where each table of an encoded level ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelAddresses {
    pub special_tile_numbers: u16,
    pub initial_visibility: u16,
    pub portal_table: u16,
    pub row_table_low: u16,
    pub row_table_high: u16,
    pub row_data: u16,
    pub monster_row: Option<u16>,
    pub action_table: Option<u16>,
}

/// A level segment inside the joined world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub start: usize,
    pub width: usize,
}

/// Fully processed output handed to `writer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLevels {
    pub base: u16,
    pub data: Vec<u8>,
    pub addresses: LevelAddresses,
    pub row_addresses: [u16; LEVEL_ROWS],
    /// Width of the joined level in columns.
    pub extent: u16,
    pub finish: u16,
    pub segments: Vec<Segment>,
}
