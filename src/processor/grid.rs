//! Joins level segments into one world and tags every cell.
//!
//! Each symbol resolves to exactly one `Cell` before any span is built, in
//! this order: special, trigger, portal, monster, scenery.

use std::collections::BTreeMap;

use crate::error::LevelFormatError;
use crate::model::{
    Colour, EncoderConfig, LEVEL_ROWS, LevelFile, LevelSource, Segment, TileCatalog,
};

use super::actions;

/// All segments side by side, padded to a rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    pub rows: Vec<Vec<char>>,
    pub segments: Vec<Segment>,
    pub width: usize,
}

impl World {
    /// Segment index and local column for a world column.
    pub fn locate(&self, column: usize) -> (usize, usize) {
        let index = self
            .segments
            .iter()
            .rposition(|s| s.start <= column)
            .unwrap_or(0);
        (index, column - self.segments[index].start)
    }
}

pub fn join(levels: &[LevelSource], blank: char) -> Result<World, LevelFormatError> {
    let mut rows = vec![Vec::new(); LEVEL_ROWS];
    let mut segments = Vec::with_capacity(levels.len());
    let mut start = 0;

    for level in levels {
        let width = level.width();
        for (row, text) in rows.iter_mut().zip(&level.rows) {
            let before = row.len();
            row.extend(text.chars());
            row.resize(before + width, blank);
        }
        segments.push(Segment { name: level.name.clone(), start, width });
        start += width;
    }

    if start > u16::MAX as usize {
        return Err(LevelFormatError::TooWide { width: start });
    }
    Ok(World { rows, segments, width: start })
}

/// What a single grid cell means to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Scenery(u8),
    Special(u8),
    Trigger { action: u8, initial: u8 },
    Portal { slot: u8, colour: Colour },
    /// Packed monster byte; the cell itself shows the blank tile.
    Monster(u8),
}

impl Cell {
    /// Byte stored in the row spans.
    pub fn value(self) -> u8 {
        match self {
            Cell::Scenery(tile) => tile,
            Cell::Special(index) => index,
            Cell::Trigger { action, initial } => actions::trigger_value(action, initial),
            Cell::Portal { slot, colour } => 0x80 | (colour.code() << 4) | slot,
            Cell::Monster(_) => 0,
        }
    }
}

/// Output of classification: per-row values plus side records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub values: Vec<Vec<u8>>,
    /// column -> (row, monster byte)
    pub monsters: BTreeMap<usize, (usize, u8)>,
    /// portal symbol -> every (x, y) it occupies
    pub portal_sites: BTreeMap<char, Vec<(usize, usize)>>,
}

pub struct Classifier<'a> {
    catalog: &'a TileCatalog,
    file: &'a LevelFile,
    config: &'a EncoderConfig,
    /// trigger symbol -> action number
    actions: &'a BTreeMap<char, u8>,
}

impl<'a> Classifier<'a> {
    pub fn new(
        catalog: &'a TileCatalog,
        file: &'a LevelFile,
        config: &'a EncoderConfig,
        actions: &'a BTreeMap<char, u8>,
    ) -> Self {
        Self { catalog, file, config, actions }
    }

    pub fn cell(&self, symbol: char, row: usize) -> Option<Cell> {
        let caps = self.config.capabilities;

        if caps.specials {
            if let Some(special) = self.file.specials.get(&symbol) {
                return Some(Cell::Special(special.index));
            }
        }
        if caps.actions {
            if let (Some(&action), Some(trigger)) =
                (self.actions.get(&symbol), self.file.triggers.get(&symbol))
            {
                let initial = self.catalog.tile_number(trigger.initial)?;
                return Some(Cell::Trigger { action, initial });
            }
        }
        if caps.portals {
            if let Some(portal) = self.file.portals.get(&symbol) {
                return Some(Cell::Portal { slot: portal.slot() as u8, colour: portal.colour });
            }
        }
        if caps.monsters {
            if let Some(monster) = self.catalog.monster(symbol) {
                return Some(Cell::Monster(monster.encode(row)));
            }
        }
        self.catalog.tile_number(symbol).map(Cell::Scenery)
    }

    pub fn classify(&self, world: &World) -> Result<Classified, LevelFormatError> {
        let mut out = Classified::default();

        for (y, row) in world.rows.iter().enumerate() {
            let mut values = Vec::with_capacity(row.len());
            for (x, &symbol) in row.iter().enumerate() {
                let cell = self.cell(symbol, y).ok_or_else(|| {
                    let (level, column) = world.locate(x);
                    LevelFormatError::UnknownSymbol { level, row: y, column, symbol }
                })?;

                match cell {
                    Cell::Monster(byte) => {
                        if let Some(&(first, _)) = out.monsters.get(&x) {
                            return Err(LevelFormatError::MonsterCollision {
                                column: x,
                                first,
                                second: y,
                            });
                        }
                        out.monsters.insert(x, (y, byte));
                    }
                    Cell::Portal { .. } => {
                        out.portal_sites.entry(symbol).or_default().push((x, y));
                    }
                    _ => {}
                }
                values.push(cell.value());
            }
            out.values.push(values);
        }
        Ok(out)
    }
}
