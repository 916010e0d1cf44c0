//! The level encoder.
//!
//! Turns a parsed level file into the exact byte layout the game's
//! renderer indexes into. Every pass is pure; the only input besides the
//! level text is the base address the data will be loaded at.
pub mod actions;
pub mod blob;
pub mod grid;
pub mod monsters;
pub mod portals;
pub mod spans;

use std::collections::BTreeMap;

use log::{debug, info};

use crate::error::{EncodeError, LevelCapacityError};
use crate::model::{
    EncodedLevels, EncoderConfig, LevelFile, MAX_ACTIONS, MAX_PORTALS, MAX_SPECIAL_TILES,
    SPAN_BUDGET, TileCatalog,
};

use grid::{Classifier, World};
use spans::EncodedRow;

/// Runs every encoding pass and returns a read-only structure for writers.
pub fn encode(
    file: &LevelFile,
    catalog: &TileCatalog,
    config: &EncoderConfig,
    base: u16,
) -> Result<EncodedLevels, EncodeError> {
    check_tables(file, config)?;
    let caps = config.capabilities;

    let world = grid::join(&file.levels, catalog.blank())?;

    let (numbers, mut actions) = if caps.actions {
        actions::group(&file.triggers, catalog, config.max_actions)?
    } else {
        (BTreeMap::new(), Vec::new())
    };

    let classified = Classifier::new(catalog, file, config, &numbers).classify(&world)?;

    let mut rows = Vec::with_capacity(classified.values.len());
    for (r, values) in classified.values.iter().enumerate() {
        let row = spans::encode_row(values);
        check_row(&world, r, &row)?;
        debug!("Row {r}: {} spans, {} bytes", row.pieces.len(), row.bytes.len());
        rows.push(row);
    }

    let (special_numbers, visibility) = if caps.specials {
        blob::special_tables(file, catalog, config.max_special_tiles)?
    } else {
        (vec![0; config.max_special_tiles], vec![0; config.max_special_tiles])
    };

    let portals = if caps.portals {
        portals::portal_table(file, &classified.portal_sites, config.max_portals)?
    } else {
        vec![0; 3 * config.max_portals]
    };

    let monster_row = if caps.monsters {
        Some(monsters::monster_row(&classified.monsters, world.width)?)
    } else {
        None
    };

    if caps.actions {
        actions::collect_pieces(&mut actions, &rows);
    }

    let layout = blob::assemble(
        base,
        blob::Parts {
            special_numbers,
            visibility,
            portals,
            rows: &rows,
            monster_row,
            actions: caps.actions.then_some((actions.as_slice(), config.max_actions)),
        },
    )?;

    info!("{} bytes ({:04x}) of level data", layout.data.len(), layout.data.len());

    Ok(EncodedLevels {
        base,
        data: layout.data,
        addresses: layout.addresses,
        row_addresses: layout.row_addresses,
        extent: world.width as u16,
        finish: file.finish,
        segments: world.segments,
    })
}

fn check_tables(file: &LevelFile, config: &EncoderConfig) -> Result<(), LevelCapacityError> {
    let limits = [
        ("special tile", file.specials.len(), config.max_special_tiles, MAX_SPECIAL_TILES),
        ("portal", file.portals.len(), config.max_portals, MAX_PORTALS),
        ("action", 0, config.max_actions, MAX_ACTIONS),
    ];
    for (table, requested, configured, hard) in limits {
        if configured > hard {
            return Err(LevelCapacityError::TableFull { table, requested: configured, limit: hard });
        }
        if requested > configured {
            return Err(LevelCapacityError::TableFull { table, requested, limit: configured });
        }
    }
    Ok(())
}

/// A row must stay under the span budget; blame the segment holding the
/// piece that crossed it.
fn check_row(world: &World, row: usize, encoded: &EncodedRow) -> Result<(), LevelCapacityError> {
    if encoded.bytes.len() < SPAN_BUDGET {
        return Ok(());
    }
    let column = encoded
        .pieces
        .iter()
        .find(|p| p.offset + 2 >= SPAN_BUDGET)
        .map_or(0, |p| p.column);
    let (level, _) = world.locate(column);
    Err(LevelCapacityError::RowTooLong {
        level,
        name: world.segments[level].name.clone(),
        row,
        bytes: encoded.bytes.len(),
    })
}
