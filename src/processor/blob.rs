//! Lays the encoded tables out at their final addresses.
//!
//! Order, with no padding between blocks:
//!   special tile numbers │ initial visibility │ portal table │
//!   row table (16 low bytes, then 16 high bytes) │ rows │
//!   monster row │ action table + records

use crate::error::{LevelCapacityError, LevelFormatError};
use crate::model::{LEVEL_ROWS, LevelAddresses, LevelFile, SPECIAL_BASE, TileCatalog};

use super::actions::{self, Action};
use super::spans::EncodedRow;

/// Special tile numbers and initial visibility flags, indexed from 16.
/// Unused entries show the blank tile and carry no flags.
pub fn special_tables(
    file: &LevelFile,
    catalog: &TileCatalog,
    max_special_tiles: usize,
) -> Result<(Vec<u8>, Vec<u8>), LevelFormatError> {
    let mut numbers = vec![0u8; max_special_tiles];
    let mut visibility = vec![0u8; max_special_tiles];

    for (&symbol, special) in &file.specials {
        let slot = (special.index - SPECIAL_BASE) as usize;
        numbers[slot] = catalog
            .tile_number(special.tile)
            .ok_or(LevelFormatError::UnknownTile { symbol, tile: special.tile })?;
        visibility[slot] = special.flags.0;
    }
    Ok((numbers, visibility))
}

/// Everything the layout needs, already encoded.
pub struct Parts<'a> {
    pub special_numbers: Vec<u8>,
    pub visibility: Vec<u8>,
    pub portals: Vec<u8>,
    pub rows: &'a [EncodedRow],
    pub monster_row: Option<EncodedRow>,
    /// Actions and the number of slots in their table.
    pub actions: Option<(&'a [Action], usize)>,
}

#[derive(Debug)]
pub struct Layout {
    pub data: Vec<u8>,
    pub addresses: LevelAddresses,
    pub row_addresses: [u16; LEVEL_ROWS],
}

fn address(base: u16, offset: usize) -> Result<u16, LevelCapacityError> {
    let end = base as usize + offset;
    u16::try_from(end).map_err(|_| LevelCapacityError::AddressOverflow { end })
}

pub fn assemble(base: u16, parts: Parts<'_>) -> Result<Layout, LevelCapacityError> {
    let mut data = Vec::new();

    let special_tile_numbers = address(base, data.len())?;
    data.extend(&parts.special_numbers);
    let initial_visibility = address(base, data.len())?;
    data.extend(&parts.visibility);
    let portal_table = address(base, data.len())?;
    data.extend(&parts.portals);

    let row_table_low = address(base, data.len())?;
    let row_table_high = address(base, data.len() + LEVEL_ROWS)?;
    let row_data = address(base, data.len() + 2 * LEVEL_ROWS)?;

    let mut row_addresses = [0u16; LEVEL_ROWS];
    let mut offset = data.len() + 2 * LEVEL_ROWS;
    for (slot, row) in row_addresses.iter_mut().zip(parts.rows) {
        *slot = address(base, offset)?;
        offset += row.bytes.len();
    }
    data.extend(row_addresses.iter().map(|a| (a & 0xff) as u8));
    data.extend(row_addresses.iter().map(|a| (a >> 8) as u8));
    for row in parts.rows {
        data.extend(&row.bytes);
    }

    let monster_row = match &parts.monster_row {
        Some(row) => {
            let at = address(base, data.len())?;
            data.extend(&row.bytes);
            Some(at)
        }
        None => None,
    };

    let action_table = match parts.actions {
        Some((list, slots)) => {
            let at = address(base, data.len())?;
            data.extend(actions::action_block(list, slots, at as u32, &row_addresses)?);
            Some(at)
        }
        None => None,
    };

    // The last byte must still be addressable.
    if !data.is_empty() {
        address(base, data.len() - 1)?;
    }

    Ok(Layout {
        data,
        addresses: LevelAddresses {
            special_tile_numbers,
            initial_visibility,
            portal_table,
            row_table_low,
            row_table_high,
            row_data,
            monster_row,
            action_table,
        },
        row_addresses,
    })
}
