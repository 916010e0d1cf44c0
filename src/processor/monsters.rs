//! The monster row: one byte per column, 0 where there is no monster,
//! run-length encoded like a scenery row.

use std::collections::BTreeMap;

use crate::error::LevelCapacityError;
use crate::model::SPAN_BUDGET;

use super::spans::{self, EncodedRow};

pub fn monster_values(monsters: &BTreeMap<usize, (usize, u8)>, width: usize) -> Vec<u8> {
    let mut values = vec![0u8; width];
    for (&column, &(_, byte)) in monsters {
        values[column] = byte;
    }
    values
}

pub fn monster_row(
    monsters: &BTreeMap<usize, (usize, u8)>,
    width: usize,
) -> Result<EncodedRow, LevelCapacityError> {
    let row = spans::encode_row(&monster_values(monsters, width));
    if row.bytes.len() >= SPAN_BUDGET {
        return Err(LevelCapacityError::MonsterRowTooLong { bytes: row.bytes.len() });
    }
    Ok(row)
}
