//! Trigger actions: groups of spans that flip from one tile to another.
//!
//! Triggers are grouped by their `(initial, replacement)` pair. Symbols are
//! visited in ascending order, so action numbers only depend on the file.

use std::collections::BTreeMap;

use crate::error::{EncodeError, LevelCapacityError, LevelFormatError};
use crate::model::{LEVEL_ROWS, SPAN_BUDGET, TileCatalog, Trigger};

use super::spans::EncodedRow;

/// Byte stored in the row data for a trigger cell.
pub fn trigger_value(action: u8, initial: u8) -> u8 {
    ((action + 1) << 4) | (initial & 0x0f)
}

/// Action number encoded in a span value, if it is a trigger value.
pub fn action_of(value: u8) -> Option<u8> {
    match value >> 4 {
        2..=7 => Some((value >> 4) - 1),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub number: u8,
    pub initial: u8,
    pub replacement: u8,
    /// (row, byte offset in row) of every span piece this action rewrites.
    pub pieces: Vec<(usize, usize)>,
}

impl Action {
    /// Value currently stored in the spans.
    pub fn stored(&self) -> u8 {
        trigger_value(self.number, self.initial)
    }
}

/// Assign action numbers to trigger symbols.
pub fn group(
    triggers: &BTreeMap<char, Trigger>,
    catalog: &TileCatalog,
    max_actions: usize,
) -> Result<(BTreeMap<char, u8>, Vec<Action>), EncodeError> {
    let mut numbers = BTreeMap::new();
    let mut actions: Vec<Action> = Vec::new();

    for (&symbol, trigger) in triggers {
        let tile = |tile: char| {
            catalog
                .tile_number(tile)
                .ok_or(LevelFormatError::UnknownTile { symbol, tile })
        };
        let initial = tile(trigger.initial)?;
        let replacement = tile(trigger.replacement)?;

        let number = match actions
            .iter()
            .find(|a| a.initial == initial && a.replacement == replacement)
        {
            Some(action) => action.number,
            None => {
                if actions.len() == max_actions {
                    return Err(LevelCapacityError::TableFull {
                        table: "action",
                        requested: actions.len() + 1,
                        limit: max_actions,
                    }
                    .into());
                }
                let number = actions.len() as u8 + 1;
                actions.push(Action { number, initial, replacement, pieces: Vec::new() });
                number
            }
        };
        numbers.insert(symbol, number);
    }
    Ok((numbers, actions))
}

/// Record every span piece that carries a trigger value, row by row.
pub fn collect_pieces(actions: &mut [Action], rows: &[EncodedRow]) {
    for (r, row) in rows.iter().enumerate() {
        for piece in &row.pieces {
            let value = row.bytes[piece.offset];
            if let Some(number) = action_of(value) {
                if let Some(action) = actions.iter_mut().find(|a| a.number == number) {
                    action.pieces.push((r, piece.offset));
                }
            }
        }
    }
}

/// Build the action address table followed by its records.
///
/// Slots for actions without any spans hold 0.
pub fn action_block(
    actions: &[Action],
    max_actions: usize,
    address: u32,
    row_addresses: &[u16; LEVEL_ROWS],
) -> Result<Vec<u8>, LevelCapacityError> {
    let records_start = address + 2 * max_actions as u32;
    let mut table = vec![0u8; 2 * max_actions];
    let mut records = Vec::new();

    for action in actions.iter().filter(|a| !a.pieces.is_empty()) {
        let slot = (action.number - 1) as usize;
        let record_address = records_start + records.len() as u32;
        table[2 * slot] = (record_address & 0xff) as u8;
        table[2 * slot + 1] = (record_address >> 8) as u8;

        records.push(action.stored());
        records.push(action.replacement);
        records.push(action.pieces.len().min(0xff) as u8);
        for &(row, offset) in &action.pieces {
            let piece_address = row_addresses[row] as usize + offset;
            records.push((piece_address & 0xff) as u8);
            records.push((piece_address >> 8) as u8);
        }
    }

    table.extend(records);
    if table.len() >= SPAN_BUDGET {
        return Err(LevelCapacityError::ActionTableTooLong { bytes: table.len() });
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::spans::encode_row;

    fn trigger(initial: char, replacement: char) -> Trigger {
        Trigger { initial, replacement }
    }

    #[test]
    fn value_round_trip() {
        assert_eq!(trigger_value(1, 4), 0x24);
        assert_eq!(trigger_value(6, 15), 0x7f);
        assert_eq!(action_of(0x24), Some(1));
        assert_eq!(action_of(0x7f), Some(6));
        assert_eq!(action_of(0x1f), None);
        assert_eq!(action_of(0x80), None);
    }

    #[test]
    fn grouping_is_by_class_in_symbol_order() {
        let catalog = TileCatalog::default();
        // Inserted out of order; BTreeMap visits a, b, c, d.
        let triggers = BTreeMap::from([
            ('d', trigger('@', '.')),
            ('c', trigger('#', '-')),
            ('a', trigger('#', '-')),
            ('b', trigger('@', '.')),
        ]);
        let (numbers, actions) = group(&triggers, &catalog, 6).unwrap();
        assert_eq!(numbers, BTreeMap::from([('a', 1), ('b', 2), ('c', 1), ('d', 2)]));
        assert_eq!(actions.len(), 2);
        assert_eq!((actions[0].initial, actions[0].replacement), (4, 6));
        assert_eq!((actions[1].initial, actions[1].replacement), (1, 0));
    }

    #[test]
    fn too_many_actions() {
        let catalog = TileCatalog::default();
        let triggers = BTreeMap::from([('a', trigger('@', '.')), ('b', trigger('#', '.'))]);
        assert_eq!(
            group(&triggers, &catalog, 1).unwrap_err(),
            EncodeError::Capacity(LevelCapacityError::TableFull {
                table: "action",
                requested: 2,
                limit: 1
            })
        );
    }

    #[test]
    fn unknown_trigger_tile() {
        let catalog = TileCatalog::default();
        let triggers = BTreeMap::from([('a', trigger('@', 'Q'))]);
        assert_eq!(
            group(&triggers, &catalog, 6).unwrap_err(),
            EncodeError::Format(LevelFormatError::UnknownTile { symbol: 'a', tile: 'Q' })
        );
    }

    #[test]
    fn block_lists_piece_addresses() {
        let mut actions = vec![
            Action { number: 1, initial: 1, replacement: 0, pieces: vec![] },
            Action { number: 2, initial: 4, replacement: 6, pieces: vec![] },
        ];
        // Row 0: "..tt.." where t is action 1; row 3: 300 cells of action 1.
        let t = trigger_value(1, 1);
        let row0 = vec![0, 0, t, t, 0, 0];
        let row3 = vec![t; 300];
        let mut rows: Vec<EncodedRow> = (0..LEVEL_ROWS).map(|_| encode_row(&[0])).collect();
        rows[0] = encode_row(&row0);
        rows[3] = encode_row(&row3);

        collect_pieces(&mut actions, &rows);
        assert_eq!(actions[0].pieces, vec![(0, 2), (3, 0), (3, 2)]);
        assert!(actions[1].pieces.is_empty());

        let mut row_addresses = [0u16; LEVEL_ROWS];
        row_addresses[0] = 0x3000;
        row_addresses[3] = 0x3100;
        let block = action_block(&actions, 2, 0x4000, &row_addresses).unwrap();
        assert_eq!(
            block,
            vec![
                0x04, 0x40, // action 1 record at 0x4004
                0x00, 0x00, // action 2 has no spans
                t, 0x00, 3, // initial, replacement, piece count
                0x02, 0x30, 0x00, 0x31, 0x02, 0x31,
            ]
        );
    }

    #[test]
    fn block_over_budget() {
        let actions = vec![Action {
            number: 1,
            initial: 1,
            replacement: 0,
            pieces: vec![(0, 0); 260],
        }];
        let err = action_block(&actions, 6, 0, &[0; LEVEL_ROWS]).unwrap_err();
        assert_eq!(err, LevelCapacityError::ActionTableTooLong { bytes: 12 + 3 + 520 });
    }
}
