//! `.alias` definitions handed to the assembler ahead of the game source.

use crate::cli::Machine;
use crate::layout::Block;
use crate::model::{EncodedLevels, SPECIAL_BASE};

/// Accumulates aligned `.alias NAME value` lines.
#[derive(Debug, Default, Clone)]
pub struct Constants {
    text: String,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&mut self, name: &str, value: String) -> &mut Self {
        self.text.push_str(&format!(".alias {name:<32} {value}\n"));
        self
    }

    pub fn address(&mut self, name: &str, value: u16) -> &mut Self {
        self.line(name, format!("${value:04x}"))
    }

    pub fn byte(&mut self, name: &str, value: u8) -> &mut Self {
        self.line(name, format!("${value:02x}"))
    }

    pub fn number(&mut self, name: &str, value: usize) -> &mut Self {
        self.line(name, value.to_string())
    }

    /// `<name>_low` and `<name>_high`.
    pub fn split(&mut self, name: &str, value: u16) -> &mut Self {
        self.byte(&format!("{name}_low"), (value & 0xff) as u8)
            .byte(&format!("{name}_high"), (value >> 8) as u8)
    }

    /// Low/high bytes of a block's start, length and end.
    pub fn address_length_end(&mut self, name: &str, address: u16, len: usize) -> &mut Self {
        let end = address as usize + len;
        self.split(&format!("{name}_address"), address)
            .split(&format!("{name}_length"), len as u16)
            .split(&format!("{name}_end"), end as u16)
    }

    pub fn blank(&mut self) -> &mut Self {
        self.text.push('\n');
        self
    }

    pub fn finish(&self) -> String {
        self.text.clone()
    }
}

/// Every constant the game code needs to find the level tables.
pub fn level_constants(constants: &mut Constants, levels: &EncodedLevels, max_special_tiles: usize) {
    let a = &levels.addresses;
    // Tables indexed by special index start at 16, so point 16 bytes early.
    let special_numbers = a.special_tile_numbers.wrapping_sub(SPECIAL_BASE as u16);
    let visibility = a.initial_visibility.wrapping_sub(SPECIAL_BASE as u16);

    constants
        .address("special_tile_numbers_address", a.special_tile_numbers)
        .split("special_tile_numbers", special_numbers)
        .address("initial_tile_visibility_address", a.initial_visibility)
        .split("tile_visibility", visibility)
        .number("tile_visibility_length", max_special_tiles)
        .address("portal_table_address", a.portal_table)
        .address("row_table_low", a.row_table_low)
        .address("row_table_high", a.row_table_high)
        .split("level_data", a.row_data)
        .blank()
        .address_length_end("levels", levels.base, levels.data.len())
        .number("level_extent", levels.extent as usize)
        .split("level_extent", levels.extent)
        .split("finish_scroll_offset", levels.finish);

    if let Some(row) = a.monster_row {
        constants.address("monster_row_address", row).split("monster_row_address", row);
    }
    if let Some(table) = a.action_table {
        constants.address("action_table_address", table).split("action_table", table);
    }
    constants.blank();
}

/// Low/high addresses of the named parts of the sprite block, given as
/// offsets from its start.
pub fn sprite_constants(constants: &mut Constants, start: u16, parts: &[(&str, usize)]) {
    for &(name, offset) in parts {
        constants.split(&format!("{name}_address"), start.wrapping_add(offset as u16));
    }
    constants.blank();
}

/// Placement of the non-level blocks plus the machine flag.
pub fn layout_constants(constants: &mut Constants, blocks: &[Block], machine: Machine) {
    for block in blocks.iter().filter(|b| b.name != "LEVELS" && b.name != "CODE") {
        constants.address_length_end(&block.name.to_lowercase(), block.start, block.len);
    }
    constants
        .number("electron", usize::from(machine == Machine::Electron))
        .number("bbc", usize::from(machine == Machine::Bbc))
        .blank();
}
