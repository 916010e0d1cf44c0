//! Fixed memory maps and the overrun checks between their blocks.

use log::info;

use crate::cli::ImageKind;
use crate::error::LayoutOverflowError;

/// Start addresses of every block, plus the limits of the last ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMap {
    pub code: u16,
    pub levels: u16,
    pub sprites: u16,
    pub sprite_limit: u16,
    pub title: u16,
    pub title_limit: u16,
}

impl MemoryMap {
    /// Loaded from disc into RAM below screen memory.
    pub const RAM: MemoryMap = MemoryMap {
        code: 0x0e00,
        levels: 0x2162,
        sprites: 0x2b80,
        sprite_limit: 0x3000,
        title: 0x5800,
        title_limit: 0x8000,
    };

    /// Paged ROM at 0x8000.
    pub const ROM: MemoryMap = MemoryMap {
        code: 0x8000,
        levels: 0x9600,
        sprites: 0xa01e,
        sprite_limit: 0xa55e,
        title: 0xaa5e,
        title_limit: 0xc000,
    };

    pub fn for_image(kind: ImageKind) -> MemoryMap {
        match kind {
            ImageKind::Rom => MemoryMap::ROM,
            ImageKind::Dfs => MemoryMap::RAM,
        }
    }

    /// The four blocks in address order, each bounded by the next.
    pub fn blocks(&self, code: usize, levels: usize, sprites: usize, title: usize) -> [Block; 4] {
        [
            Block::new("CODE", self.code, code, self.levels),
            Block::new("LEVELS", self.levels, levels, self.sprites),
            Block::new("SPRITES", self.sprites, sprites, self.sprite_limit),
            Block::new("TITLE", self.title, title, self.title_limit),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: &'static str,
    pub start: u16,
    pub len: usize,
    /// First address of whatever follows.
    pub limit: u16,
}

impl Block {
    pub fn new(name: &'static str, start: u16, len: usize, limit: u16) -> Self {
        Self { name, start, len, limit }
    }

    pub fn end(&self) -> u32 {
        self.start as u32 + self.len as u32
    }

    /// Bytes left before the limit; negative when the block overruns.
    pub fn free(&self) -> i64 {
        self.limit as i64 - self.end() as i64
    }

    pub fn check(&self) -> Result<(), LayoutOverflowError> {
        let free = self.free();
        if free < 0 {
            return Err(LayoutOverflowError {
                block: self.name.to_string(),
                end: self.end(),
                limit: self.limit as u32,
                overrun: free.unsigned_abs() as u32,
            });
        }
        info!(
            "{:<7} runs from {:04x} to {:04x} ({} bytes free)",
            self.name,
            self.start,
            self.end(),
            free
        );
        Ok(())
    }
}

/// Checks every block in turn, stopping at the first overrun.
pub fn check_all(blocks: &[Block]) -> Result<(), LayoutOverflowError> {
    blocks.iter().try_for_each(Block::check)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_per_image() {
        assert_eq!(MemoryMap::for_image(ImageKind::Dfs).levels, 0x2162);
        assert_eq!(MemoryMap::for_image(ImageKind::Rom).code, 0x8000);
        assert_eq!(MemoryMap::for_image(ImageKind::Rom).title_limit, 0xc000);
    }

    #[test]
    fn exact_fit_is_allowed() {
        let [code, levels, ..] = MemoryMap::RAM.blocks(0x2162 - 0x0e00, 0x2b80 - 0x2162, 0, 0);
        assert_eq!(code.free(), 0);
        assert!(code.check().is_ok());
        assert!(levels.check().is_ok());
    }

    #[test]
    fn overrun_names_block_and_bytes() {
        let blocks = MemoryMap::ROM.blocks(0x100, 0xa01e - 0x9600 + 37, 0, 0);
        let err = check_all(&blocks).unwrap_err();
        assert_eq!(err.block, "LEVELS");
        assert_eq!(err.overrun, 37);
        assert_eq!(err.limit, 0xa01e);
        assert_eq!(err.to_string(), "LEVELS overruns following data by 37 bytes");
    }

    #[test]
    fn title_can_reach_top_of_rom() {
        let blocks = MemoryMap::ROM.blocks(0, 0, 0, 0xc000 - 0xaa5e);
        assert!(check_all(&blocks).is_ok());
        let blocks = MemoryMap::ROM.blocks(0, 0, 0, 0xc000 - 0xaa5e + 1);
        assert_eq!(check_all(&blocks).unwrap_err().block, "TITLE");
    }
}
