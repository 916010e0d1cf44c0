//! Default-value compressor for bitmap data such as the title screen.
//!
//! Each block of up to 256 bytes is stored either raw or as a default
//! fill value plus the offsets of every other value:
//!
//! ```text
//! raw:        00 len-1 bytes...
//! compressed: 01 default len-1 count-1 values... offsets... 00
//! ```
//!
//! Values are written in descending order of their last offset, so each
//! value's ascending offset run ends where the next run restarts lower.

use std::collections::BTreeMap;

use log::debug;

use crate::error::CompressError;

pub const DEFAULT_BLOCK_SIZE: usize = 256;

const BLOCK_STORED: u8 = 0;
const BLOCK_COMPRESSED: u8 = 1;

pub fn compress(data: &[u8], block_size: usize) -> Result<Vec<u8>, CompressError> {
    if !(1..=256).contains(&block_size) {
        return Err(CompressError::BlockSize(block_size));
    }

    let mut out = Vec::new();
    let mut packed = 0;
    for block in data.chunks(block_size) {
        if compress_block(block, &mut out) {
            packed += 1;
        }
    }
    debug!(
        "Compressed {} bytes to {} ({} of {} blocks packed)",
        data.len(),
        out.len(),
        packed,
        data.len().div_ceil(block_size)
    );
    Ok(out)
}

/// Appends one block, returning whether the compressed form was used.
fn compress_block(block: &[u8], out: &mut Vec<u8>) -> bool {
    let mut index: BTreeMap<u8, Vec<u8>> = BTreeMap::new();
    for (offset, &value) in block.iter().enumerate() {
        index.entry(value).or_default().push(offset as u8);
    }

    // Most common value; ties go to the higher value.
    let default = index
        .iter()
        .max_by_key(|(value, offsets)| (offsets.len(), **value))
        .map_or(0, |(value, _)| *value);
    index.remove(&default);

    let mut order: Vec<(u8, &Vec<u8>)> = index.iter().map(|(&v, o)| (v, o)).collect();
    order.sort_by(|a, b| b.1.last().cmp(&a.1.last()));

    let positions: usize = order.iter().map(|(_, o)| o.len()).sum();
    let packed_len = 4 + order.len() + positions + 1;
    let stored_len = 2 + block.len();

    if packed_len >= stored_len {
        out.push(BLOCK_STORED);
        out.push((block.len() - 1) as u8);
        out.extend_from_slice(block);
        return false;
    }

    out.push(BLOCK_COMPRESSED);
    out.push(default);
    out.push((block.len() - 1) as u8);
    // Zero entries wrap to 0xff.
    out.push(order.len().wrapping_sub(1) as u8);
    out.extend(order.iter().map(|(value, _)| *value));
    for (_, offsets) in &order {
        out.extend_from_slice(offsets);
    }
    out.push(0);
    true
}

pub fn uncompress(data: &[u8]) -> Result<Vec<u8>, CompressError> {
    let mut out = Vec::new();
    let mut pos = 0;
    let byte = |at: usize| data.get(at).copied().ok_or(CompressError::Truncated(at));

    while pos < data.len() {
        match data[pos] {
            BLOCK_STORED => {
                let len = byte(pos + 1)? as usize + 1;
                let raw = data
                    .get(pos + 2..pos + 2 + len)
                    .ok_or(CompressError::Truncated(data.len()))?;
                out.extend_from_slice(raw);
                pos += 2 + len;
            }
            BLOCK_COMPRESSED => {
                let default = byte(pos + 1)?;
                let len = byte(pos + 2)? as usize + 1;
                let entries = match byte(pos + 3)? {
                    0xff => 0,
                    n => n as usize + 1,
                };
                pos += 4;

                let values = data
                    .get(pos..pos + entries)
                    .ok_or(CompressError::Truncated(data.len()))?;
                pos += entries;

                let mut block = vec![default; len];
                for &value in values {
                    let mut previous = byte(pos)?;
                    loop {
                        let slot = block
                            .get_mut(previous as usize)
                            .ok_or(CompressError::OffsetOutOfRange { offset: pos, value: previous })?;
                        *slot = value;
                        pos += 1;
                        let next = byte(pos)?;
                        if next <= previous {
                            break;
                        }
                        previous = next;
                    }
                }
                // Terminator.
                byte(pos)?;
                pos += 1;
                out.extend(block);
            }
            value => return Err(CompressError::Discriminator { offset: pos, value }),
        }
    }
    Ok(out)
}
