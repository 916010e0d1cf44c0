//! Portal locations and the portal destination table.
//! A portal drawn over several cells is reduced to one location that the
//! game centres the screen on after a jump.

use std::collections::BTreeMap;

use log::warn;

use crate::error::LevelFormatError;
use crate::model::{LevelFile, SCREEN_OFFSET};

/// Pick the cell a portal is "at".
///
/// The lowest row wins (largest y). Within that row the median column is
/// chosen, taking the left one of the middle pair when the count is even.
pub fn canonical(sites: &[(usize, usize)]) -> Option<(usize, usize)> {
    let y = sites.iter().map(|&(_, y)| y).max()?;
    let mut xs: Vec<usize> = sites.iter().filter(|&&(_, sy)| sy == y).map(|&(x, _)| x).collect();
    xs.sort_unstable();
    Some((xs[(xs.len() - 1) / 2], y))
}

/// `3 × max_portals` bytes: x low, x high, y for each slot's destination.
pub fn portal_table(
    file: &LevelFile,
    sites: &BTreeMap<char, Vec<(usize, usize)>>,
    max_portals: usize,
) -> Result<Vec<u8>, LevelFormatError> {
    let locations: BTreeMap<char, (usize, usize)> = sites
        .iter()
        .filter_map(|(&symbol, s)| canonical(s).map(|loc| (symbol, loc)))
        .collect();

    let mut table = vec![0u8; 3 * max_portals];
    for (&symbol, portal) in &file.portals {
        let &(x, y) = locations.get(&portal.destination).ok_or(
            LevelFormatError::DestinationNotPlaced {
                portal: symbol,
                destination: portal.destination,
            },
        )?;

        let x = x as u16;
        if x < SCREEN_OFFSET {
            warn!("Portal {symbol} leads to column {x}, scroll offset clamped to 0");
        }
        let scroll = x.saturating_sub(SCREEN_OFFSET);

        let slot = 3 * portal.slot();
        table[slot] = (scroll & 0xff) as u8;
        table[slot + 1] = (scroll >> 8) as u8;
        table[slot + 2] = y as u8;
    }
    Ok(table)
}
