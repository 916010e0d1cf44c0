//! Disc and ROM containers for the finished files.

use std::fs;
use std::path::Path;

use log::info;

use crate::error::{ContainerError, ImageWriteError};

/// One file destined for a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub load: u16,
    pub exec: u16,
    pub data: Vec<u8>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, load: u16, exec: u16, data: Vec<u8>) -> Self {
        Self { name: name.into(), load, exec, data }
    }
}

pub trait ImagePackager {
    fn package(&self, files: &[FileEntry]) -> Result<Vec<u8>, ContainerError>;
}

/// Writes the packaged image, naming `path` in any failure.
pub fn write_image(
    packager: &dyn ImagePackager,
    files: &[FileEntry],
    path: &Path,
) -> Result<(), ImageWriteError> {
    let image = packager
        .package(files)
        .map_err(|source| ImageWriteError::Container { path: path.to_path_buf(), source })?;
    fs::write(path, &image)
        .map_err(|source| ImageWriteError::Io { path: path.to_path_buf(), source })?;
    info!("Written {} ({} bytes)", path.display(), image.len());
    Ok(())
}

// ─────────────────────────────────────────────────────
/// A paged ROM: every file is copied to its load address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomImage {
    pub base: u16,
    pub size: usize,
}

impl Default for RomImage {
    fn default() -> Self {
        Self { base: 0x8000, size: 0x4000 }
    }
}

impl ImagePackager for RomImage {
    fn package(&self, files: &[FileEntry]) -> Result<Vec<u8>, ContainerError> {
        let mut placed: Vec<(&FileEntry, usize)> = Vec::with_capacity(files.len());
        for file in files {
            let offset = (file.load as usize)
                .checked_sub(self.base as usize)
                .filter(|&o| o + file.data.len() <= self.size)
                .ok_or_else(|| ContainerError::OutOfWindow {
                    name: file.name.clone(),
                    load: file.load,
                    len: file.data.len(),
                })?;
            placed.push((file, offset));
        }

        placed.sort_by_key(|&(_, offset)| offset);
        for pair in placed.windows(2) {
            let (first, start) = pair[0];
            let (second, next) = pair[1];
            if start + first.data.len() > next {
                return Err(ContainerError::Overlap {
                    first: first.name.clone(),
                    second: second.name.clone(),
                });
            }
        }

        let mut image = vec![0u8; self.size];
        for (file, offset) in placed {
            image[offset..offset + file.data.len()].copy_from_slice(&file.data);
        }
        Ok(image)
    }
}

// ─────────────────────────────────────────────────────
pub const SECTOR: usize = 256;
const DFS_MAX_FILES: usize = 31;
const DFS_FIRST_DATA_SECTOR: usize = 2;

/// Acorn DFS single-sided disc (`.ssd`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfsImage {
    pub title: String,
    /// 0 none, 1 *LOAD, 2 *RUN, 3 *EXEC of `!BOOT`.
    pub boot_option: u8,
    pub sectors: usize,
}

impl DfsImage {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), boot_option: 3, sectors: 800 }
    }
}

fn check_name(name: &str) -> Result<[u8; 7], ContainerError> {
    let valid = !name.is_empty()
        && name.len() <= 7
        && name.bytes().all(|b| b.is_ascii_graphic() && !b".:\"#*".contains(&b));
    if !valid {
        return Err(ContainerError::Name(name.to_string()));
    }
    let mut padded = [b' '; 7];
    padded[..name.len()].copy_from_slice(name.as_bytes());
    Ok(padded)
}

/// Top two bits of an 18-bit DFS address, set for host-side 16-bit addresses.
const HOST: u8 = 0b11;

impl ImagePackager for DfsImage {
    fn package(&self, files: &[FileEntry]) -> Result<Vec<u8>, ContainerError> {
        if files.len() > DFS_MAX_FILES {
            return Err(ContainerError::TooManyFiles {
                limit: DFS_MAX_FILES,
                requested: files.len(),
            });
        }

        // Allocate sectors in order, then list the catalogue from the
        // highest start sector down.
        let mut next = DFS_FIRST_DATA_SECTOR;
        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let name = check_name(&file.name)?;
            let len = file.data.len();
            entries.push((name, file, next));
            next += len.div_ceil(SECTOR);
        }
        if next > self.sectors {
            return Err(ContainerError::DiscFull {
                needed: next,
                available: self.sectors,
            });
        }

        let mut image = vec![0u8; next.max(DFS_FIRST_DATA_SECTOR) * SECTOR];

        let mut title = [0u8; 12];
        for (slot, b) in title.iter_mut().zip(self.title.bytes()) {
            *slot = b;
        }
        image[0..8].copy_from_slice(&title[..8]);
        image[SECTOR..SECTOR + 4].copy_from_slice(&title[8..]);
        image[SECTOR + 5] = (entries.len() * 8) as u8;
        image[SECTOR + 6] = ((self.boot_option & 3) << 4) | ((self.sectors >> 8) as u8 & 3);
        image[SECTOR + 7] = (self.sectors & 0xff) as u8;

        for (i, &(name, file, start)) in entries.iter().rev().enumerate() {
            let at = 8 * (i + 1);
            image[at..at + 7].copy_from_slice(&name);
            image[at + 7] = b'$';

            let len = file.data.len();
            let info = &mut image[SECTOR + at..SECTOR + at + 8];
            info[0] = (file.load & 0xff) as u8;
            info[1] = (file.load >> 8) as u8;
            info[2] = (file.exec & 0xff) as u8;
            info[3] = (file.exec >> 8) as u8;
            info[4] = (len & 0xff) as u8;
            info[5] = (len >> 8) as u8;
            info[6] = (HOST << 6)
                | ((((len >> 16) & 3) as u8) << 4)
                | (HOST << 2)
                | ((start >> 8) as u8 & 3);
            info[7] = (start & 0xff) as u8;

            let offset = start * SECTOR;
            image[offset..offset + len].copy_from_slice(&file.data);
        }
        Ok(image)
    }
}
