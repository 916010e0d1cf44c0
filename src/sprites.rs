//! Four-colour sprite reader and packer.
//!
//! Pixels are packed two bits each, four to a byte, the way the target's
//! screen memory expects them: the left pixel of a byte owns bits 3 and 7,
//! the next bits 2 and 6, and so on. Images are emitted as 8-row cells,
//! cells left to right and then top to bottom.

use std::path::{Path, PathBuf};

use log::info;

use crate::error::TileImageError;

/// One palette index (0..=3) per pixel, row-major.
pub type Sprite = Vec<Vec<u8>>;

pub const CELL_HEIGHT: usize = 8;
pub const PIXELS_PER_BYTE: usize = 4;

/// Logical colour for each physical RGB colour the artwork may use.
pub fn palette_index(rgb: [u8; 3]) -> Option<u8> {
    match rgb {
        [0x00, 0x00, 0x00] => Some(0),
        [0xff, 0x00, 0x00] | [0x00, 0x00, 0xff] => Some(1),
        [0x00, 0xff, 0x00] | [0xff, 0x00, 0xff] | [0x00, 0xff, 0xff] => Some(2),
        [0xff, 0xff, 0x00] | [0xff, 0xff, 0xff] => Some(3),
        _ => None,
    }
}

pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<Sprite, TileImageError>;
}

/// Reads PNG (or anything else `image` can decode) from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngLoader;

impl ImageLoader for PngLoader {
    fn load(&self, path: &Path) -> Result<Sprite, TileImageError> {
        let img = image::open(path)
            .map_err(|source| TileImageError::Decode { path: path.to_path_buf(), source })?
            .to_rgb8();

        let mut sprite = vec![Vec::with_capacity(img.width() as usize); img.height() as usize];
        for (x, y, pixel) in img.enumerate_pixels() {
            let index = palette_index(pixel.0).ok_or(TileImageError::Colour {
                path: path.to_path_buf(),
                colour: pixel.0,
                x,
                y,
            })?;
            sprite[y as usize].push(index);
        }
        Ok(sprite)
    }
}

/// Loads every path in order, resolving relative paths against `root`.
pub fn load_all(
    loader: &dyn ImageLoader,
    root: &Path,
    paths: &[PathBuf],
) -> Result<Vec<Sprite>, TileImageError> {
    paths.iter().map(|p| loader.load(&root.join(p))).collect()
}

/// Width and height, checked against the cell grid.
pub fn dimensions(sprite: &Sprite) -> Result<(usize, usize), TileImageError> {
    let height = sprite.len();
    let width = sprite.first().map_or(0, Vec::len);
    if sprite.iter().any(|line| line.len() != width) {
        return Err(TileImageError::Ragged);
    }
    if width == 0 || height % CELL_HEIGHT != 0 || width % PIXELS_PER_BYTE != 0 {
        return Err(TileImageError::Dimensions { width, height });
    }
    Ok((width, height))
}

fn pack(pixels: &[u8]) -> u8 {
    pixels.iter().enumerate().fold(0, |byte, (i, &pixel)| {
        let shift = 3 - i;
        byte | match pixel & 3 {
            1 => 0x01 << shift,
            2 => 0x10 << shift,
            3 => 0x11 << shift,
            _ => 0,
        }
    })
}

pub fn encode_sprite(sprite: &Sprite) -> Result<Vec<u8>, TileImageError> {
    let (width, height) = dimensions(sprite)?;
    let mut data = Vec::with_capacity(width * height / PIXELS_PER_BYTE);
    for cell_row in sprite.chunks(CELL_HEIGHT) {
        for column in (0..width).step_by(PIXELS_PER_BYTE) {
            for line in cell_row {
                data.push(pack(&line[column..column + PIXELS_PER_BYTE]));
            }
        }
    }
    Ok(data)
}

fn map_lines(sprite: &Sprite, f: impl Fn(&[u8], &[u8]) -> Vec<u8>) -> Sprite {
    sprite
        .iter()
        .map(|line| {
            let (left, right) = line.split_at(line.len() / 2);
            f(left, right)
        })
        .collect()
}

/// Left half moved to the right edge, blank on the left.
pub fn left_edge(sprite: &Sprite) -> Sprite {
    map_lines(sprite, |left, _| [vec![0; left.len()], left.to_vec()].concat())
}

/// Right half moved to the left edge, blank on the right.
pub fn right_edge(sprite: &Sprite) -> Sprite {
    map_lines(sprite, |_, right| [right.to_vec(), vec![0; right.len()]].concat())
}

/// Halves swapped.
pub fn rotated(sprite: &Sprite) -> Sprite {
    map_lines(sprite, |left, right| [right, left].concat())
}

/// Every line moved right by one byte's worth of pixels.
pub fn shifted(sprite: &Sprite) -> Sprite {
    sprite
        .iter()
        .map(|line| [&[0; PIXELS_PER_BYTE][..], line.as_slice()].concat())
        .collect()
}

fn encode_all(sprites: &[Sprite]) -> Result<Vec<u8>, TileImageError> {
    let mut data = Vec::new();
    for sprite in sprites {
        data.extend(encode_sprite(sprite)?);
    }
    Ok(data)
}

/// Scenery tiles for both scroll banks: originals, left edges, rotated
/// copies and right edges.
pub fn tile_bank(tiles: &[Sprite]) -> Result<Vec<u8>, TileImageError> {
    let mut all = tiles.to_vec();
    all.extend(tiles.iter().map(left_edge));
    all.extend(tiles.iter().map(rotated));
    all.extend(tiles.iter().map(right_edge));

    let data = encode_all(&all)?;
    info!("{} bytes ({:04x}) of tile data", data.len(), data.len());
    Ok(data)
}

/// Moving objects split into halves, followed by the rotated halves used
/// for plotting at a half-cell offset.
pub fn object_data(objects: &[Sprite]) -> Result<Vec<u8>, TileImageError> {
    let mut halves = Vec::with_capacity(objects.len() * 2);
    for object in objects {
        halves.push(map_lines(object, |left, _| left.to_vec()));
        halves.push(map_lines(object, |_, right| right.to_vec()));
    }
    let rotations: Vec<Sprite> = halves.iter().map(rotated).collect();
    halves.extend(rotations);

    let data = encode_all(&halves)?;
    info!("{} bytes ({:04x}) of object data", data.len(), data.len());
    Ok(data)
}

/// Each sprite shifted right by four pixels, for plotting between cells.
pub fn shifted_sprites(sprites: &[Sprite]) -> Result<Vec<u8>, TileImageError> {
    let all: Vec<Sprite> = sprites.iter().map(shifted).collect();
    let data = encode_all(&all)?;
    info!("{} bytes ({:04x}) of shifted sprite data", data.len(), data.len());
    Ok(data)
}
