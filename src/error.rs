//! Error types for every stage of the pipeline.
//!
//! Each stage owns a typed error; `run()` glues them together with
//! `anyhow` context at the top.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed level source text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelFormatError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount { line: usize, expected: usize, found: usize },

    #[error("line {line}: {reason}")]
    Header { line: usize, reason: String },

    #[error("line {line}: symbol `{symbol}` is declared more than once")]
    DuplicateSymbol { line: usize, symbol: char },

    #[error("portal `{portal}` leads to `{destination}`, which is not a declared portal")]
    UnknownDestination { portal: char, destination: char },

    #[error("portal `{portal}` leads to `{destination}`, which never appears in the level")]
    DestinationNotPlaced { portal: char, destination: char },

    #[error("line {line}: level `{name}` has {found} rows instead of 16")]
    ShortLevel { line: usize, name: String, found: usize },

    #[error("line {line}: level `{name}` has more than 16 rows")]
    LongLevel { line: usize, name: String },

    #[error("the level file contains no levels")]
    NoLevels,

    #[error("level {level}, row {row}, column {column}: unknown symbol `{symbol}`")]
    UnknownSymbol { level: usize, row: usize, column: usize, symbol: char },

    #[error("special `{symbol}` refers to unknown tile `{tile}`")]
    UnknownTile { symbol: char, tile: char },

    #[error("column {column}: monsters in rows {first} and {second} share a column")]
    MonsterCollision { column: usize, first: usize, second: usize },

    #[error("joined level is {width} columns wide, the limit is 65535")]
    TooWide { width: usize },
}

/// Encoded data that does not fit its fixed budget on the target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelCapacityError {
    #[error("Level {level} ({name}): Row {row} too long or too detailed ({bytes} bytes)")]
    RowTooLong { level: usize, name: String, row: usize, bytes: usize },

    #[error("monster row too long or too detailed ({bytes} bytes)")]
    MonsterRowTooLong { bytes: usize },

    #[error("action table too long ({bytes} bytes)")]
    ActionTableTooLong { bytes: usize },

    #[error("{table} table holds at most {limit} entries, {requested} needed")]
    TableFull { table: &'static str, requested: usize, limit: usize },

    #[error("level data ends at ${end:x}, beyond the 16-bit address space")]
    AddressOverflow { end: usize },
}

/// Either failure the level encoder can report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error(transparent)]
    Format(#[from] LevelFormatError),
    #[error(transparent)]
    Capacity(#[from] LevelCapacityError),
}

/// A memory block running into the block that follows it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{block} overruns following data by {overrun} bytes")]
pub struct LayoutOverflowError {
    pub block: String,
    pub end: u32,
    pub limit: u32,
    pub overrun: u32,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog has no tiles")]
    Empty,
    #[error("catalog has {0} tiles, at most 16 fit in a span byte")]
    TooManyTiles(usize),
    #[error("catalog symbol `{0}` is used twice")]
    DuplicateSymbol(char),
    #[error("monster `{symbol}` has kind {kind}, kinds run from 1 to 7")]
    MonsterKind { symbol: char, kind: u8 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompressError {
    #[error("block size {0} is outside 1..=256")]
    BlockSize(usize),
    #[error("compressed data ends early at byte {0}")]
    Truncated(usize),
    #[error("unknown block type {value} at byte {offset}")]
    Discriminator { offset: usize, value: u8 },
    #[error("offset {value} at byte {offset} lies outside its block")]
    OffsetOutOfRange { offset: usize, value: u8 },
}

#[derive(Debug, Error)]
pub enum TileImageError {
    #[error("{}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{}: colour {colour:?} at ({x}, {y}) is not in the palette", path.display())]
    Colour { path: PathBuf, colour: [u8; 3], x: u32, y: u32 },
    #[error("sprite is {width}x{height}, expected a multiple of 4x8")]
    Dimensions { width: usize, height: usize },
    #[error("sprite rows have different widths")]
    Ragged,
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("preparing assembler workspace: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} exited with {status}:\n{stderr}")]
    Failed { program: String, status: std::process::ExitStatus, stderr: String },
}

/// Container layout failures reported by an `ImagePackager`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerError {
    #[error("file {name} at ${load:04x} (+{len}) lies outside the image window")]
    OutOfWindow { name: String, load: u16, len: usize },
    #[error("files {first} and {second} overlap")]
    Overlap { first: String, second: String },
    #[error("file name `{0}` is not a valid catalogue name")]
    Name(String),
    #[error("catalogue holds at most {limit} files, {requested} given")]
    TooManyFiles { limit: usize, requested: usize },
    #[error("disc full: {needed} sectors needed, {available} available")]
    DiscFull { needed: usize, available: usize },
}

#[derive(Debug, Error)]
pub enum ImageWriteError {
    #[error("Couldn't build the image for {}: {source}", path.display())]
    Container {
        path: PathBuf,
        #[source]
        source: ContainerError,
    },
    #[error("Couldn't write the new image to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
