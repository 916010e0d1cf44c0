use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::compress::DEFAULT_BLOCK_SIZE;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode the levels and sprites and package them with the game code
    Build(BuildArgs),
    /// Compress a file with the block compressor
    Compress {
        input: PathBuf,
        output: PathBuf,
        /// Bytes per block, 1 to 256
        #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },
    /// Reverse `compress`
    Uncompress { input: PathBuf, output: PathBuf },
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Target machine
    pub machine: Machine,
    /// Container to produce
    pub image: ImageKind,
    /// Output image file
    pub output: PathBuf,
    /// Level source file
    #[arg(default_value = "levels/default.txt")]
    pub levels: PathBuf,

    /// Directory the catalog's image paths are relative to
    #[arg(long, default_value = ".")]
    pub assets: PathBuf,
    /// Tile catalog JSON (built-in catalog when omitted)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    /// Game source; assembled after the generated constants
    #[arg(long)]
    pub code: Option<PathBuf>,
    /// Title screen image
    #[arg(long)]
    pub title: Option<PathBuf>,
    /// Also write every block and the constants file here
    #[arg(long)]
    pub artifacts: Option<PathBuf>,
    /// Assembler program, called as `<program> <source> -o <output>`
    #[arg(long, default_value = "ophis")]
    pub assembler: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Machine {
    Electron,
    Bbc,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    /// 16K paged ROM
    Rom,
    /// Single-sided DFS disc
    Dfs,
}
