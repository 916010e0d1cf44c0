pub mod assembler;
pub mod cli;
pub mod compress;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod processor;
pub mod sprites;
pub mod writer;

use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use log::info;

use assembler::{Assembler, CommandAssembler};
use cli::{BuildArgs, Command, ImageKind};
use layout::MemoryMap;
use model::{EncoderConfig, TileCatalog};
use sprites::{ImageLoader, PngLoader};
use writer::{Constants, DfsImage, FileEntry, ImagePackager, RomImage};

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    match args.command {
        Command::Build(build_args) => {
            let assembler = CommandAssembler::new(build_args.assembler.as_str());
            build(&build_args, &assembler, &PngLoader)
        }
        Command::Compress { input, output, block_size } => {
            convert(&input, &output, |data| compress::compress(data, block_size))
        }
        Command::Uncompress { input, output } => convert(&input, &output, compress::uncompress),
    }
}

fn convert<E>(input: &Path, output: &Path, f: impl Fn(&[u8]) -> Result<Vec<u8>, E>) -> anyhow::Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let data = fs::read(input).with_context(|| format!("Reading {}", input.display()))?;
    let converted = f(data.as_slice()).with_context(|| format!("Converting {}", input.display()))?;
    fs::write(output, &converted).with_context(|| format!("Writing {}", output.display()))?;
    info!("{} bytes -> {} bytes", data.len(), converted.len());
    Ok(())
}

pub fn build(args: &BuildArgs, assembler: &dyn Assembler, loader: &dyn ImageLoader) -> anyhow::Result<()> {
    let map = MemoryMap::for_image(args.image);
    let config = EncoderConfig::default();

    // 1. ── Parse ──────────────────────────────────────────────────────
    let text = fs::read_to_string(&args.levels)
        .with_context(|| format!("Reading {}", args.levels.display()))?;
    let level_file = parser::load_levels(&text)
        .with_context(|| format!("Parsing {}", args.levels.display()))?;

    let catalog = match &args.catalog {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Reading {}", path.display()))?;
            TileCatalog::from_json(&json).with_context(|| format!("Parsing {}", path.display()))?
        }
        None => TileCatalog::default(),
    };

    // 2. ── Encode levels ──────────────────────────────────────────────
    let levels = processor::encode(&level_file, &catalog, &config, map.levels)
        .with_context(|| format!("Encoding {}", args.levels.display()))?;

    // 3. ── Sprites and title ──────────────────────────────────────────
    let tile_paths: Vec<_> = catalog.tiles().iter().map(|t| t.image.clone()).collect();
    let tiles = sprites::load_all(loader, &args.assets, &tile_paths).context("Reading tile images")?;
    let monster_paths: Vec<_> = catalog.monsters().iter().flat_map(|m| m.images.clone()).collect();
    let monsters =
        sprites::load_all(loader, &args.assets, &monster_paths).context("Reading monster images")?;

    let mut sprite_data = sprites::tile_bank(&tiles).context("Packing tiles")?;
    let monster_offset = sprite_data.len();
    sprite_data.extend(sprites::object_data(&monsters).context("Packing monsters")?);
    let shifted_offset = sprite_data.len();
    sprite_data.extend(sprites::shifted_sprites(&monsters).context("Shifting monsters")?);

    let title = match &args.title {
        Some(path) => {
            let image = loader.load(path).with_context(|| format!("Reading {}", path.display()))?;
            let bitmap = sprites::encode_sprite(&image)
                .with_context(|| format!("Packing {}", path.display()))?;
            compress::compress(&bitmap, compress::DEFAULT_BLOCK_SIZE)
                .context("Compressing title screen")?
        }
        None => Vec::new(),
    };

    // 4. ── Constants and code ─────────────────────────────────────────
    let mut constants = Constants::new();
    writer::constants::level_constants(&mut constants, &levels, config.max_special_tiles);
    writer::constants::sprite_constants(
        &mut constants,
        map.sprites,
        &[("monster_sprites", monster_offset), ("monster_sprites_shifted", shifted_offset)],
    );
    writer::constants::layout_constants(
        &mut constants,
        &map.blocks(0, levels.data.len(), sprite_data.len(), title.len()),
        args.machine,
    );
    let constants = constants.finish();

    let code = match &args.code {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Reading {}", path.display()))?;
            assembler
                .assemble(&format!("{constants}\n{source}"))
                .with_context(|| format!("Assembling {}", path.display()))?
        }
        None => Vec::new(),
    };

    // 5. ── Check layout ───────────────────────────────────────────────
    let blocks = map.blocks(code.len(), levels.data.len(), sprite_data.len(), title.len());
    layout::check_all(&blocks)?;

    // 6. ── Write outputs ──────────────────────────────────────────────
    let files: Vec<FileEntry> = [
        ("CODE", map.code, code),
        ("LEVELS", map.levels, levels.data),
        ("SPRITES", map.sprites, sprite_data),
        ("TITLE", map.title, title),
    ]
    .into_iter()
    .filter(|(_, _, data)| !data.is_empty())
    .map(|(name, load, data)| FileEntry::new(name, load, load, data))
    .collect();

    if let Some(dir) = &args.artifacts {
        writer::bin::emit(&files, &constants, dir)
            .with_context(|| format!("Writing artifacts to {}", dir.display()))?;
    }

    let packager: Box<dyn ImagePackager> = match args.image {
        ImageKind::Rom => Box::new(RomImage::default()),
        ImageKind::Dfs => Box::new(DfsImage::new(disc_title(&args.output))),
    };
    writer::write_image(packager.as_ref(), &files, &args.output)?;

    Ok(())
}

/// Disc title taken from the output file name.
fn disc_title(output: &Path) -> String {
    output
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_graphic())
        .take(12)
        .collect()
}
