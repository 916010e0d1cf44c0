use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tempfile::TempDir;

use levelpack::assembler::Assembler;
use levelpack::cli::{BuildArgs, ImageKind, Machine};
use levelpack::compress::uncompress;
use levelpack::error::{AssembleError, LayoutOverflowError};
use levelpack::layout::MemoryMap;
use levelpack::model::{EncoderConfig, TileCatalog};
use levelpack::parser::load_levels;
use levelpack::processor::encode;
use levelpack::sprites::PngLoader;

const CATALOG: &str = r##"{
    "tiles": [
        { "symbol": ".", "image": "blank.png" },
        { "symbol": "@", "image": "brick.png" },
        { "symbol": "#", "image": "ground.png" }
    ],
    "monsters": [
        { "symbol": "M", "kind": 1, "axis": "horizontal", "images": ["bat.png"] }
    ]
}"##;

/// Returns fixed bytes and remembers the source it was handed.
struct Recorder {
    code: Vec<u8>,
    source: RefCell<String>,
}

impl Assembler for Recorder {
    fn assemble(&self, source: &str) -> Result<Vec<u8>, AssembleError> {
        *self.source.borrow_mut() = source.to_string();
        Ok(self.code.clone())
    }
}

fn recorder() -> Recorder {
    Recorder { code: vec![0xea; 40], source: RefCell::new(String::new()) }
}

fn png(dir: &Path, name: &str, colour: [u8; 3]) {
    RgbImage::from_pixel(8, 8, Rgb(colour)).save(dir.join(name)).unwrap();
}

/// 16 rows of `width` dots with the given cells replaced.
fn block(name: &str, width: usize, cells: &[(usize, usize, char)]) -> String {
    let mut rows = vec![vec!['.'; width]; 16];
    for &(x, y, symbol) in cells {
        rows[y][x] = symbol;
    }
    let rows: Vec<String> = rows.into_iter().map(|r| r.into_iter().collect()).collect();
    format!("{name}\n{}\n", rows.join("\n"))
}

fn sample_levels() -> String {
    let header = "a @ visible\nk # collectable,treasure\nt @>. -\n\nA B red\nB A cyan\n\nFinish: 40\n\n";
    let first = block(
        "First",
        24,
        &[(5, 12, 'A'), (3, 13, 'a'), (4, 13, 'k'), (8, 6, 'M'), (10, 14, 't'), (11, 14, 't')],
    );
    let second = block("Second", 20, &[(10, 12, 'B'), (2, 15, '#'), (3, 15, '#')]);
    format!("{header}{first}\n{second}")
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(levels: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("levels.txt"), levels).unwrap();
        fs::write(dir.path().join("catalog.json"), CATALOG).unwrap();
        fs::write(dir.path().join("game.oph"), "; game code\n").unwrap();
        png(dir.path(), "blank.png", [0, 0, 0]);
        png(dir.path(), "brick.png", [0xff, 0, 0]);
        png(dir.path(), "ground.png", [0xff, 0xff, 0]);
        png(dir.path(), "bat.png", [0xff, 0xff, 0xff]);
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn args(&self, image: ImageKind, output: &str) -> BuildArgs {
        BuildArgs {
            machine: Machine::Electron,
            image,
            output: self.path(output),
            levels: self.path("levels.txt"),
            assets: self.dir.path().to_path_buf(),
            catalog: Some(self.path("catalog.json")),
            code: None,
            title: None,
            artifacts: Some(self.path("artifacts")),
            assembler: "ophis".into(),
        }
    }
}

#[test]
fn rom_build_places_every_block() {
    let ws = Workspace::new(&sample_levels());
    let mut args = ws.args(ImageKind::Rom, "game.rom");
    args.code = Some(ws.path("game.oph"));
    let asm = recorder();

    levelpack::build(&args, &asm, &PngLoader).unwrap();

    let rom = fs::read(ws.path("game.rom")).unwrap();
    assert_eq!(rom.len(), 16384);
    assert_eq!(&rom[..40], &[0xea; 40][..]);

    let levels = fs::read(ws.path("artifacts/LEVELS.bin")).unwrap();
    assert_eq!(&rom[0x1600..0x1600 + levels.len()], &levels[..]);

    // Special tile numbers, then visibility flags.
    assert_eq!(&levels[..3], &[1, 2, 0]);
    assert_eq!(&levels[16..19], &[1, 2 | 8, 0]);
    // A leads to B at (34, 12); B leads back to A at (5, 12), clamped.
    assert_eq!(&levels[32..38], &[15, 0, 12, 0, 0, 12]);
    // Row 0 starts right after the 32-byte row table.
    assert_eq!((levels[80], levels[96]), (0x70, 0x96));

    // Three tiles in four variants, one monster in halves and rotations,
    // then the monster shifted into a 12-pixel-wide copy.
    let sprites = fs::read(ws.path("artifacts/SPRITES.bin")).unwrap();
    assert_eq!(sprites.len(), 3 * 4 * 16 + 4 * 8 + 3 * 8);
    assert_eq!(&sprites[3 * 4 * 16 + 4 * 8..][..8], &[0; 8]);
    assert_eq!(&sprites[3 * 4 * 16 + 4 * 8 + 8..], &[0xff; 16][..]);
    assert_eq!(&rom[0x201e..0x201e + sprites.len()], &sprites[..]);

    let constants = fs::read_to_string(ws.path("artifacts/constants.oph")).unwrap();
    assert!(constants.lines().any(|l| l.starts_with(".alias level_extent ") && l.ends_with(" 44")));
    assert!(constants.contains("finish_scroll_offset_low"));
    assert!(constants.contains("monster_row_address"));
    // 0xa01e + 192 + 32
    assert!(constants.contains(&format!(".alias {:<32} $fe\n", "monster_sprites_shifted_address_low")));
    assert!(constants.contains(&format!(".alias {:<32} $a0\n", "monster_sprites_shifted_address_high")));

    let source = asm.source.borrow();
    assert!(source.starts_with(&constants));
    assert!(source.ends_with("; game code\n"));
}

#[test]
fn dfs_build_lists_files_in_catalogue() {
    let ws = Workspace::new(&sample_levels());
    let args = ws.args(ImageKind::Dfs, "castle.ssd");
    levelpack::build(&args, &recorder(), &PngLoader).unwrap();

    let disc = fs::read(ws.path("castle.ssd")).unwrap();
    assert_eq!(&disc[..6], b"CASTLE");
    // No code was given, so only LEVELS and SPRITES are stored.
    assert_eq!(disc[256 + 5], 16);
    assert_eq!(&disc[8..16], b"SPRITES$");
    assert_eq!(&disc[16..24], b"LEVELS $");
    assert_eq!(&disc[256 + 16..256 + 18], &[0x62, 0x21]);

    let levels = fs::read(ws.path("artifacts/LEVELS.bin")).unwrap();
    assert_eq!(&disc[512..512 + levels.len()], &levels[..]);
    assert!(!ws.path("artifacts/CODE.bin").exists());
}

#[test]
fn title_screen_is_compressed() {
    let ws = Workspace::new(&sample_levels());
    png(ws.dir.path(), "title.png", [0, 0, 0]);
    let mut args = ws.args(ImageKind::Dfs, "title.ssd");
    args.title = Some(ws.path("title.png"));
    levelpack::build(&args, &recorder(), &PngLoader).unwrap();

    let title = fs::read(ws.path("artifacts/TITLE.bin")).unwrap();
    assert_eq!(title, vec![0x01, 0x00, 0x0f, 0xff, 0x00]);
    assert_eq!(uncompress(&title).unwrap(), vec![0; 16]);
}

#[test]
fn detailed_row_names_the_level() {
    let busy: Vec<(usize, usize, char)> = (0..600).step_by(2).map(|x| (x, 7, '@')).collect();
    let text = format!("\n\n{}\n{}", block("Calm", 10, &[]), block("Busy", 600, &busy));
    let ws = Workspace::new(&text);

    let err = levelpack::build(&ws.args(ImageKind::Dfs, "x.ssd"), &recorder(), &PngLoader).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Level 1 (Busy): Row 7 too long or too detailed"), "{message}");
    assert!(!ws.path("x.ssd").exists());
}

#[test]
fn overrun_reports_block_and_bytes() {
    let dense: Vec<(usize, usize, char)> = (0..8)
        .flat_map(|y| (0..500).filter(|x| x % 4 < 2).map(move |x| (x, y, '@')))
        .collect();
    let ws = Workspace::new(&format!("\n\n{}", block("Dense", 500, &dense)));

    let err = levelpack::build(&ws.args(ImageKind::Rom, "x.rom"), &recorder(), &PngLoader).unwrap_err();
    let overflow = err.downcast_ref::<LayoutOverflowError>().unwrap();
    assert_eq!(overflow.block, "LEVELS");
    // 112 header bytes, 8 dense rows of 500, 8 blank rows of 4, monster
    // row of 4 and an empty action table of 12.
    assert_eq!(overflow.overrun as usize, 112 + 8 * 500 + 8 * 4 + 4 + 12 - (0xa01e - 0x9600));
    assert_eq!(err.to_string(), format!("LEVELS overruns following data by {} bytes", overflow.overrun));
}

#[test]
fn shipped_levels_fit_the_disc_map() {
    let text = fs::read_to_string("levels/default.txt").unwrap();
    let file = load_levels(&text).unwrap();
    let map = MemoryMap::RAM;
    let encoded = encode(&file, &TileCatalog::default(), &EncoderConfig::default(), map.levels).unwrap();

    let names: Vec<&str> = encoded.segments.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Gatehouse", "Great Hall"]);
    assert_eq!(encoded.extent, 80);
    assert_eq!(encoded.finish, 60);
    assert!(encoded.addresses.action_table.is_some());
    assert!(map.levels as u32 + encoded.data.len() as u32 <= map.sprites as u32);
}
