//! Dump every built block and the constants file for inspection.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use super::FileEntry;

pub fn emit(files: &[FileEntry], constants: &str, out_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(out_dir)?;
    for file in files {
        blob(file, out_dir)?;
    }
    fs::write(out_dir.join("constants.oph"), constants)?;
    Ok(())
}

fn blob(file: &FileEntry, out_dir: &Path) -> io::Result<()> {
    let path = out_dir.join(format!("{}.bin", file.name));
    debug!("Writing {} ({} bytes at ${:04x})", path.display(), file.data.len(), file.load);
    fs::write(&path, &file.data)
}
