//! Bridge to the external 6502 assembler.

use std::fs;
use std::process::Command;

use log::{debug, info};

use crate::error::AssembleError;

pub trait Assembler {
    /// Assemble a complete source text into a flat binary.
    fn assemble(&self, source: &str) -> Result<Vec<u8>, AssembleError>;
}

/// Runs `<program> [args..] <source> -o <output>` in a scratch directory
/// that is removed whether or not the assembler succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAssembler {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandAssembler {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }
}

impl Assembler for CommandAssembler {
    fn assemble(&self, source: &str) -> Result<Vec<u8>, AssembleError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("temp.oph");
        let output = dir.path().join("TEMP");
        fs::write(&input, source)?;

        debug!("Running {} on {} bytes of source", self.program, source.len());
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .output()?;

        if !result.status.success() {
            return Err(AssembleError::Failed {
                program: self.program.clone(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        let code = fs::read(&output)?;
        info!("{} bytes ({:04x}) of code", code.len(), code.len());
        Ok(code)
    }
}
