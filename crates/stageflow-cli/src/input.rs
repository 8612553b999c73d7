//! Input handling for file reading and stdin support.

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::PathBuf;

/// Name given to input read from stdin.
pub const STDIN_NAME: &str = "<stdin>";

/// One input script and where it came from.
#[derive(Debug, Clone)]
pub struct InputSource {
    pub name: String,
    pub content: String,
}

/// Read input from files or stdin.
///
/// If no files are provided, reads from stdin.
pub fn read_input(files: &[PathBuf]) -> Result<Vec<InputSource>> {
    if files.is_empty() {
        read_from_stdin()
    } else {
        read_from_files(files)
    }
}

fn read_from_stdin() -> Result<Vec<InputSource>> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read from stdin")?;

    Ok(vec![InputSource {
        name: STDIN_NAME.to_string(),
        content,
    }])
}

fn read_from_files(files: &[PathBuf]) -> Result<Vec<InputSource>> {
    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;

            Ok(InputSource {
                name: path.display().to_string(),
                content,
            })
        })
        .collect()
}
