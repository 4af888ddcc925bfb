// src/output/writer.rs
//! Writes rendered output to its destination.
//!
//! This is the only place where result files are written.

use crate::error::AppError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where rendered output goes.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryTarget {
    /// Write to a file, creating parent directories.
    File(PathBuf),
    Stdout,
}

impl DeliveryTarget {
    /// A file target unless piping was requested or no file was given.
    pub fn select(output_file: Option<&Path>, pipe: bool) -> Self {
        match output_file {
            Some(path) if !pipe => Self::File(path.to_path_buf()),
            _ => Self::Stdout,
        }
    }
}

pub fn deliver(target: &DeliveryTarget, content: &str) -> Result<(), AppError> {
    match target {
        DeliveryTarget::File(path) => write_file(path, content),
        DeliveryTarget::Stdout => print_to_stdout(content),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), AppError> {
    log::debug!("Writing {} bytes to {}", content.len(), path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    log::info!("Wrote file: {}", path.display());
    Ok(())
}

fn print_to_stdout(content: &str) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
