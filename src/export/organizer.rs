//! Output file placement

use crate::error::DriverError;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Resolves output paths and makes sure they can be written
pub struct OutputOrganizer {
    /// Root relative outputs resolve against
    root: PathBuf,

    /// Create missing parent directories
    create_dirs: bool,
}

impl OutputOrganizer {
    /// Create an organizer rooted at `root`; a relative root is taken from
    /// the current directory
    pub fn new(root: PathBuf, create_dirs: bool) -> Self {
        let root = if root.is_relative() {
            std::env::current_dir()
                .map(|cwd| cwd.join(&root))
                .unwrap_or(root)
        } else {
            root
        };
        Self { root, create_dirs }
    }

    /// Absolute path for a requested output
    pub fn resolve(&self, output: &Path) -> PathBuf {
        if output.is_absolute() {
            output.to_path_buf()
        } else {
            self.root.join(output)
        }
    }

    /// Prepare the directory of `output` for writing
    ///
    /// Creates the directory when allowed, then proves it is writable by
    /// creating and removing a scratch file next to where the output goes.
    /// An existing output must be writable and is removed, so a file left by
    /// an earlier run can never pass for this run's export.
    pub fn prepare(&self, output: &Path) -> Result<(), DriverError> {
        if output.is_dir() {
            return Err(DriverError::io(
                output,
                std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "output path is a directory",
                ),
            ));
        }

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.root.clone(),
        };

        if !dir.is_dir() {
            if !self.create_dirs {
                return Err(DriverError::io(
                    output,
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("directory {:?} does not exist", dir),
                    ),
                ));
            }
            fs::create_dir_all(&dir).map_err(|e| DriverError::io(output, e))?;
            log::debug!("Created output directory {:?}", dir);
        }

        tempfile::Builder::new()
            .prefix(".circuit-exporter-probe-")
            .tempfile_in(&dir)
            .map_err(|e| DriverError::io(output, e))?;

        if output.is_file() {
            OpenOptions::new()
                .write(true)
                .open(output)
                .map_err(|e| DriverError::io(output, e))?;
            fs::remove_file(output).map_err(|e| DriverError::io(output, e))?;
            log::debug!("Removed previous output {:?}", output);
        }
        Ok(())
    }

    /// Size of a finished output, or `None` if it was not written
    pub fn written_size(&self, output: &Path) -> Option<u64> {
        fs::metadata(output)
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len())
    }
}
