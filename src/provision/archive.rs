//! Zip extraction

use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;

use crate::error::{XltError, XltResult};

/// Extract every entry of `archive` below `dest`.
///
/// Entries that would escape `dest` are rejected. Returns the number of files
/// written.
pub fn extract_zip(archive: &Path, dest: &Path) -> XltResult<usize> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| XltError::Archive(format!("{}: {e}", archive.display())))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| XltError::Archive(format!("failed to read entry {i}: {e}")))?;

        let name = entry.name().to_string();
        let relative = match entry.enclosed_name() {
            Some(path) => path,
            None => {
                return Err(XltError::Archive(format!(
                    "rejecting path with directory traversal: {name}"
                )))
            }
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        set_mode(&out_path, entry.unix_mode())?;

        written += 1;
    }

    debug!("Extracted {} file(s) into {}", written, dest.display());
    Ok(written)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    match mode {
        Some(mode) => fs::set_permissions(path, fs::Permissions::from_mode(mode)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}
