//! Atomic write primitives
//!
//! Uses temp→rename pattern to ensure no partial writes. The temp file is
//! removed whenever the write does not complete.

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, Result};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Temp sibling of `target`: same directory, `.tmp` appended to the file name
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    target.with_file_name(name)
}

/// Atomically write bytes to a file
///
/// Readers see either the old content or the new content, never a mix.
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error("create_snapshot_dir", e))?;
        }
    }

    // Same directory, so the rename never crosses filesystems.
    let temp_path = temp_path_for(target_path);

    write_temp(&temp_path, content)
        .and_then(|()| {
            fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_snapshot_temp", e))
        })
        .map_err(|e| {
            // The target is untouched; only the temp file can be left over.
            let _ = fs::remove_file(&temp_path);
            e
        })
}

fn write_temp(temp_path: &Path, content: &[u8]) -> Result<()> {
    let mut file = fs::File::create(temp_path).map_err(|e| io_error("create_snapshot_temp", e))?;
    file.write_all(content)
        .map_err(|e| io_error("write_snapshot_temp", e))?;
    file.sync_all()
        .map_err(|e| io_error("sync_snapshot_temp", e))
}
