//! Atomic file writes
//!
//! Content goes to `<path>.tmp` in the same directory, is synced, and is then
//! renamed over `<path>`. Readers see either the old file or the new one.

use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to serialize JSON for {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `<path>.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    PathBuf::from(temp)
}

/// Write `value` as pretty-printed JSON with a trailing newline
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), WriteError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|source| WriteError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');
    write_bytes(path, json.as_bytes())
}

/// Replace the contents of `path` with `content`
pub fn write_bytes(path: &Path, content: &[u8]) -> Result<(), WriteError> {
    let temp_path = temp_path_for(path);

    if let Err(source) = write_synced(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(WriteError::Io {
            path: temp_path,
            source,
        });
    }

    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
