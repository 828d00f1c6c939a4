//! Whole-file reads and replace-on-write saves for store files.

use super::{RegistryError, RegistryResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads the whole file; `None` when it does not exist.
pub(super) fn read_file(path: &Path) -> RegistryResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RegistryError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
pub(super) fn write_file(path: &Path, bytes: &[u8]) -> RegistryResult<()> {
    let temp_path = temp_sibling(path);
    fs::write(&temp_path, bytes).map_err(|source| RegistryError::Io {
        path: temp_path.clone(),
        source,
    })?;
    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        RegistryError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
