//! Notebook location resolution.
//!
//! # Responsibility
//! - Decide which registry file a process works on.
//! - Derive the relation file and path-normalization base from it.
//!
//! # Invariants
//! - An explicit `HYPERNOTE_REGISTRY_PATH` wins over discovery.
//! - Discovery never creates files; only `init` does.

use crate::registry::note_registry::NoteRegistry;
use crate::registry::RegistryResult;
use log::info;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const REGISTRY_FILE_NAME: &str = ".hnote";
pub const REGISTRY_PATH_ENV: &str = "HYPERNOTE_REGISTRY_PATH";
const RELATIONS_SUFFIX: &str = ".relations";

/// Files backing one notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLocation {
    pub registry_path: PathBuf,
    pub relations_path: PathBuf,
    /// Directory data note paths are made relative to.
    pub base_dir: PathBuf,
}

impl RegistryLocation {
    /// Location for the registry file at `registry_path`.
    pub fn at(registry_path: impl Into<PathBuf>) -> Self {
        let registry_path = registry_path.into();
        let mut relations_name: OsString = registry_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| REGISTRY_FILE_NAME.into());
        relations_name.push(RELATIONS_SUFFIX);
        let relations_path = registry_path.with_file_name(relations_name);
        let base_dir = registry_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            registry_path,
            relations_path,
            base_dir,
        }
    }

    /// Resolves the notebook for a process started in `cwd`.
    pub fn discover(cwd: &Path) -> Option<Self> {
        Self::discover_with_env(cwd, std::env::var(REGISTRY_PATH_ENV).ok())
    }

    /// Same as `discover`, with the environment override passed in.
    pub fn discover_with_env(cwd: &Path, env_path: Option<String>) -> Option<Self> {
        if let Some(raw) = env_path {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(Self::at(cwd.join(trimmed)));
            }
        }
        find_registry(cwd).map(Self::at)
    }

    /// Creates an empty notebook in `dir`. An existing registry is kept.
    pub fn init(dir: &Path) -> RegistryResult<Self> {
        let location = Self::at(dir.join(REGISTRY_FILE_NAME));
        if location.registry_path.exists() {
            info!("event=registry_init module=config status=ok existing=true");
        } else {
            NoteRegistry::new().save(Some(&location.registry_path))?;
            info!("event=registry_init module=config status=ok existing=false");
        }
        Ok(location)
    }
}

/// Nearest `.hnote` file in `start` or any of its ancestors.
pub fn find_registry(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(REGISTRY_FILE_NAME))
        .find(|candidate| candidate.is_file())
}
