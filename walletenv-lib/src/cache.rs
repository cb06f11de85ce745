use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Returns `Ok(false)` only when the path is not found. Any other access
/// failure is an [`Error::Probe`].
pub async fn exists(path: &Path) -> Result<bool> {
    tracing::debug!("Checking if directory or file exists on path: {}", path.display());
    match tokio::fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Directory or file doesn't exist");
            Ok(false)
        }
        Err(e) => Err(Error::Probe {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Creates `path` (one level only) if it is missing.
pub async fn ensure_dir(path: &Path) -> Result<bool> {
    if exists(path).await? {
        return Ok(true);
    }

    tracing::debug!("Creating directory {} as it doesn't exist", path.display());
    match tokio::fs::create_dir(path).await {
        Ok(()) => Ok(true),
        // Lost a race with another creator.
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(true),
        Err(e) => Err(Error::Probe {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// A provider build extracted under the cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub tag_name: String,
    pub path: PathBuf,
    pub size: u64,
    pub has_manifest: bool,
}

/// Lists the provider directories under `cache_dir`, sorted by tag name.
pub fn cached_providers(cache_dir: &Path) -> Result<Vec<CacheEntry>> {
    let mut entries = Vec::new();

    let read_dir = match std::fs::read_dir(cache_dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(entries),
        Err(e) => return Err(probe_error(cache_dir, e)),
    };

    for entry in read_dir {
        let entry = entry.map_err(|e| probe_error(cache_dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        entries.push(CacheEntry {
            tag_name: entry.file_name().to_string_lossy().into_owned(),
            size: directory_size(&path),
            has_manifest: path.join(MANIFEST_FILE).is_file(),
            path,
        });
    }

    entries.sort_by(|a, b| a.tag_name.cmp(&b.tag_name));
    Ok(entries)
}

/// Removes every provider directory under `cache_dir` and returns how many were removed.
pub fn clear(cache_dir: &Path) -> Result<usize> {
    let entries = cached_providers(cache_dir)?;
    for entry in &entries {
        std::fs::remove_dir_all(&entry.path).map_err(|e| probe_error(&entry.path, e))?;
    }
    Ok(entries.len())
}

fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

fn probe_error(path: &Path, source: std::io::Error) -> Error {
    Error::Probe {
        path: path.to_path_buf(),
        source,
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
