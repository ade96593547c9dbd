// src/io/library.rs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::compositor::{ReferenceLibrary, classify_file_stem};
use crate::io::decode::decode_file;

/// Builds a library from explicit files. Only stems like `C4` count; the
/// first file for a letter wins and sharp recordings are ignored.
pub fn load_library_files<P: AsRef<Path>>(paths: &[P]) -> Result<ReferenceLibrary> {
    let mut library = ReferenceLibrary::new();
    for path in paths {
        let path = path.as_ref();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(class) = classify_file_stem(stem) else {
            log::debug!("⏭️ [Library] {} is not a note file", path.display());
            continue;
        };
        if class.is_sharp() {
            log::info!("⏭️ [Library] {} ignored: sharps are derived from {}", path.display(), class.natural());
            continue;
        }
        if library.get(class).is_some() {
            log::info!("⏭️ [Library] {} ignored: {} already loaded", path.display(), class);
            continue;
        }
        let buffer = decode_file(path)?;
        library.insert(class, buffer);
        log::info!("🎹 [Library] {} <- {}", class, path.display());
    }
    Ok(library)
}

/// Every file in `dir`, visited in name order.
pub fn load_library_dir(dir: impl AsRef<Path>) -> Result<ReferenceLibrary> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    load_library_files(&paths)
}
