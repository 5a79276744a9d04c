//! Stage directory helpers
//!
//! Enumeration of materialized assets and the `.partial` write protocol used
//! by every stage: write `<final>.partial`, then rename onto `<final>`.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix of files still being written
pub const PARTIAL_SUFFIX: &str = "partial";

/// Extensions left behind by interrupted or in-flight downloads
const PENDING_EXTENSIONS: &[&str] = &["part", "ytdl", "partial", "tmp"];

/// True for files that are not (yet) materialized assets
///
/// Covers hidden files, in-flight download artifacts (`*.part`, `*.ytdl`,
/// `*.partial`) and yt-dlp fragment files (`*.part-Frag3`).
pub fn is_pending_artifact(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return true,
    };

    if name.starts_with('.') {
        return true;
    }

    if name.contains(".part-") {
        return true;
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => PENDING_EXTENSIONS
            .iter()
            .any(|pending| ext.eq_ignore_ascii_case(pending)),
        None => false,
    }
}

/// List the materialized files of one stage directory, sorted by file name
///
/// Only the top level is read. A missing directory yields an empty list.
/// With `extension` set, only files with that extension (case-insensitive)
/// are returned.
pub fn list_stage_files(dir: &Path, extension: Option<&str>) -> io::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed"))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_pending_artifact(path) {
            continue;
        }

        if let Some(wanted) = extension {
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(wanted))
                .unwrap_or(false);
            if !matches {
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Asset identifier of a stage file (its name without the extension)
pub fn asset_id(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// Scratch path a stage writes to before committing `final_path`
pub fn partial_path(final_path: &Path) -> PathBuf {
    let mut name: OsString = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    final_path.with_file_name(name)
}

/// Move a finished partial file onto its final path
///
/// Rename within one directory, so an existing final file is replaced in a
/// single step.
pub fn commit_partial(final_path: &Path) -> io::Result<()> {
    std::fs::rename(partial_path(final_path), final_path)
}

/// Remove a leftover partial file, if any
pub fn discard_partial(final_path: &Path) {
    let partial = partial_path(final_path);
    if partial.exists() {
        if let Err(e) = std::fs::remove_file(&partial) {
            tracing::warn!(path = %partial.display(), error = %e, "Failed to remove partial file");
        }
    }
}

/// Delete every entry of `dir`, keeping the directory itself
///
/// Returns the number of entries removed.
pub fn clear_folder(dir: &Path) -> io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}
