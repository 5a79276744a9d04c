//! Media assets and the working directory layout
//!
//! An asset's lifecycle state is implied by which stage directory holds a
//! file with its identifier. The inventory is recomputed from disk on every
//! run and never cached.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::utils::stage_dir::{asset_id, clear_folder, list_stage_files};

/// Extension of every normalized, trimmed and merged file
pub const CANONICAL_EXTENSION: &str = "mp3";

/// The four sibling stage directories under one working root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDirs {
    pub root: PathBuf,
    /// As downloaded, any container
    pub raw: PathBuf,
    /// Canonical audio
    pub normalized: PathBuf,
    /// Duration-capped canonical audio
    pub trimmed: PathBuf,
    /// Final mashups
    pub output: PathBuf,
}

impl WorkDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            raw: root.join("downloads"),
            normalized: root.join("audio"),
            trimmed: root.join("trimmed"),
            output: root.join("output"),
            root,
        }
    }

    /// Create all four directories (no-op for existing ones)
    pub fn create_all(&self) -> io::Result<()> {
        for dir in self.stage_dirs() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn stage_dirs(&self) -> [&Path; 4] {
        [&self.raw, &self.normalized, &self.trimmed, &self.output]
    }

    pub fn normalized_path(&self, id: &str) -> PathBuf {
        self.normalized.join(format!("{}.{}", id, CANONICAL_EXTENSION))
    }

    pub fn trimmed_path(&self, id: &str) -> PathBuf {
        self.trimmed.join(format!("{}.{}", id, CANONICAL_EXTENSION))
    }

    pub fn output_path(&self, output_name: &str) -> PathBuf {
        self.output.join(output_name)
    }

    /// Empty one stage directory so the next run starts over for that stage
    ///
    /// The pipeline never calls this; resumability depends on stage
    /// directories surviving between runs.
    pub fn clear_stage(&self, dir: &Path) -> io::Result<usize> {
        clear_folder(dir)
    }

    /// Raw file for `id`, whatever its extension
    pub fn raw_file_for(&self, id: &str) -> io::Result<Option<PathBuf>> {
        Ok(list_stage_files(&self.raw, None)?
            .into_iter()
            .find(|path| asset_id(path).as_deref() == Some(id)))
    }
}

/// Highest lifecycle state an asset has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetStatus {
    Absent,
    Raw,
    Normalized,
    Trimmed,
}

/// Number of assets per highest state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryCounts {
    pub raw: usize,
    pub normalized: usize,
    pub trimmed: usize,
}

impl InventoryCounts {
    pub fn total(&self) -> usize {
        self.raw + self.normalized + self.trimmed
    }
}

/// Per-asset status lookup computed from the stage directories
#[derive(Debug, Clone, Default)]
pub struct AssetInventory {
    statuses: BTreeMap<String, AssetStatus>,
}

impl AssetInventory {
    /// Scan the stage directories
    pub fn scan(dirs: &WorkDirs) -> io::Result<Self> {
        let mut inventory = Self::default();
        inventory.record(&list_stage_files(&dirs.raw, None)?, AssetStatus::Raw);
        inventory.record(
            &list_stage_files(&dirs.normalized, Some(CANONICAL_EXTENSION))?,
            AssetStatus::Normalized,
        );
        inventory.record(
            &list_stage_files(&dirs.trimmed, Some(CANONICAL_EXTENSION))?,
            AssetStatus::Trimmed,
        );
        Ok(inventory)
    }

    fn record(&mut self, files: &[PathBuf], status: AssetStatus) {
        for id in files.iter().filter_map(|path| asset_id(path)) {
            let entry = self.statuses.entry(id).or_insert(status);
            if status > *entry {
                *entry = status;
            }
        }
    }

    pub fn status(&self, id: &str) -> AssetStatus {
        self.statuses.get(id).copied().unwrap_or(AssetStatus::Absent)
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn counts(&self) -> InventoryCounts {
        let mut counts = InventoryCounts::default();
        for status in self.statuses.values() {
            match status {
                AssetStatus::Raw => counts.raw += 1,
                AssetStatus::Normalized => counts.normalized += 1,
                AssetStatus::Trimmed => counts.trimmed += 1,
                AssetStatus::Absent => {}
            }
        }
        counts
    }

    /// Identifiers in ascending order with their status
    pub fn iter(&self) -> impl Iterator<Item = (&str, AssetStatus)> {
        self.statuses.iter().map(|(id, status)| (id.as_str(), *status))
    }
}
