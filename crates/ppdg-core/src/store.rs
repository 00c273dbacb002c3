//! The JSON-backed descriptor cache.
//!
//! One `descriptors.json` per working directory, mapping
//! `protocol → descriptor_name → model_index → value`. Model indices are
//! decimal strings. The file is written with sorted keys and 4-space
//! indentation, and rewritten only when its content actually changed.
//!
//! The orchestrator works on the transposed `model_index → descriptor_name`
//! layout; [`switch_format`] converts between the two.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the descriptor cache inside a working directory.
pub const STORE_FILE: &str = "descriptors.json";

/// One level of scalar descriptors, `name → value` (or `index → value`).
pub type DescriptorMap = BTreeMap<String, f64>;

/// Two nested levels, either `index → name → value` or `name → index → value`.
pub type NestedMap = BTreeMap<String, DescriptorMap>;

/// The whole cache, `protocol → name → index → value` on disk.
pub type StoreMap = BTreeMap<String, NestedMap>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read descriptor store '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse descriptor store '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write descriptor store '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Transposes the outer and inner keys of a two-level map.
///
/// Converts the "by model" layout into "by descriptor" and vice versa.
/// Applying it twice returns the input, as long as no inner map is empty
/// (entries with empty inner maps have nothing to transpose and are dropped).
pub fn switch_format(nested: &NestedMap) -> NestedMap {
    let mut out = NestedMap::new();
    for (outer, inner) in nested {
        for (key, value) in inner {
            out.entry(key.clone())
                .or_default()
                .insert(outer.clone(), *value);
        }
    }
    out
}

/// Path of the cache file inside `wrkdir`.
pub fn store_path(wrkdir: &Path) -> PathBuf {
    wrkdir.join(STORE_FILE)
}

/// Loads the cache from `wrkdir`, or `None` when no cache file exists yet.
pub fn load(wrkdir: &Path) -> Result<Option<StoreMap>, StoreError> {
    let path = store_path(wrkdir);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Read {
        path: path.clone(),
        source,
    })?;
    let store = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok(Some(store))
}

/// Writes the cache to `wrkdir` with sorted keys and 4-space indentation.
pub fn save(wrkdir: &Path, store: &StoreMap) -> Result<(), StoreError> {
    let path = store_path(wrkdir);
    let write_err = |source| StoreError::Write {
        path: path.clone(),
        source,
    };

    let file = File::create(&path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    store.serialize(&mut ser).map_err(|source| StoreError::Write {
        path: path.clone(),
        source: std::io::Error::other(source),
    })?;
    Ok(())
}
