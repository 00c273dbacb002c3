//! Process-wide settings, read once from an INI file and passed explicitly.
//!
//! The file format is INI with a single `[ppdg]` section holding six string
//! keys, all of them paths. Keys absent from the file fall back to their
//! defaults; the working directory defaults to `<cwd>/models`.

use ini::Ini;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The INI section every setting lives under.
const SECTION: &str = "ppdg";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Settings file '{path}' has no [ppdg] section", path = path.display())]
    MissingSection { path: PathBuf },
}

/// Paths to the external tools and the working directory.
///
/// There is deliberately no global mutable state: a `Settings` value is built
/// once (from a file or from defaults) and handed by reference to every
/// operation that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root directory for per-complex model directories.
    pub wrkdir: PathBuf,
    /// Directory holding the RF-Score / descriptor helper tools.
    pub rfspp: PathBuf,
    /// Directory holding the CHARMM executable.
    pub charmm: PathBuf,
    /// Directory holding the force-field files and CHARMM input decks.
    pub ffpath: PathBuf,
    /// Rosetta installation root.
    pub rosetta: PathBuf,
    /// Rosetta binary directory.
    pub rosettabin: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let wrkdir = std::env::current_dir()
            .map(|d| d.join("models"))
            .unwrap_or_else(|_| PathBuf::from("models"));
        Self {
            wrkdir,
            rfspp: PathBuf::new(),
            charmm: PathBuf::new(),
            ffpath: PathBuf::new(),
            rosetta: PathBuf::new(),
            rosettabin: PathBuf::new(),
        }
    }
}

impl Settings {
    /// Loads settings from an INI file with a `[ppdg]` section.
    ///
    /// Keys missing from the section keep their default values; a missing
    /// section (or unreadable file) is an error.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let ini = Ini::load_from_file(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let section = ini
            .section(Some(SECTION))
            .ok_or_else(|| SettingsError::MissingSection {
                path: path.to_path_buf(),
            })?;

        let defaults = Self::default();
        let get = |key: &str, default: PathBuf| -> PathBuf {
            section.get(key).map(PathBuf::from).unwrap_or(default)
        };

        Ok(Self {
            wrkdir: get("WRKDIR", defaults.wrkdir),
            rfspp: get("RFSPP", defaults.rfspp),
            charmm: get("CHARMM", defaults.charmm),
            ffpath: get("FFPATH", defaults.ffpath),
            rosetta: get("ROSETTA", defaults.rosetta),
            rosettabin: get("ROSETTABIN", defaults.rosettabin),
        })
    }

    /// Returns the settings as `(key, value)` pairs, in file order.
    pub fn entries(&self) -> [(&'static str, &Path); 6] {
        [
            ("WRKDIR", self.wrkdir.as_path()),
            ("RFSPP", self.rfspp.as_path()),
            ("CHARMM", self.charmm.as_path()),
            ("FFPATH", self.ffpath.as_path()),
            ("ROSETTA", self.rosetta.as_path()),
            ("ROSETTABIN", self.rosettabin.as_path()),
        ]
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.entries() {
            writeln!(f, "{:<10} = {}", key, value.display())?;
        }
        Ok(())
    }
}
