//! Small domain types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The one protocol with a reduced minimization step count.
pub const FAST_PROTOCOL: &str = "modeller_veryfast";

/// A named modelling procedure.
///
/// The protocol decides the minimization step count and the per-model
/// directory layout; everything else about it is interpreted by the external
/// tools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Protocol(String);

impl Protocol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CHARMM minimization steps: 10 for the fast protocol, 100 otherwise.
    pub fn minimization_steps(&self) -> u32 {
        if self.0 == FAST_PROTOCOL { 10 } else { 100 }
    }

    /// Directory of one model instance, `<wrkdir>/<protocol>_<index>`.
    pub fn model_dir(&self, wrkdir: &Path, index: usize) -> PathBuf {
        wrkdir.join(format!("{}_{}", self.0, index))
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Protocol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// How the chains of the complex split into receptor and ligand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainCounts {
    pub receptor: usize,
    pub ligand: usize,
}

impl ChainCounts {
    pub fn new(receptor: usize, ligand: usize) -> Self {
        Self { receptor, ligand }
    }

    pub fn total(&self) -> usize {
        self.receptor + self.ligand
    }
}

impl fmt::Display for ChainCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.receptor, self.ligand)
    }
}
