//! Wrappers around the external model construction and preparation tools.
//!
//! Every step recycles existing outputs: if the file a tool would produce is
//! already on disk, the invocation is skipped. Failures are immediate, with
//! the tool name and the path of its captured log in the error.

mod charmm;
mod modeller;

pub use charmm::{charmify, split_complex};
pub use modeller::build_model;

use crate::store::DescriptorMap;
use crate::types::{ChainCounts, Protocol};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error during model construction: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({status}); see log at '{log}'", log = log.display())]
    ToolFailed {
        program: String,
        status: ExitStatus,
        log: PathBuf,
    },

    #[error("{program} finished without producing '{path}'", path = path.display())]
    MissingOutput { program: String, path: PathBuf },

    #[error("No chain identifiers found in '{path}'", path = path.display())]
    NoChains { path: PathBuf },

    #[error(
        "Expected {expected} chains in '{path}' but found {found}",
        path = path.display()
    )]
    ChainCountMismatch {
        expected: usize,
        found: usize,
        path: PathBuf,
    },

    #[error("Cannot derive a CHARMM base name from '{path}'", path = path.display())]
    BadPath { path: PathBuf },
}

/// The three external steps of building one scored model directory.
///
/// The production implementation shells out to Modeller and CHARMM; tests
/// substitute a mock so the orchestration can run without the tools.
pub trait ModelPipeline: Sync {
    /// Builds `model.pdb` in `wrkdir` from the template and sequence,
    /// returning any scores the builder reports.
    fn build_model(
        &self,
        wrkdir: &Path,
        protocol: &Protocol,
        template: &Path,
        sequence: &str,
    ) -> Result<DescriptorMap, ModelError>;

    /// Prepares and minimizes the built model (`nsteps` minimization steps).
    fn prepare_model(&self, wrkdir: &Path, nsteps: u32) -> Result<(), ModelError>;

    /// Splits the prepared complex into receptor and ligand halves.
    fn split_complex(&self, wrkdir: &Path, nchains: ChainCounts) -> Result<(), ModelError>;
}

/// The external-tool implementation of [`ModelPipeline`].
pub struct ExternalTools<'a> {
    settings: &'a crate::config::Settings,
}

impl<'a> ExternalTools<'a> {
    pub fn new(settings: &'a crate::config::Settings) -> Self {
        Self { settings }
    }
}

impl ModelPipeline for ExternalTools<'_> {
    fn build_model(
        &self,
        wrkdir: &Path,
        protocol: &Protocol,
        template: &Path,
        sequence: &str,
    ) -> Result<DescriptorMap, ModelError> {
        modeller::build_model(wrkdir, protocol, template, sequence)
    }

    fn prepare_model(&self, wrkdir: &Path, nsteps: u32) -> Result<(), ModelError> {
        charmm::charmify(self.settings, &wrkdir.join("model.pdb"), nsteps)
    }

    fn split_complex(&self, wrkdir: &Path, nchains: ChainCounts) -> Result<(), ModelError> {
        charmm::split_complex(self.settings, wrkdir, nchains)
    }
}

/// Runs a command with stdout and stderr redirected into `log`.
pub(crate) fn run_logged(mut cmd: Command, log: &Path, program: &str) -> Result<(), ModelError> {
    let stdout = File::create(log)?;
    let stderr = stdout.try_clone()?;
    let status = cmd
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .status()
        .map_err(|source| ModelError::Spawn {
            program: program.to_string(),
            source,
        })?;
    if !status.success() {
        return Err(ModelError::ToolFailed {
            program: program.to_string(),
            status,
            log: log.to_path_buf(),
        });
    }
    Ok(())
}
