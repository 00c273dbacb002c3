//! The descriptor catalog and the group dispatch.
//!
//! Descriptors are computed in groups (one external helper per group); the
//! dispatch runs only the groups whose output intersects the unmet demand and
//! verifies afterwards that every demanded descriptor was actually produced.
//! The group computations themselves sit behind the [`Scorer`] trait so the
//! dispatch logic can be exercised without the external tools.

pub mod molecular;
pub mod potentials;

use crate::config::Settings;
use crate::store::DescriptorMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, info};

/// Hydrogen-bond counts under three acceptance criteria.
pub const HBOND_DESCRIPTORS: &[&str] = &["HB_BH", "HB_WN", "HB_KS"];
/// Buried/interface surface areas and non-interacting surface fractions.
pub const SASA_DESCRIPTORS: &[&str] = &[
    "BSA", "BSA_C", "BSA_A", "BSA_P", "NIS_P", "NIS_C", "NIS_A", "NRES",
];
/// Interface stickiness, total and per-residue.
pub const STICKINESS_DESCRIPTORS: &[&str] = &["sticky_tot", "sticky_avg"];
/// Intermolecular contact counts by residue-class pair.
pub const CONTACT_DESCRIPTORS: &[&str] = &[
    "IC_TOT", "IC_AA", "IC_PP", "IC_CC", "IC_AP", "IC_CP", "IC_AC",
];

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Unknown descriptors {missing:?}. Available descriptors are: {available:?}")]
    UnknownDescriptors {
        missing: Vec<String>,
        available: Vec<&'static str>,
    },

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({status}) in '{wrkdir}': {stderr}", wrkdir = wrkdir.display())]
    ToolFailed {
        program: String,
        status: ExitStatus,
        wrkdir: std::path::PathBuf,
        stderr: String,
    },

    #[error("Could not parse output of {program}: {line:?}")]
    BadOutput { program: String, line: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Every descriptor this pipeline knows how to compute, in catalog order.
pub fn all_descriptors() -> Vec<&'static str> {
    let mut desc = Vec::new();
    desc.extend_from_slice(HBOND_DESCRIPTORS);
    desc.extend_from_slice(SASA_DESCRIPTORS);
    desc.extend_from_slice(STICKINESS_DESCRIPTORS);
    desc.extend_from_slice(CONTACT_DESCRIPTORS);
    desc.extend_from_slice(&["RF_HA_SRS", "RF_CB_SRS_OD"]);
    desc
}

/// One group computation per method; each returns `descriptor → value` for
/// its own group, computed from the files in a model directory.
pub trait Scorer: Sync {
    fn hydrogen_bonds(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError>;
    fn sasa(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError>;
    fn stickiness(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError>;
    fn contacts(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError>;
    fn rf_ha_srs(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError>;
    fn rf_cb_srs_od(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError>;
}

/// Computes the descriptors in `wanted` that are not already in `have`
/// (all of them under `force`), running only the groups that contribute.
///
/// Fails if, after dispatch, any demanded descriptor is still missing — that
/// means the name is not in the catalog at all.
pub fn evaluate(
    scorer: &dyn Scorer,
    wrkdir: &Path,
    wanted: &[String],
    have: &DescriptorMap,
    force: bool,
) -> Result<DescriptorMap, ScoringError> {
    let mut scores = have.clone();
    let unmet: BTreeSet<&str> = wanted
        .iter()
        .filter(|d| force || !scores.contains_key(*d))
        .map(String::as_str)
        .collect();
    if unmet.is_empty() {
        return Ok(scores);
    }
    info!("Computing new descriptors in {}", wrkdir.display());

    let needs = |group: &[&str]| group.iter().any(|d| unmet.contains(d));

    if needs(HBOND_DESCRIPTORS) {
        scores.extend(scorer.hydrogen_bonds(wrkdir)?);
    }
    if needs(SASA_DESCRIPTORS) {
        scores.extend(scorer.sasa(wrkdir)?);
    }
    if needs(STICKINESS_DESCRIPTORS) {
        scores.extend(scorer.stickiness(wrkdir)?);
    }
    if needs(CONTACT_DESCRIPTORS) {
        scores.extend(scorer.contacts(wrkdir)?);
    }
    if unmet.contains("RF_HA_SRS") {
        scores.extend(scorer.rf_ha_srs(wrkdir)?);
    }
    if unmet.contains("RF_CB_SRS_OD") {
        scores.extend(scorer.rf_cb_srs_od(wrkdir)?);
    }

    let missing: Vec<String> = unmet
        .into_iter()
        .filter(|d| !scores.contains_key(*d))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ScoringError::UnknownDescriptors {
            missing,
            available: all_descriptors(),
        });
    }
    Ok(scores)
}

/// The external-tool implementation of [`Scorer`], one helper binary per
/// group, resolved under the configured tool directory.
pub struct ExternalScorer<'a> {
    settings: &'a Settings,
}

impl<'a> ExternalScorer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

impl Scorer for ExternalScorer<'_> {
    fn hydrogen_bonds(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
        molecular::hydrogen_bond_difference(self.settings, wrkdir)
    }

    fn sasa(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
        molecular::sasa_all(self.settings, wrkdir)
    }

    fn stickiness(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
        molecular::stickiness(self.settings, wrkdir)
    }

    fn contacts(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
        molecular::intermolecular_contacts(self.settings, wrkdir)
    }

    fn rf_ha_srs(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
        potentials::rf_ha_srs(self.settings, wrkdir)
    }

    fn rf_cb_srs_od(&self, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
        potentials::rf_cb_srs_od(self.settings, wrkdir)
    }
}

/// Runs one helper from the tool directory against a model directory and
/// parses its `NAME VALUE` stdout lines, keeping the names in `group`.
pub(crate) fn run_descriptor_tool(
    settings: &Settings,
    wrkdir: &Path,
    tool: &str,
    group: &[&str],
) -> Result<DescriptorMap, ScoringError> {
    let program = settings.rfspp.join(tool);
    debug!("Running {} on {}", program.display(), wrkdir.display());

    let output = Command::new(&program)
        .arg(wrkdir)
        .output()
        .map_err(|source| ScoringError::Spawn {
            program: tool.to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(ScoringError::ToolFailed {
            program: tool.to_string(),
            status: output.status,
            wrkdir: wrkdir.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut scores = DescriptorMap::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        if !group.contains(&name) {
            continue;
        }
        let value: f64 = value.parse().map_err(|_| ScoringError::BadOutput {
            program: tool.to_string(),
            line: line.to_string(),
        })?;
        scores.insert(name.to_string(), value);
    }
    Ok(scores)
}
