//! Molecular descriptor groups, delegated to the helper tools.
//!
//! Each helper reads the prepared complex/receptor/ligand files in a model
//! directory and prints one `NAME VALUE` line per descriptor of its group.

use super::{
    CONTACT_DESCRIPTORS, HBOND_DESCRIPTORS, SASA_DESCRIPTORS, STICKINESS_DESCRIPTORS,
    ScoringError, run_descriptor_tool,
};
use crate::config::Settings;
use crate::store::DescriptorMap;
use std::path::Path;

/// Hydrogen bonds lost on binding, under three acceptance criteria
/// (Baker-Hubbard, Wernet-Nilsson, Kabsch-Sander).
pub fn hydrogen_bond_difference(
    settings: &Settings,
    wrkdir: &Path,
) -> Result<DescriptorMap, ScoringError> {
    run_descriptor_tool(settings, wrkdir, "hbonds", HBOND_DESCRIPTORS)
}

/// The SASA family: buried surface area (total, charged, apolar, polar),
/// non-interacting surface fractions, and interface residue count.
pub fn sasa_all(settings: &Settings, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
    run_descriptor_tool(settings, wrkdir, "sasa", SASA_DESCRIPTORS)
}

/// Interface stickiness, total and averaged per interface residue.
pub fn stickiness(settings: &Settings, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
    run_descriptor_tool(settings, wrkdir, "stickiness", STICKINESS_DESCRIPTORS)
}

/// Intermolecular contact counts, total and by residue-class pair.
pub fn intermolecular_contacts(
    settings: &Settings,
    wrkdir: &Path,
) -> Result<DescriptorMap, ScoringError> {
    run_descriptor_tool(settings, wrkdir, "contacts", CONTACT_DESCRIPTORS)
}
