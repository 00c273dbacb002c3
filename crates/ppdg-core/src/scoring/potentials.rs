//! Statistical potential descriptors from the RF-Score suite.

use super::{ScoringError, run_descriptor_tool};
use crate::config::Settings;
use crate::store::DescriptorMap;
use std::path::Path;

/// RF_HA_SRS: all-heavy-atom short-range statistical potential, scored as
/// complex minus free receptor and ligand.
pub fn rf_ha_srs(settings: &Settings, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
    run_descriptor_tool(settings, wrkdir, "rf_ha_srs", &["RF_HA_SRS"])
}

/// RF_CB_SRS_OD: C-beta short-range potential with orientation dependence.
pub fn rf_cb_srs_od(settings: &Settings, wrkdir: &Path) -> Result<DescriptorMap, ScoringError> {
    run_descriptor_tool(settings, wrkdir, "rf_cb_srs_od", &["RF_CB_SRS_OD"])
}
