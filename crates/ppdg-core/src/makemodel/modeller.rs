//! Homology model construction via the external Modeller driver.

use super::{ModelError, run_logged};
use crate::store::DescriptorMap;
use crate::types::Protocol;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Builds `model.pdb` in `wrkdir` from a template structure and the complex
/// sequence (chains separated by `/`).
///
/// If `model.pdb` already exists the build is skipped and only the scores of
/// the previous run are returned. Scores (`molpdf`, `DOPE`, `GA341`) come from
/// the model summary in `modeller.out`; a log without a summary yields an
/// empty map.
pub fn build_model(
    wrkdir: &Path,
    protocol: &Protocol,
    template: &Path,
    sequence: &str,
) -> Result<DescriptorMap, ModelError> {
    fs::create_dir_all(wrkdir)?;
    let model = wrkdir.join("model.pdb");
    let log = wrkdir.join("modeller.out");

    if model.is_file() {
        debug!("Model {} already present, recycling", model.display());
        return Ok(parse_model_scores(&log));
    }

    info!(
        "Building model in {} with protocol {}",
        wrkdir.display(),
        protocol
    );
    fs::copy(template, wrkdir.join("template.pdb"))?;
    fs::write(wrkdir.join("sequence.seq"), format!("{sequence}\n"))?;

    let mut cmd = Command::new("modeller");
    cmd.current_dir(wrkdir).args([
        "--mode",
        protocol.as_str(),
        "--template",
        "template.pdb",
        "--sequence",
        "sequence.seq",
        "--output",
        "model.pdb",
    ]);
    run_logged(cmd, &log, "modeller")?;

    if !model.is_file() {
        return Err(ModelError::MissingOutput {
            program: "modeller".to_string(),
            path: model,
        });
    }
    Ok(parse_model_scores(&log))
}

/// Extracts the model summary table from a Modeller log.
///
/// The summary is a header line naming `molpdf` and `DOPE` followed by one
/// row per model; only the first row is used.
fn parse_model_scores(log: &Path) -> DescriptorMap {
    let mut scores = DescriptorMap::new();
    let Ok(content) = fs::read_to_string(log) else {
        return scores;
    };
    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        if !(line.contains("molpdf") && line.contains("DOPE")) {
            continue;
        }
        let is_row = |l: &&str| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('-')
        };
        if let Some(row) = lines.find(is_row) {
            let fields: Vec<&str> = row.split_whitespace().collect();
            if fields.len() >= 3 {
                if let Ok(v) = fields[1].parse() {
                    scores.insert("molpdf".to_string(), v);
                }
                if let Ok(v) = fields[2].parse() {
                    scores.insert("DOPE".to_string(), v);
                }
                if let Some(Ok(v)) = fields.get(3).map(|f| f.parse()) {
                    scores.insert("GA341".to_string(), v);
                }
            }
        }
        break;
    }
    scores
}
