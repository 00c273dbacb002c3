//! CHARMM preparation, minimization, and receptor/ligand splitting.
//!
//! Chain handling here is strictly line-level bookkeeping: ATOM/HETATM
//! records are partitioned by the chain-identifier column so each chain can
//! be handed to CHARMM as its own file. Nothing else about the PDB format is
//! interpreted.

use super::{ModelError, run_logged};
use crate::config::Settings;
use crate::types::ChainCounts;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Column of the chain identifier in ATOM/HETATM records.
const CHAIN_COLUMN: usize = 21;

/// Prepares a PDB file with CHARMM, producing `<stem>-chm.{psf,pdb,cor}`.
///
/// Skipped when `<stem>-chm.psf` already exists. The input is split into one
/// file per chain (`chain_<id>.pdb`), the CHARMM input deck and disulfide
/// stream are staged from the force-field directory, and CHARMM runs with its
/// output captured in `<stem>-chm.out`.
pub fn charmify(settings: &Settings, pdb: &Path, nsteps: u32) -> Result<(), ModelError> {
    let wrkdir = pdb.parent().filter(|p| !p.as_os_str().is_empty());
    let wrkdir = wrkdir.unwrap_or_else(|| Path::new("."));
    let stem = pdb
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ModelError::BadPath {
            path: pdb.to_path_buf(),
        })?;
    let basename = format!("{stem}-chm");

    if wrkdir.join(format!("{basename}.psf")).is_file() {
        debug!("CHARMM outputs for {} already present, recycling", stem);
        return Ok(());
    }
    info!("Preparing {} with CHARMM ({} steps)", pdb.display(), nsteps);

    let chains = split_by_chain(pdb)?;
    for (id, lines) in &chains {
        let mut content = lines.join("\n");
        content.push_str("\nEND\n");
        fs::write(
            wrkdir.join(format!("chain_{}.pdb", id.to_ascii_lowercase())),
            content,
        )?;
    }

    stage(&settings.ffpath, wrkdir, "buildgen.inp")?;
    stage(&settings.ffpath, wrkdir, "disu.str")?;

    let mut cmd = Command::new(settings.charmm.join("charmm"));
    cmd.current_dir(wrkdir).arg(format!("nc={}", chains.len()));
    for (i, (id, _)) in chains.iter().enumerate() {
        cmd.arg(format!("c{}={}", i + 1, id));
    }
    cmd.arg("name=chain_")
        .arg(format!("out={basename}"))
        .arg(format!("nsteps={nsteps}"))
        .arg(format!("ffpath={}", settings.ffpath.display()))
        .arg("-i")
        .arg("buildgen.inp");

    run_logged(cmd, &wrkdir.join(format!("{basename}.out")), "charmm")
}

/// Splits the prepared complex into receptor and ligand halves and generates
/// their PSFs.
///
/// The first `nchains.receptor` chains of `model-chm.pdb` form the receptor,
/// the rest the ligand. Skipped when both PSFs already exist.
pub fn split_complex(
    settings: &Settings,
    wrkdir: &Path,
    nchains: ChainCounts,
) -> Result<(), ModelError> {
    if wrkdir.join("receptor-chm.psf").is_file() && wrkdir.join("ligand-chm.psf").is_file() {
        debug!("Receptor and ligand already split in {}", wrkdir.display());
        return Ok(());
    }
    info!("Splitting complex in {} into {}", wrkdir.display(), nchains);

    let complex = wrkdir.join("model-chm.pdb");
    let chains = split_by_chain(&complex)?;
    if chains.len() != nchains.total() {
        return Err(ModelError::ChainCountMismatch {
            expected: nchains.total(),
            found: chains.len(),
            path: complex,
        });
    }

    let (receptor, ligand) = chains.split_at(nchains.receptor);
    write_half(wrkdir, "receptor.pdb", receptor)?;
    write_half(wrkdir, "ligand.pdb", ligand)?;

    // PSF generation only, no minimization of the halves.
    charmify(settings, &wrkdir.join("receptor.pdb"), 0)?;
    charmify(settings, &wrkdir.join("ligand.pdb"), 0)?;
    Ok(())
}

fn write_half(wrkdir: &Path, name: &str, chains: &[(char, Vec<String>)]) -> Result<(), ModelError> {
    let mut content = String::new();
    for (_, lines) in chains {
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
    }
    content.push_str("END\n");
    fs::write(wrkdir.join(name), content)?;
    Ok(())
}

/// Partitions ATOM/HETATM records by chain identifier, preserving the order
/// in which chains first appear.
pub(crate) fn split_by_chain(pdb: &Path) -> Result<Vec<(char, Vec<String>)>, ModelError> {
    let content = fs::read_to_string(pdb)?;
    let mut chains: Vec<(char, Vec<String>)> = Vec::new();

    for line in content.lines() {
        if !(line.starts_with("ATOM") || line.starts_with("HETATM")) {
            continue;
        }
        let Some(id) = line.chars().nth(CHAIN_COLUMN) else {
            continue;
        };
        match chains.iter_mut().find(|(c, _)| *c == id) {
            Some((_, lines)) => lines.push(line.to_string()),
            None => chains.push((id, vec![line.to_string()])),
        }
    }

    if chains.is_empty() {
        return Err(ModelError::NoChains {
            path: pdb.to_path_buf(),
        });
    }
    Ok(chains)
}

fn stage(ffpath: &Path, wrkdir: &Path, name: &str) -> Result<(), ModelError> {
    let dst = wrkdir.join(name);
    if dst.is_file() {
        return Ok(());
    }
    fs::copy(ffpath.join(name), &dst)?;
    Ok(())
}
