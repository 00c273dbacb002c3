//! Removal of regenerable intermediates from a working tree.

use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Files a finished model directory no longer needs; all of them can be
/// regenerated from `model.pdb` and the configuration.
pub const INTERMEDIATE_FILES: &[&str] = &[
    "complex_seq.D00000000",
    "complex_seq.ini",
    "complex_seq.rsr",
    "complex_seq.sch",
    "complex_seq.V99990000",
    "family.mat",
    "modeller.out",
    "add_disulfide.str",
    "buildgen.inp",
    "disu.str",
    "model-chm.err",
    "model-chm.out",
    "extract.inp",
    "ligand-chm.err",
    "ligand-chm.out",
    "receptor-chm.err",
    "receptor-chm.out",
    "ligand-chm-facts.pdb",
    "ligand-chm-gbsw.pdb",
    "ligand-chm-gbmv.pdb",
    "receptor-chm-facts.pdb",
    "receptor-chm-gbsw.pdb",
    "receptor-chm-gbmv.pdb",
    "complex-chm-facts.pdb",
    "complex-chm-gbsw.pdb",
    "complex-chm-gbmv.pdb",
];

/// Walks two directory levels under `wrkdir` — one directory per complex,
/// holding one directory per model — and deletes the known intermediates
/// inside the model directories. Returns how many files were removed.
pub fn clean(wrkdir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(wrkdir)? {
        let complex_dir = entry?.path();
        if !complex_dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&complex_dir)? {
            let model_dir = entry?.path();
            if model_dir.is_dir() {
                removed += clean_dir(&model_dir)?;
            }
        }
    }
    info!("Removed {removed} intermediate files under {}", wrkdir.display());
    Ok(removed)
}

fn clean_dir(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for name in INTERMEDIATE_FILES {
        let path = dir.join(name);
        if path.is_file() {
            debug!("Removing {}", path.display());
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_intermediates_inside_model_directories() {
        let dir = tempfile::tempdir().unwrap();
        let complex = dir.path().join("1abc");
        let model = complex.join("modeller_fast_0");
        fs::create_dir_all(&model).unwrap();

        fs::write(model.join("modeller.out"), "x").unwrap();
        fs::write(model.join("buildgen.inp"), "x").unwrap();
        fs::write(model.join("model.pdb"), "ATOM").unwrap();
        fs::write(complex.join("descriptors.json"), "{}").unwrap();

        let removed = clean(dir.path()).unwrap();
        assert_eq!(removed, 2);
        assert!(model.join("model.pdb").is_file());
        assert!(complex.join("descriptors.json").is_file());
        assert!(!model.join("modeller.out").exists());
        assert!(!model.join("buildgen.inp").exists());
    }

    #[test]
    fn leaves_shallower_levels_alone() {
        let dir = tempfile::tempdir().unwrap();
        let complex = dir.path().join("1abc");
        fs::create_dir(&complex).unwrap();

        // Intermediates above the model level are out of reach.
        fs::write(dir.path().join("family.mat"), "x").unwrap();
        fs::write(complex.join("modeller.out"), "x").unwrap();

        assert_eq!(clean(dir.path()).unwrap(), 0);
        assert!(dir.path().join("family.mat").is_file());
        assert!(complex.join("modeller.out").is_file());
    }

    #[test]
    fn removes_implicit_solvent_variants() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("1abc").join("modeller_fast_0");
        fs::create_dir_all(&model).unwrap();

        for name in [
            "ligand-chm-facts.pdb",
            "receptor-chm-gbsw.pdb",
            "complex-chm-gbmv.pdb",
        ] {
            fs::write(model.join(name), "x").unwrap();
        }
        // The prepared structures themselves stay.
        fs::write(model.join("ligand-chm.pdb"), "ATOM").unwrap();

        assert_eq!(clean(dir.path()).unwrap(), 3);
        assert!(model.join("ligand-chm.pdb").is_file());
    }

    #[test]
    fn empty_tree_removes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(clean(dir.path()).unwrap(), 0);
    }
}
