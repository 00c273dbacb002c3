//! Descriptor orchestration: the wanted-vs-have diff, the parallel fan-out
//! over model indices, the cache merge, and the per-model aggregation.

use crate::makemodel::{ModelError, ModelPipeline};
use crate::progress::{Progress, ProgressReporter};
use crate::scoring::{self, Scorer, ScoringError};
use crate::store::{self, DescriptorMap, NestedMap, StoreError, StoreMap};
use crate::types::{ChainCounts, Protocol};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("You need at least one model, you asked for {0}")]
    NoModels(usize),

    #[error("Template file '{path}' does not exist", path = path.display())]
    MissingTemplate { path: PathBuf },

    #[error(
        "You said the receptor has {receptor} chains and the ligand {ligand}, \
         but the sequence has a total of {total} chains"
    )]
    ChainMismatch {
        receptor: usize,
        ligand: usize,
        total: usize,
    },

    #[error(
        "Missing {file} in '{wrkdir}'; run the descriptor computation first",
        file = store::STORE_FILE,
        wrkdir = wrkdir.display()
    )]
    MissingStore { wrkdir: PathBuf },

    #[error(
        "Could not find protocol '{protocol}' in '{wrkdir}'; run the descriptor computation first",
        wrkdir = wrkdir.display()
    )]
    MissingProtocol { protocol: Protocol, wrkdir: PathBuf },

    #[error("Descriptor '{name}' has never been computed for protocol '{protocol}'")]
    MissingDescriptor { name: String, protocol: Protocol },

    #[error("Model {index} is missing descriptor '{name}'")]
    IncompleteModel { index: usize, name: String },

    #[error("Failed to build worker pool: {0}")]
    Pool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Everything one descriptor computation needs.
#[derive(Debug, Clone)]
pub struct DescriptorRequest {
    /// Working directory of this complex; holds `descriptors.json` and one
    /// subdirectory per model.
    pub wrkdir: PathBuf,
    pub protocol: Protocol,
    /// Template structure for the homology modelling.
    pub template: PathBuf,
    /// Complex sequence, chains separated by `/`.
    pub sequence: String,
    pub nchains: ChainCounts,
    /// Descriptor names to compute.
    pub wanted: Vec<String>,
    /// How many models to build (for stable averages).
    pub nmodels: usize,
    /// Worker threads; below 2 the models are computed sequentially.
    pub ncores: usize,
    /// Recompute wanted descriptors even when cached.
    pub force: bool,
}

struct WorkItem {
    index: usize,
    model_dir: PathBuf,
    have: DescriptorMap,
}

/// Builds the requested models and computes the missing descriptors,
/// recycling everything already present in the cache.
///
/// Returns the merged cache content for all protocols; the cache file is
/// rewritten only when this run changed it.
#[instrument(skip_all, name = "descriptor_workflow", fields(protocol = %request.protocol))]
pub fn get_descriptors(
    pipeline: &dyn ModelPipeline,
    scorer: &dyn Scorer,
    request: &DescriptorRequest,
    reporter: &ProgressReporter,
) -> Result<StoreMap, DescriptorError> {
    validate(request)?;

    let mut alldesc = store::load(&request.wrkdir)?.unwrap_or_default();
    if alldesc.contains_key(request.protocol.as_str()) {
        info!(
            "Read cached descriptors from {}",
            store::store_path(&request.wrkdir).display()
        );
    }
    let desc = alldesc
        .get(request.protocol.as_str())
        .cloned()
        .unwrap_or_default();
    let mut by_model = store::switch_format(&desc);

    let items: Vec<WorkItem> = (0..request.nmodels)
        .map(|index| WorkItem {
            index,
            model_dir: request.protocol.model_dir(&request.wrkdir, index),
            have: by_model.get(&index.to_string()).cloned().unwrap_or_default(),
        })
        .collect();

    reporter.report(Progress::TaskStart {
        total_steps: request.nmodels as u64,
    });
    let results = run_batch(pipeline, scorer, request, &items, reporter)?;

    for (index, scores) in results {
        by_model.insert(index.to_string(), scores);
    }
    reporter.report(Progress::TaskFinish);

    let merged = store::switch_format(&by_model);
    if merged != desc {
        let path = store::store_path(&request.wrkdir);
        info!("Writing descriptors to {}", path.display());
        alldesc.insert(request.protocol.to_string(), merged);
        store::save(&request.wrkdir, &alldesc)?;
        reporter.report(Progress::Message(format!("Updated {}", path.display())));
    }
    Ok(alldesc)
}

fn validate(request: &DescriptorRequest) -> Result<(), DescriptorError> {
    if request.nmodels < 1 {
        return Err(DescriptorError::NoModels(request.nmodels));
    }
    if !request.template.is_file() {
        return Err(DescriptorError::MissingTemplate {
            path: request.template.clone(),
        });
    }
    let total = request.sequence.split('/').count();
    if request.nchains.total() != total {
        return Err(DescriptorError::ChainMismatch {
            receptor: request.nchains.receptor,
            ligand: request.nchains.ligand,
            total,
        });
    }
    Ok(())
}

fn run_batch(
    pipeline: &dyn ModelPipeline,
    scorer: &dyn Scorer,
    request: &DescriptorRequest,
    items: &[WorkItem],
    reporter: &ProgressReporter,
) -> Result<Vec<(usize, DescriptorMap)>, DescriptorError> {
    if request.ncores < 2 {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(compute_model(pipeline, scorer, request, item)?);
            reporter.report(Progress::TaskIncrement);
        }
        return Ok(results);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(request.ncores)
        .build()
        .map_err(|e| DescriptorError::Pool(e.to_string()))?;
    pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let result = compute_model(pipeline, scorer, request, item);
                if result.is_ok() {
                    reporter.report(Progress::TaskIncrement);
                }
                result
            })
            .collect()
    })
}

/// Builds and scores one model, or returns its cached descriptors untouched
/// when nothing in `wanted` is missing.
fn compute_model(
    pipeline: &dyn ModelPipeline,
    scorer: &dyn Scorer,
    request: &DescriptorRequest,
    item: &WorkItem,
) -> Result<(usize, DescriptorMap), DescriptorError> {
    let unmet = request
        .wanted
        .iter()
        .filter(|d| request.force || !item.have.contains_key(*d))
        .count();
    if unmet == 0 {
        debug!("Model {} already has all wanted descriptors", item.index);
        return Ok((item.index, item.have.clone()));
    }

    let mut scores = pipeline.build_model(
        &item.model_dir,
        &request.protocol,
        &request.template,
        &request.sequence,
    )?;

    let nchfile = item.model_dir.join("nchains.dat");
    if !nchfile.is_file() {
        fs::write(&nchfile, request.nchains.to_string())?;
    }

    pipeline.prepare_model(&item.model_dir, request.protocol.minimization_steps())?;
    pipeline.split_complex(&item.model_dir, request.nchains)?;

    let scored = scoring::evaluate(
        scorer,
        &item.model_dir,
        &request.wanted,
        &item.have,
        request.force,
    )?;
    scores.extend(scored);
    Ok((item.index, scores))
}

/// Mean (or median), population standard deviation, and standard error of a
/// descriptor over the models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub avg: f64,
    pub std: f64,
    pub err: f64,
}

/// Aggregates already-computed descriptors over the first `nmodels` models
/// (or all of them when no count is given).
///
/// The cache file and the protocol must already exist; every requested model
/// index must have every requested descriptor.
pub fn get_descriptors_average(
    wrkdir: &Path,
    protocol: &Protocol,
    desc_list: &[String],
    nmodels: Option<usize>,
    median: bool,
) -> Result<Vec<(String, Aggregate)>, DescriptorError> {
    let alldesc = store::load(wrkdir)?.ok_or_else(|| DescriptorError::MissingStore {
        wrkdir: wrkdir.to_path_buf(),
    })?;
    info!(
        "Reading descriptors from {}",
        store::store_path(wrkdir).display()
    );
    let by_desc: &NestedMap =
        alldesc
            .get(protocol.as_str())
            .ok_or_else(|| DescriptorError::MissingProtocol {
                protocol: protocol.clone(),
                wrkdir: wrkdir.to_path_buf(),
            })?;

    let names: Vec<String> = if desc_list.is_empty() {
        scoring::all_descriptors()
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        desc_list.to_vec()
    };

    let mut scores = Vec::with_capacity(names.len());
    for name in names {
        let per_model = by_desc
            .get(&name)
            .ok_or_else(|| DescriptorError::MissingDescriptor {
                name: name.clone(),
                protocol: protocol.clone(),
            })?;

        let values: Vec<f64> = match nmodels {
            Some(n) => (0..n)
                .map(|index| {
                    per_model.get(&index.to_string()).copied().ok_or_else(|| {
                        DescriptorError::IncompleteModel {
                            index,
                            name: name.clone(),
                        }
                    })
                })
                .collect::<Result<_, _>>()?,
            None => per_model.values().copied().collect(),
        };

        let avg = if median { median_of(&values) } else { mean(&values) };
        let std = std_dev(&values);
        let err = std / (values.len() as f64).sqrt();
        scores.push((name, Aggregate { avg, std, err }));
    }
    Ok(scores)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Population standard deviation (no Bessel correction), matching the
/// aggregation the descriptors were trained with.
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{HBOND_DESCRIPTORS, SASA_DESCRIPTORS};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Creates directories but never runs a tool; counts invocations.
    #[derive(Default)]
    struct MockPipeline {
        built: AtomicUsize,
    }

    impl ModelPipeline for MockPipeline {
        fn build_model(
            &self,
            wrkdir: &Path,
            _protocol: &Protocol,
            _template: &Path,
            _sequence: &str,
        ) -> Result<DescriptorMap, ModelError> {
            self.built.fetch_add(1, Ordering::SeqCst);
            fs::create_dir_all(wrkdir).map_err(ModelError::from)?;
            Ok(DescriptorMap::new())
        }

        fn prepare_model(&self, _wrkdir: &Path, _nsteps: u32) -> Result<(), ModelError> {
            Ok(())
        }

        fn split_complex(&self, _wrkdir: &Path, _nchains: ChainCounts) -> Result<(), ModelError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockScorer {
        scored: AtomicUsize,
    }

    impl MockScorer {
        fn group(&self, members: &[&str], base: f64) -> DescriptorMap {
            self.scored.fetch_add(1, Ordering::SeqCst);
            members
                .iter()
                .enumerate()
                .map(|(i, d)| (d.to_string(), base + i as f64))
                .collect()
        }
    }

    impl Scorer for MockScorer {
        fn hydrogen_bonds(&self, _: &Path) -> Result<DescriptorMap, ScoringError> {
            Ok(self.group(HBOND_DESCRIPTORS, 10.0))
        }
        fn sasa(&self, _: &Path) -> Result<DescriptorMap, ScoringError> {
            Ok(self.group(SASA_DESCRIPTORS, 100.0))
        }
        fn stickiness(&self, _: &Path) -> Result<DescriptorMap, ScoringError> {
            Ok(self.group(crate::scoring::STICKINESS_DESCRIPTORS, 1.0))
        }
        fn contacts(&self, _: &Path) -> Result<DescriptorMap, ScoringError> {
            Ok(self.group(crate::scoring::CONTACT_DESCRIPTORS, 50.0))
        }
        fn rf_ha_srs(&self, _: &Path) -> Result<DescriptorMap, ScoringError> {
            Ok(self.group(&["RF_HA_SRS"], -7.0))
        }
        fn rf_cb_srs_od(&self, _: &Path) -> Result<DescriptorMap, ScoringError> {
            Ok(self.group(&["RF_CB_SRS_OD"], -3.0))
        }
    }

    fn request(wrkdir: &Path, template: &Path, ncores: usize) -> DescriptorRequest {
        DescriptorRequest {
            wrkdir: wrkdir.to_path_buf(),
            protocol: Protocol::from("modeller_fast"),
            template: template.to_path_buf(),
            sequence: "AAAA/CCCC".to_string(),
            nchains: ChainCounts::new(1, 1),
            wanted: vec!["HB_BH".to_string(), "BSA".to_string()],
            nmodels: 3,
            ncores,
            force: false,
        }
    }

    fn template_in(dir: &Path) -> PathBuf {
        let path = dir.join("template.pdb");
        fs::write(&path, "ATOM\nEND\n").unwrap();
        path
    }

    #[test]
    fn fresh_run_populates_every_model() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let pipeline = MockPipeline::default();
        let scorer = MockScorer::default();
        let req = request(dir.path(), &template, 1);

        let all = get_descriptors(&pipeline, &scorer, &req, &ProgressReporter::new()).unwrap();

        assert_eq!(pipeline.built.load(Ordering::SeqCst), 3);
        let by_desc = &all["modeller_fast"];
        for name in ["HB_BH", "BSA"] {
            for index in 0..3 {
                assert!(
                    by_desc[name].contains_key(&index.to_string()),
                    "missing {name} for model {index}"
                );
            }
        }
        assert!(store::store_path(dir.path()).is_file());
    }

    #[test]
    fn second_run_short_circuits_everything() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let req = request(dir.path(), &template, 1);

        let first = get_descriptors(
            &MockPipeline::default(),
            &MockScorer::default(),
            &req,
            &ProgressReporter::new(),
        )
        .unwrap();

        let pipeline = MockPipeline::default();
        let scorer = MockScorer::default();
        let second = get_descriptors(&pipeline, &scorer, &req, &ProgressReporter::new()).unwrap();

        assert_eq!(pipeline.built.load(Ordering::SeqCst), 0);
        assert_eq!(scorer.scored.load(Ordering::SeqCst), 0);
        assert_eq!(second, first);
    }

    #[test]
    fn force_recomputes_all_models() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let mut req = request(dir.path(), &template, 1);

        get_descriptors(
            &MockPipeline::default(),
            &MockScorer::default(),
            &req,
            &ProgressReporter::new(),
        )
        .unwrap();

        req.force = true;
        let pipeline = MockPipeline::default();
        get_descriptors(
            &pipeline,
            &MockScorer::default(),
            &req,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(pipeline.built.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn parallel_run_matches_sequential() {
        let dir_seq = tempfile::tempdir().unwrap();
        let dir_par = tempfile::tempdir().unwrap();
        let template_seq = template_in(dir_seq.path());
        let template_par = template_in(dir_par.path());

        let sequential = get_descriptors(
            &MockPipeline::default(),
            &MockScorer::default(),
            &request(dir_seq.path(), &template_seq, 1),
            &ProgressReporter::new(),
        )
        .unwrap();
        let parallel = get_descriptors(
            &MockPipeline::default(),
            &MockScorer::default(),
            &request(dir_par.path(), &template_par, 2),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn extends_an_existing_cache_with_new_descriptors_only() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let mut req = request(dir.path(), &template, 1);

        get_descriptors(
            &MockPipeline::default(),
            &MockScorer::default(),
            &req,
            &ProgressReporter::new(),
        )
        .unwrap();

        // Asking for an additional descriptor rebuilds the models but keeps
        // the cached values for the rest.
        req.wanted.push("RF_HA_SRS".to_string());
        let pipeline = MockPipeline::default();
        let scorer = MockScorer::default();
        let all = get_descriptors(&pipeline, &scorer, &req, &ProgressReporter::new()).unwrap();

        assert_eq!(pipeline.built.load(Ordering::SeqCst), 3);
        // Only the statistical-potential group ran, once per model.
        assert_eq!(scorer.scored.load(Ordering::SeqCst), 3);
        assert!(all["modeller_fast"].contains_key("RF_HA_SRS"));
        assert!(all["modeller_fast"].contains_key("HB_BH"));
    }

    #[test]
    fn progress_events_cover_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let req = request(dir.path(), &template, 1);

        let events = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(format!("{event:?}"));
        }));
        get_descriptors(
            &MockPipeline::default(),
            &MockScorer::default(),
            &req,
            &reporter,
        )
        .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events[0], "TaskStart { total_steps: 3 }");
        assert_eq!(events.iter().filter(|e| *e == "TaskIncrement").count(), 3);
        assert!(events.contains(&"TaskFinish".to_string()));
        // The cache was written, so the run announces the updated file.
        assert!(events.last().unwrap().starts_with("Message"));
    }

    #[test]
    fn zero_models_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let mut req = request(dir.path(), &template, 1);
        req.nmodels = 0;

        let err = get_descriptors(
            &MockPipeline::default(),
            &MockScorer::default(),
            &req,
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::NoModels(0)));
    }

    #[test]
    fn missing_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), Path::new("/nonexistent.pdb"), 1);
        req.template = PathBuf::from("/nonexistent.pdb");

        let err = get_descriptors(
            &MockPipeline::default(),
            &MockScorer::default(),
            &req,
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::MissingTemplate { .. }));
    }

    #[test]
    fn chain_mismatch_fails_before_any_model_is_built() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let mut req = request(dir.path(), &template, 1);
        req.nchains = ChainCounts::new(2, 1);

        let pipeline = MockPipeline::default();
        let err = get_descriptors(
            &pipeline,
            &MockScorer::default(),
            &req,
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DescriptorError::ChainMismatch {
                receptor: 2,
                ligand: 1,
                total: 2
            }
        ));
        assert_eq!(pipeline.built.load(Ordering::SeqCst), 0);
    }

    fn store_with(values: &[(&str, &[(usize, f64)])]) -> (tempfile::TempDir, Protocol) {
        let dir = tempfile::tempdir().unwrap();
        let protocol = Protocol::from("modeller_fast");
        let mut by_desc = NestedMap::new();
        for (name, entries) in values {
            let per_model: BTreeMap<String, f64> = entries
                .iter()
                .map(|(i, v)| (i.to_string(), *v))
                .collect();
            by_desc.insert(name.to_string(), per_model);
        }
        let mut all = StoreMap::new();
        all.insert(protocol.to_string(), by_desc);
        store::save(dir.path(), &all).unwrap();
        (dir, protocol)
    }

    #[test]
    fn average_reports_mean_std_and_error() {
        let (dir, protocol) =
            store_with(&[("IC_TOT", &[(0, 1.0), (1, 2.0), (2, 3.0)])]);

        let scores = get_descriptors_average(
            dir.path(),
            &protocol,
            &["IC_TOT".to_string()],
            Some(3),
            false,
        )
        .unwrap();

        let (name, agg) = &scores[0];
        assert_eq!(name, "IC_TOT");
        assert!((agg.avg - 2.0).abs() < 1e-12);
        assert!((agg.std - 0.816_496_580_927_726).abs() < 1e-9);
        assert!((agg.err - 0.471_404_520_791_032).abs() < 1e-9);
    }

    #[test]
    fn average_median_of_even_count_is_the_midpoint() {
        let (dir, protocol) =
            store_with(&[("BSA", &[(0, 1.0), (1, 2.0), (2, 3.0), (3, 10.0)])]);

        let scores =
            get_descriptors_average(dir.path(), &protocol, &["BSA".to_string()], None, true)
                .unwrap();
        assert!((scores[0].1.avg - 2.5).abs() < 1e-12);
    }

    #[test]
    fn average_without_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = get_descriptors_average(
            dir.path(),
            &Protocol::from("modeller_fast"),
            &[],
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::MissingStore { .. }));
    }

    #[test]
    fn average_with_unknown_protocol_fails() {
        let (dir, _) = store_with(&[("BSA", &[(0, 1.0)])]);
        let err = get_descriptors_average(
            dir.path(),
            &Protocol::from("modeller_slow"),
            &["BSA".to_string()],
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::MissingProtocol { .. }));
    }

    #[test]
    fn average_with_missing_model_index_fails() {
        let (dir, protocol) = store_with(&[("BSA", &[(0, 1.0), (2, 3.0)])]);
        let err = get_descriptors_average(
            dir.path(),
            &protocol,
            &["BSA".to_string()],
            Some(3),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::IncompleteModel { index: 1, .. }
        ));
    }
}
