use clap::{Args, Parser, Subcommand};
use ppdg::workflows::predict::{DEFAULT_NCORES, DEFAULT_NMODELS};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "ppdg - descriptor computation and binding-affinity prediction for protein-protein complexes.",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build models of a complex and compute its interface descriptors.
    Compute(ComputeArgs),
    /// Aggregate already-computed descriptors over the models of a complex.
    Average(AverageArgs),
    /// Predict the binding affinity of a complex from a regression bundle.
    Predict(PredictArgs),
    /// Remove regenerable intermediate files from a working directory.
    Clean(CleanArgs),
    /// Show the effective settings.
    Config(ConfigArgs),
}

/// The complex sequence, inline or from a file; chains separated by `/`.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SequenceInput {
    /// Sequence of the complex, chains separated by '/'.
    #[arg(long, value_name = "SEQ")]
    pub sequence: Option<String>,

    /// File holding the sequence of the complex.
    #[arg(long, value_name = "PATH")]
    pub sequence_file: Option<PathBuf>,
}

/// Arguments for the `compute` subcommand.
#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Path to the settings file (INI with a [ppdg] section).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory of the complex; created if absent.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub wrkdir: PathBuf,

    /// Modelling protocol to use.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub protocol: String,

    /// Template structure for the homology modelling.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub template: PathBuf,

    #[command(flatten)]
    pub sequence: SequenceInput,

    /// Number of chains belonging to the receptor.
    #[arg(long, required = true, value_name = "INT")]
    pub receptor_chains: usize,

    /// Number of chains belonging to the ligand.
    #[arg(long, required = true, value_name = "INT")]
    pub ligand_chains: usize,

    /// Descriptors to compute; defaults to the full catalog.
    #[arg(short, long, value_name = "NAME", num_args(1..))]
    pub descriptors: Vec<String>,

    /// Number of models to build.
    #[arg(short, long, default_value_t = DEFAULT_NMODELS, value_name = "INT")]
    pub nmodels: usize,

    /// Worker threads; below 2 the models are computed sequentially.
    #[arg(short = 'j', long, default_value_t = DEFAULT_NCORES, value_name = "INT")]
    pub cores: usize,

    /// Recompute the requested descriptors even when cached.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `average` subcommand.
#[derive(Args, Debug)]
pub struct AverageArgs {
    /// Working directory of the complex.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub wrkdir: PathBuf,

    /// Modelling protocol the descriptors were computed with.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub protocol: String,

    /// Descriptors to aggregate; defaults to the full catalog.
    #[arg(short, long, value_name = "NAME", num_args(1..))]
    pub descriptors: Vec<String>,

    /// Restrict the aggregation to the first N models.
    #[arg(short, long, value_name = "INT")]
    pub nmodels: Option<usize>,

    /// Report the median instead of the mean.
    #[arg(long)]
    pub median: bool,
}

/// Arguments for the `predict` subcommand.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Path to the settings file (INI with a [ppdg] section).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Trained regression bundle (JSON).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub bundle: PathBuf,

    /// Template structure for the homology modelling.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub template: PathBuf,

    #[command(flatten)]
    pub sequence: SequenceInput,

    /// Number of chains belonging to the receptor.
    #[arg(long, required = true, value_name = "INT")]
    pub receptor_chains: usize,

    /// Number of chains belonging to the ligand.
    #[arg(long, required = true, value_name = "INT")]
    pub ligand_chains: usize,

    /// Working directory; defaults to a sequence-derived name under the
    /// configured model tree.
    #[arg(short, long, value_name = "PATH")]
    pub wrkdir: Option<PathBuf>,

    /// Number of models to build.
    #[arg(short, long, default_value_t = DEFAULT_NMODELS, value_name = "INT")]
    pub nmodels: usize,

    /// Worker threads; below 2 the models are computed sequentially.
    #[arg(short = 'j', long, default_value_t = DEFAULT_NCORES, value_name = "INT")]
    pub cores: usize,
}

/// Arguments for the `clean` subcommand.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Working directory to clean.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub wrkdir: PathBuf,
}

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the settings file (INI with a [ppdg] section).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sequence_and_sequence_file_are_exclusive() {
        let result = Cli::try_parse_from([
            "ppdg",
            "compute",
            "--wrkdir",
            "/tmp/w",
            "--protocol",
            "modeller_fast",
            "--template",
            "/tmp/t.pdb",
            "--sequence",
            "AAAA/CCCC",
            "--sequence-file",
            "/tmp/seq.txt",
            "--receptor-chains",
            "1",
            "--ligand-chains",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn compute_defaults_apply() {
        let cli = Cli::try_parse_from([
            "ppdg",
            "compute",
            "--wrkdir",
            "/tmp/w",
            "--protocol",
            "modeller_fast",
            "--template",
            "/tmp/t.pdb",
            "--sequence",
            "AAAA/CCCC",
            "--receptor-chains",
            "1",
            "--ligand-chains",
            "1",
        ])
        .unwrap();
        match cli.command {
            Commands::Compute(args) => {
                assert_eq!(args.nmodels, 12);
                assert_eq!(args.cores, 11);
                assert!(args.descriptors.is_empty());
                assert!(!args.force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
