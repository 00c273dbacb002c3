use crate::cli::ComputeArgs;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use ppdg::makemodel::ExternalTools;
use ppdg::progress::ProgressReporter;
use ppdg::scoring::{self, ExternalScorer};
use ppdg::types::{ChainCounts, Protocol};
use ppdg::workflows::descriptors::{self, DescriptorRequest};
use tracing::info;

pub fn run(args: ComputeArgs) -> Result<()> {
    let settings = super::load_settings(args.config.as_deref())?;
    let sequence = super::read_sequence(&args.sequence)?;

    let wanted = if args.descriptors.is_empty() {
        scoring::all_descriptors()
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        args.descriptors.clone()
    };

    let request = DescriptorRequest {
        wrkdir: args.wrkdir.clone(),
        protocol: Protocol::new(&args.protocol),
        template: args.template.clone(),
        sequence,
        nchains: ChainCounts::new(args.receptor_chains, args.ligand_chains),
        wanted,
        nmodels: args.nmodels,
        ncores: args.cores,
        force: args.force,
    };

    let pipeline = ExternalTools::new(&settings);
    let scorer = ExternalScorer::new(&settings);
    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.callback());

    let alldesc = descriptors::get_descriptors(&pipeline, &scorer, &request, &reporter)?;

    let computed = alldesc
        .get(args.protocol.as_str())
        .map(|by_desc| by_desc.len())
        .unwrap_or(0);
    info!(
        "{computed} descriptors available for protocol '{}' over {} models",
        args.protocol, args.nmodels
    );
    println!(
        "Computed {} models with {computed} descriptors in {}",
        args.nmodels,
        args.wrkdir.display()
    );
    Ok(())
}
