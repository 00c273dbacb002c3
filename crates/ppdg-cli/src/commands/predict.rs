use crate::cli::PredictArgs;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use ppdg::makemodel::ExternalTools;
use ppdg::progress::ProgressReporter;
use ppdg::scoring::ExternalScorer;
use ppdg::types::ChainCounts;
use ppdg::workflows::predict::{self, PredictRequest};

pub fn run(args: PredictArgs) -> Result<()> {
    let settings = super::load_settings(args.config.as_deref())?;
    let sequence = super::read_sequence(&args.sequence)?;

    let request = PredictRequest {
        bundle: args.bundle.clone(),
        template: args.template.clone(),
        sequence,
        nchains: ChainCounts::new(args.receptor_chains, args.ligand_chains),
        wrkdir: args.wrkdir.clone(),
        nmodels: args.nmodels,
        ncores: args.cores,
    };

    let pipeline = ExternalTools::new(&settings);
    let scorer = ExternalScorer::new(&settings);
    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.callback());

    let affinity = predict::eval_bundle(&settings, &pipeline, &scorer, &request, &reporter)?;
    println!("Predicted binding affinity: {affinity:.4}");
    Ok(())
}
