use crate::cli::AverageArgs;
use crate::error::Result;
use ppdg::types::Protocol;
use ppdg::workflows::descriptors;

pub fn run(args: AverageArgs) -> Result<()> {
    let scores = descriptors::get_descriptors_average(
        &args.wrkdir,
        &Protocol::new(&args.protocol),
        &args.descriptors,
        args.nmodels,
        args.median,
    )?;

    let center = if args.median { "median" } else { "mean" };
    println!("{:<14} {:>12} {:>12} {:>12}", "descriptor", center, "std", "err");
    for (name, agg) in &scores {
        println!(
            "{:<14} {:>12.4} {:>12.4} {:>12.4}",
            name, agg.avg, agg.std, agg.err
        );
    }
    Ok(())
}
