use crate::cli::CleanArgs;
use crate::error::Result;
use ppdg::workflows::clean;

pub fn run(args: CleanArgs) -> Result<()> {
    let removed = clean::clean(&args.wrkdir)?;
    println!(
        "Removed {removed} intermediate files under {}",
        args.wrkdir.display()
    );
    Ok(())
}
