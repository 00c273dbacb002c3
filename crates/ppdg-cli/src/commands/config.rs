use crate::cli::ConfigArgs;
use crate::error::Result;

pub fn run(args: ConfigArgs) -> Result<()> {
    let settings = super::load_settings(args.config.as_deref())?;
    print!("{settings}");
    Ok(())
}
