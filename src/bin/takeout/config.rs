use takeout_tools::organize::{OrganizeConfig, TakeoutConfig};

use crate::Args;

/// Create config from given command line args and user config file.
///
/// # Errors
/// Returns an error if the config file cannot be read or parsed.
pub fn organize_config(args: &Args) -> anyhow::Result<OrganizeConfig> {
    let user_config = TakeoutConfig::get_user_config()?;
    Ok(merge(args, &user_config))
}

/// Command line flags enable options on top of the user config.
fn merge(args: &Args, user_config: &TakeoutConfig) -> OrganizeConfig {
    OrganizeConfig {
        debug: args.debug || user_config.debug,
        dryrun: args.print || user_config.dryrun,
        skip_invalid: args.skip_invalid || user_config.skip_invalid,
        verbose: args.verbose || user_config.verbose,
    }
}
