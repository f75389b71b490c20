//! Command dispatch and handler modules.

mod check;
mod resolve;
mod targets;
mod tree;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve {
            assets,
            config,
            output,
            no_conflict_handling,
        } => resolve::exec(assets, config, output, no_conflict_handling).await,
        Command::Check {
            assets,
            deps,
            config,
        } => check::exec(&assets, &deps, config.as_deref()),
        Command::Tree {
            assets,
            target,
            depth,
            why,
            conflicts,
            config,
        } => tree::exec(&assets, target, depth, why, conflicts, config),
        Command::Targets { assets } => targets::exec(&assets),
    }
}
