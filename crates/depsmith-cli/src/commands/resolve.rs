//! Handler for `depsmith resolve`.

use std::path::PathBuf;

use miette::Result;

use depsmith_ops::ops_resolve::{self, ResolveOptions};

pub async fn exec(
    assets: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    no_conflict_handling: bool,
) -> Result<()> {
    let opts = ResolveOptions {
        config,
        output,
        no_conflict_handling,
    };
    ops_resolve::resolve(&assets, &opts).await?;
    Ok(())
}
