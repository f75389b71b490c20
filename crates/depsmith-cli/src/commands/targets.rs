//! Handler for `depsmith targets`.

use std::path::Path;

use miette::Result;

pub fn exec(assets: &Path) -> Result<()> {
    depsmith_ops::ops_targets::targets(assets)
}
