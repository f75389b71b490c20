//! Handler for `depsmith check`.

use std::path::Path;

use miette::Result;

pub fn exec(assets: &Path, deps: &Path, config: Option<&Path>) -> Result<()> {
    if !deps.is_file() {
        return Err(depsmith_util::errors::DepsmithError::Generic {
            message: format!("No deps file found at {}", deps.display()),
        }
        .into());
    }
    depsmith_ops::ops_check::check(assets, deps, config)
}
