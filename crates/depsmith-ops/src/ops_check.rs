//! Operation: validate an existing deps file against the assets it came from.

use std::path::Path;

use depsmith_resolver::validate::{ValidationResult, Validator};
use depsmith_util::errors::DepsmithError;
use depsmith_util::progress;

use crate::deps_file::DepsFile;

/// Load both files and run the validator. Violations are returned, not raised.
pub fn check_deps_file(
    assets: &Path,
    deps: &Path,
    config: Option<&Path>,
) -> miette::Result<ValidationResult> {
    let (graph, options) = crate::load_project(assets, config)?;
    let manifests = DepsFile::from_path(deps)?.to_manifests(options.key_policy())?;
    Ok(Validator::new(&graph, &options).validate(&manifests))
}

/// Print every violation and fail if there was at least one.
pub fn check(assets: &Path, deps: &Path, config: Option<&Path>) -> miette::Result<()> {
    progress::status("Checking", &deps.display().to_string());
    let result = check_deps_file(assets, deps, config)?;
    if result.is_valid() {
        progress::status("Finished", "no violations");
        return Ok(());
    }
    print!("{result}");
    Err(DepsmithError::Validation {
        count: result.len(),
    }
    .into())
}
