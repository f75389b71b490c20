pub mod deps_file;
pub mod ops_check;
pub mod ops_resolve;
pub mod ops_targets;
pub mod ops_tree;

use std::path::{Path, PathBuf};

use depsmith_core::config::ResolverOptions;
use depsmith_core::graph::Graph;

/// Load an assets file and the resolver options that apply to it.
///
/// An explicit `config` wins; otherwise `depsmith.toml` is looked up from the
/// assets file's directory upwards, falling back to defaults.
pub fn load_project(assets: &Path, config: Option<&Path>) -> miette::Result<(Graph, ResolverOptions)> {
    let options = match config {
        Some(path) => ResolverOptions::from_path(path)?,
        None => ResolverOptions::discover(&assets_dir(assets))?.0,
    };
    let graph = Graph::from_path(assets)?;
    Ok((graph, options))
}

/// Directory containing the assets file.
pub fn assets_dir(assets: &Path) -> PathBuf {
    match assets.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
