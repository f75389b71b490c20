//! Handler for `depsmith tree`.

use std::path::{Path, PathBuf};

use miette::Result;

use depsmith_ops::ops_tree::{self, TreeOptions};

pub fn exec(
    assets: &Path,
    target: Option<String>,
    depth: Option<u32>,
    why: Option<String>,
    conflicts: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let opts = TreeOptions {
        config,
        target,
        depth: depth.map(|d| d as usize),
        why,
        conflicts,
    };
    ops_tree::tree(assets, &opts)
}
