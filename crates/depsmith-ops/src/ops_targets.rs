//! Operation: list the target definitions of an assets file.

use std::path::Path;

use depsmith_core::graph::Graph;

/// Target names in resolution order.
pub fn target_names(graph: &Graph) -> Vec<String> {
    graph.targets().map(|t| t.to_string()).collect()
}

pub fn targets(assets: &Path) -> miette::Result<()> {
    let graph = Graph::from_path(assets)?;
    for name in target_names(&graph) {
        println!("{name}");
    }
    Ok(())
}
