//! Operation: display the dependency tree of each target.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use depsmith_core::config::ResolverOptions;
use depsmith_core::graph::{Graph, TargetGraph};
use depsmith_core::target::Target;
use depsmith_resolver::conflict;
use depsmith_util::errors::DepsmithError;
use depsmith_util::progress;

/// Options for `depsmith tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    pub config: Option<PathBuf>,
    /// Only this target (`framework` or `framework/rid`).
    pub target: Option<String>,
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the path from the project to this package.
    pub why: Option<String>,
    /// Show file conflicts instead of the tree.
    pub conflicts: bool,
}

/// Display the dependency tree for the assets file.
pub fn tree(assets: &Path, opts: &TreeOptions) -> miette::Result<()> {
    let (graph, options) = crate::load_project(assets, opts.config.as_deref())?;
    if opts.target.is_none() {
        for (target, message) in graph.malformed_targets() {
            progress::status_warn("Skipping", &format!("{target}: {message}"));
        }
    }
    print!("{}", render(&graph, &options, opts)?);
    Ok(())
}

/// Render what `tree` prints.
pub fn render(graph: &Graph, options: &ResolverOptions, opts: &TreeOptions) -> miette::Result<String> {
    let selected = select_targets(graph, opts.target.as_deref())?;
    let multiple = selected.len() > 1;
    let mut output = String::new();

    for tg in selected {
        if multiple {
            let _ = writeln!(output, "[{}]", tg.target());
        }

        // Handle --why
        if let Some(ref name) = opts.why {
            match tg.find_path(name) {
                Some(path) => {
                    let _ = writeln!(output, "Path to {name}:");
                    for (i, node) in path.iter().enumerate() {
                        let indent = "  ".repeat(i);
                        let _ = writeln!(output, "{indent}{node}");
                    }
                }
                None => {
                    let _ = writeln!(output, "Package '{name}' is not reachable in this target.");
                }
            }
            continue;
        }

        // Handle --conflicts
        if opts.conflicts {
            let resolution = conflict::resolve_target(tg, options)?;
            let _ = write!(output, "{}", resolution.report());
            continue;
        }

        output.push_str(&tg.print_tree(opts.depth));
    }

    Ok(output)
}

fn select_targets<'g>(graph: &'g Graph, target: Option<&str>) -> miette::Result<Vec<&'g TargetGraph>> {
    let Some(raw) = target else {
        return Ok(graph.target_graphs().collect());
    };
    let wanted = Target::parse(raw).ok_or_else(|| DepsmithError::Generic {
        message: format!("'{raw}' is not a valid target"),
    })?;
    if !graph.targets().any(|t| *t == wanted) {
        return Err(DepsmithError::Generic {
            message: format!("Unknown target '{wanted}'"),
        }
        .into());
    }
    Ok(vec![graph.target_graph(&wanted)?])
}
