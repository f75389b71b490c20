//! The resolved dependency graph, one petgraph per target.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use depsmith_util::errors::DepsmithError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;

use crate::asset::ContributedFile;
use crate::assets::{AssetsFile, FileSpec, PackageSpec, TargetSpec};
use crate::framework::FrameworkMoniker;
use crate::package::{Package, PackageId, PackageKind};
use crate::target::Target;
use crate::version::PackageVersion;

/// A fully loaded resolution: the project plus one graph per target.
///
/// A target whose graph is malformed keeps its slot with the reason, so the
/// remaining targets still resolve. Immutable after [`Graph::load`].
#[derive(Debug)]
pub struct Graph {
    project: PackageId,
    frameworks: Vec<FrameworkMoniker>,
    runtimes: Vec<String>,
    references: Vec<String>,
    targets: BTreeMap<Target, Result<TargetGraph, String>>,
}

impl Graph {
    /// Read and load an assets file from disk.
    pub fn from_path(path: &Path) -> Result<Self, DepsmithError> {
        Self::load(AssetsFile::from_path(path)?)
    }

    /// Build typed target graphs from the resolution output.
    ///
    /// Fails only for problems that leave no target identity to attach them
    /// to: the project itself, a target without a framework, or two targets
    /// with the same identity.
    pub fn load(assets: AssetsFile) -> Result<Self, DepsmithError> {
        let project_spec = assets.project;
        let version = PackageVersion::parse(&project_spec.version).map_err(|e| {
            DepsmithError::Assets {
                message: format!("project `{}`: {e}", project_spec.name),
            }
        })?;
        if project_spec.name.trim().is_empty() {
            return Err(DepsmithError::Assets {
                message: "project name is empty".to_string(),
            });
        }
        let project = PackageId::new(project_spec.name.clone(), version);

        let mut frameworks = Vec::new();
        for raw in &project_spec.frameworks {
            let fw = FrameworkMoniker::parse(raw).ok_or_else(|| DepsmithError::Assets {
                message: format!("project framework `{raw}` is not a valid target framework"),
            })?;
            if !frameworks.contains(&fw) {
                frameworks.push(fw);
            }
        }

        let mut targets = BTreeMap::new();
        for spec in &assets.targets {
            let target = parse_target(spec)?;
            if targets.contains_key(&target) {
                return Err(malformed(&target, "target is listed more than once"));
            }
            let graph = TargetGraph::build(
                target.clone(),
                &project,
                &project_spec.references,
                &project_spec.files,
                &spec.packages,
            );
            if let Err(message) = &graph {
                tracing::warn!(target_id = %target, %message, "malformed target graph");
            }
            targets.insert(target, graph);
        }

        if frameworks.is_empty() {
            for target in targets.keys() {
                if !frameworks.contains(&target.framework) {
                    frameworks.push(target.framework.clone());
                }
            }
        }

        tracing::debug!(
            project = %project,
            targets = targets.len(),
            malformed = targets.values().filter(|g| g.is_err()).count(),
            "loaded resolution graph"
        );

        Ok(Self {
            project,
            frameworks,
            runtimes: project_spec.runtimes,
            references: project_spec.references,
            targets,
        })
    }

    pub fn project(&self) -> &PackageId {
        &self.project
    }

    /// Frameworks the project asked restore for.
    pub fn requested_frameworks(&self) -> &[FrameworkMoniker] {
        &self.frameworks
    }

    /// Runtime identifiers the project asked restore for. Empty means ridless only.
    pub fn requested_runtimes(&self) -> &[String] {
        &self.runtimes
    }

    pub fn direct_references(&self) -> &[String] {
        &self.references
    }

    /// All targets in deterministic order, malformed ones included.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.keys()
    }

    /// Graphs of the well-formed targets.
    pub fn target_graphs(&self) -> impl Iterator<Item = &TargetGraph> {
        self.targets.values().filter_map(|g| g.as_ref().ok())
    }

    /// Targets whose graph failed to build, with the reason.
    pub fn malformed_targets(&self) -> impl Iterator<Item = (&Target, &str)> {
        self.targets
            .iter()
            .filter_map(|(t, g)| g.as_ref().err().map(|m| (t, m.as_str())))
    }

    pub fn graph_for_target(&self, target: &Target) -> Option<&TargetGraph> {
        self.targets.get(target).and_then(|g| g.as_ref().ok())
    }

    /// The graph of `target`, or the reason there is none.
    pub fn target_graph(&self, target: &Target) -> Result<&TargetGraph, DepsmithError> {
        match self.targets.get(target) {
            Some(Ok(graph)) => Ok(graph),
            Some(Err(message)) => Err(malformed(target, message.clone())),
            None => Err(DepsmithError::Generic {
                message: format!("target {target} is not part of the graph"),
            }),
        }
    }

    /// Files contributed by `package` within `target`; empty if either is unknown.
    pub fn files_of(&self, target: &Target, package: &PackageId) -> &[ContributedFile] {
        self.graph_for_target(target)
            .map(|g| g.files_of(package))
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

fn parse_target(spec: &TargetSpec) -> Result<Target, DepsmithError> {
    let runtime = spec
        .runtime
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    let framework = FrameworkMoniker::parse(&spec.framework).ok_or_else(|| {
        let shown = if spec.framework.trim().is_empty() {
            "<unnamed>".to_string()
        } else {
            spec.framework.clone()
        };
        DepsmithError::MalformedGraph {
            target: match &runtime {
                Some(rid) => format!("{shown}/{rid}"),
                None => shown,
            },
            message: "target has no valid framework identity".to_string(),
        }
    })?;
    Ok(Target::new(framework, runtime))
}

fn malformed(target: &Target, message: impl Into<String>) -> DepsmithError {
    DepsmithError::MalformedGraph {
        target: target.to_string(),
        message: message.into(),
    }
}

/// The dependency graph of a single target.
///
/// Node 0 is a synthetic root standing for the consuming project. Its
/// outgoing edges are the project's direct references.
#[derive(Debug)]
pub struct TargetGraph {
    target: Target,
    graph: DiGraph<Package, ()>,
    /// Lookup from lowercased package name to node index.
    index: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl TargetGraph {
    fn build(
        target: Target,
        project: &PackageId,
        references: &[String],
        project_files: &[FileSpec],
        packages: &[PackageSpec],
    ) -> Result<Self, String> {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        let root_files = convert_files(&project.name, project_files)?;
        let root = graph.add_node(Package::new(
            project.clone(),
            PackageKind::Project,
            references.to_vec(),
            root_files,
        ));
        index.insert(project.key(), root);

        for spec in packages {
            let version = PackageVersion::parse(&spec.version)
                .map_err(|e| format!("package `{}`: {e}", spec.name))?;
            let id = PackageId::new(spec.name.clone(), version);
            if id.name.trim().is_empty() {
                return Err("package with an empty name".to_string());
            }
            if index.contains_key(&id.key()) {
                return Err(format!("package `{}` appears more than once", spec.name));
            }
            let files = convert_files(&spec.name, &spec.files)?;
            let idx = graph.add_node(Package::new(
                id.clone(),
                PackageKind::Package,
                spec.dependencies.clone(),
                files,
            ));
            index.insert(id.key(), idx);
        }

        for spec in packages {
            let from = index[&spec.name.to_ascii_lowercase()];
            for dep in &spec.dependencies {
                let Some(&to) = index.get(&dep.to_ascii_lowercase()) else {
                    return Err(format!(
                        "package `{}` depends on `{dep}`, which is not part of this target",
                        spec.name
                    ));
                };
                if to == root {
                    return Err(format!(
                        "package `{}` depends on the project itself",
                        spec.name
                    ));
                }
                if !graph.edges(from).any(|e| e.target() == to) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        for reference in references {
            match index.get(&reference.to_ascii_lowercase()) {
                Some(&to) if to != root => {
                    if !graph.edges(root).any(|e| e.target() == to) {
                        graph.add_edge(root, to, ());
                    }
                }
                _ => tracing::debug!(
                    target_id = %target,
                    reference = %reference,
                    "direct reference not restored for this target"
                ),
            }
        }

        Ok(Self {
            target,
            graph,
            index,
            root,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The consuming project node.
    pub fn project(&self) -> &Package {
        &self.graph[self.root]
    }

    /// All restored packages (excluding the project), sorted by name.
    pub fn packages(&self) -> Vec<&Package> {
        let mut packages: Vec<&Package> = self
            .graph
            .node_indices()
            .filter(|&idx| idx != self.root)
            .map(|idx| &self.graph[idx])
            .collect();
        packages.sort_by_key(|p| p.id.key());
        packages
    }

    /// The project followed by every package, in graph order.
    pub fn all_packages(&self) -> impl Iterator<Item = &Package> {
        self.graph.node_weights()
    }

    /// Look up a package (or the project) by name, case-insensitively.
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&idx| &self.graph[idx])
    }

    /// Whether this exact identity (name and version) is part of the graph.
    pub fn contains(&self, id: &PackageId) -> bool {
        self.package(&id.name).is_some_and(|p| p.id == *id)
    }

    pub fn files_of(&self, id: &PackageId) -> &[ContributedFile] {
        match self.package(&id.name) {
            Some(p) if p.id == *id => p.files(),
            _ => &[],
        }
    }

    /// Whether `name` is the project itself or one of its direct references.
    pub fn is_direct(&self, name: &str) -> bool {
        match self.index.get(&name.to_ascii_lowercase()) {
            Some(&idx) if idx == self.root => true,
            Some(&idx) => self.graph.contains_edge(self.root, idx),
            None => false,
        }
    }

    /// Lowercased names of every node reachable from the project.
    pub fn reachable_from_root(&self) -> HashSet<String> {
        let mut reachable = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, self.root);
        while let Some(idx) = dfs.next(&self.graph) {
            reachable.insert(self.graph[idx].id.key());
        }
        reachable
    }

    /// Direct dependencies of a package.
    pub fn dependencies_of(&self, name: &str) -> Vec<&Package> {
        let Some(&idx) = self.index.get(&name.to_ascii_lowercase()) else {
            return Vec::new();
        };
        let mut deps: Vec<&Package> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| &self.graph[e.target()])
            .collect();
        deps.sort_by_key(|p| p.id.key());
        deps
    }

    /// Packages that depend on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&Package> {
        let Some(&idx) = self.index.get(&name.to_ascii_lowercase()) else {
            return Vec::new();
        };
        let mut deps: Vec<&Package> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| &self.graph[e.source()])
            .collect();
        deps.sort_by_key(|p| p.id.key());
        deps
    }

    /// Render the dependency tree below the project.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = format!("{}\n", self.graph[self.root]);
        let mut visited = HashSet::new();
        visited.insert(self.root);

        let children = self.sorted_children(self.root);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(&mut output, child, "", i == count - 1, 1, max_depth, &mut visited);
        }
        output
    }

    fn sorted_children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self.graph.edges(idx).map(|e| e.target()).collect();
        children.sort_by_key(|&c| self.graph[c].id.key());
        children
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node}\n"));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        // Cycles are cut at the first repeat on the current path.
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.sorted_children(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(
                output,
                child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Find a path from the project to `name`.
    pub fn find_path(&self, name: &str) -> Option<Vec<&Package>> {
        let target = *self.index.get(&name.to_ascii_lowercase())?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(self.root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for child in self.sorted_children(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Number of packages (excluding the project).
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn convert_files(package: &str, specs: &[FileSpec]) -> Result<Vec<ContributedFile>, String> {
    specs
        .iter()
        .map(|spec| {
            if spec.path.trim().is_empty() {
                return Err(format!("package `{package}` lists a file with an empty path"));
            }
            let mut file = ContributedFile::new(package, spec.kind, spec.path.trim());
            if let Some(raw) = &spec.framework {
                let fw = FrameworkMoniker::parse(raw).ok_or_else(|| {
                    format!("file `{}` of `{package}` has invalid framework `{raw}`", spec.path)
                })?;
                file = file.with_framework(fw);
            }
            if let Some(dest) = &spec.destination {
                file = file.with_destination(dest.trim());
            }
            if let Some(culture) = &spec.culture {
                file = file.with_culture(culture.trim());
            }
            Ok(file)
        })
        .collect()
}
