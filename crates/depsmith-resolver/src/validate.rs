//! Checks that produced manifests are consistent with the graph they came from.
//!
//! Violations are data: the validator never fails, and running it twice
//! over the same input yields the same sorted, deduplicated result.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use depsmith_core::asset::{AssetKind, KeyPolicy};
use depsmith_core::config::ResolverOptions;
use depsmith_core::framework::FrameworkMoniker;
use depsmith_core::graph::Graph;
use depsmith_core::package::PackageId;
use depsmith_core::target::Target;
use depsmith_core::version::PackageVersion;

use crate::manifest::Manifest;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Violation {
    /// Two or more entries of one manifest share a logical key.
    DuplicateAsset {
        target: Target,
        kind: AssetKind,
        key: String,
        packages: Vec<String>,
    },
    /// An entry's owning package is not part of the target graph.
    DanglingReference { target: Target, package: String },
    /// An entry's owning package exists but nothing reaches it from the project.
    UnreachablePackage { target: Target, package: String },
    /// The manifest names a target the graph does not contain.
    UnknownTarget { target: Target },
    /// A ridless restore did not produce exactly one ridless target for a framework.
    AmbiguousTargetShape {
        framework: FrameworkMoniker,
        ridless: usize,
        rid_specific: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateAsset {
                target,
                kind,
                key,
                packages,
            } => write!(
                f,
                "{target}: duplicate {kind} asset `{key}` from {}",
                packages.join(", ")
            ),
            Self::DanglingReference { target, package } => {
                write!(f, "{target}: `{package}` is not part of the target graph")
            }
            Self::UnreachablePackage { target, package } => {
                write!(f, "{target}: `{package}` is not reachable from the project")
            }
            Self::UnknownTarget { target } => write!(f, "{target}: unknown target"),
            Self::AmbiguousTargetShape {
                framework,
                ridless,
                rid_specific,
            } => write!(
                f,
                "{framework}: expected exactly one ridless target and no runtime-specific targets, \
                 found {ridless} ridless and {rid_specific} runtime-specific"
            ),
        }
    }
}

/// Sorted, deduplicated set of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn new(mut violations: Vec<Violation>) -> Self {
        violations.sort();
        violations.dedup();
        Self { violations }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Merge two results, keeping the order and uniqueness guarantees.
    pub fn merge(self, other: ValidationResult) -> Self {
        let mut all = self.violations;
        all.extend(other.violations);
        Self::new(all)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.violations {
            writeln!(f, "{v}")?;
        }
        Ok(())
    }
}

pub struct Validator<'a> {
    graph: &'a Graph,
    policy: KeyPolicy,
}

impl<'a> Validator<'a> {
    pub fn new(graph: &'a Graph, options: &ResolverOptions) -> Self {
        Self {
            graph,
            policy: options.key_policy(),
        }
    }

    /// Check a single target's manifest.
    pub fn validate_manifest(&self, manifest: &Manifest) -> ValidationResult {
        let target = &manifest.target;
        let Some(tg) = self.graph.graph_for_target(target) else {
            return ValidationResult::new(vec![Violation::UnknownTarget {
                target: target.clone(),
            }]);
        };

        let mut violations = Vec::new();

        // Keys are recomputed from the entries so that manifests read back
        // from disk are checked under the current key policy.
        let mut by_key: BTreeMap<_, Vec<String>> = BTreeMap::new();
        for entry in manifest.entries() {
            by_key
                .entry(entry.to_file().logical_key(self.policy))
                .or_default()
                .push(entry.library());
        }
        for (key, mut packages) in by_key {
            if packages.len() > 1 {
                packages.sort();
                violations.push(Violation::DuplicateAsset {
                    target: target.clone(),
                    kind: key.kind,
                    key: key.key,
                    packages,
                });
            }
        }

        let reachable = tg.reachable_from_root();
        let owners: BTreeSet<(&str, &str)> = manifest
            .entries()
            .map(|e| (e.package.as_str(), e.version.as_str()))
            .collect();
        for (name, version) in owners {
            let library = format!("{name}/{version}");
            let present = PackageVersion::parse(version)
                .map(|v| tg.contains(&PackageId::new(name, v)))
                .unwrap_or(false);
            if !present {
                violations.push(Violation::DanglingReference {
                    target: target.clone(),
                    package: library,
                });
            } else if !reachable.contains(&name.to_ascii_lowercase()) {
                violations.push(Violation::UnreachablePackage {
                    target: target.clone(),
                    package: library,
                });
            }
        }

        ValidationResult::new(violations)
    }

    /// Check every manifest, plus the target shape of a ridless restore.
    pub fn validate<'m>(&self, manifests: impl IntoIterator<Item = &'m Manifest>) -> ValidationResult {
        let mut result = ValidationResult::default();
        for manifest in manifests {
            result = result.merge(self.validate_manifest(manifest));
        }
        if self.graph.requested_runtimes().is_empty() {
            result = result.merge(ValidationResult::new(self.check_target_shape()));
        }
        tracing::debug!(violations = result.len(), "validated manifests");
        result
    }

    fn check_target_shape(&self) -> Vec<Violation> {
        let mut frameworks: BTreeSet<FrameworkMoniker> =
            self.graph.requested_frameworks().iter().cloned().collect();
        frameworks.extend(self.graph.targets().map(|t| t.framework.clone()));

        frameworks
            .into_iter()
            .filter_map(|framework| {
                let (ridless, rid_specific) = self
                    .graph
                    .targets()
                    .filter(|t| t.framework == framework)
                    .fold((0, 0), |(r, s), t| {
                        if t.is_ridless() {
                            (r + 1, s)
                        } else {
                            (r, s + 1)
                        }
                    });
                (ridless != 1 || rid_specific > 0).then_some(Violation::AmbiguousTargetShape {
                    framework,
                    ridless,
                    rid_specific,
                })
            })
            .collect()
    }
}
