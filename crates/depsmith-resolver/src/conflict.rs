//! File conflict detection and resolution for a single target.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use depsmith_core::asset::AssetKey;
use depsmith_core::config::{ResolverOptions, TieBreakRule};
use depsmith_core::graph::TargetGraph;
use depsmith_core::package::PackageId;
use depsmith_core::target::Target;
use depsmith_util::errors::DepsmithError;

use crate::policy::{Candidate, TieBreakPipeline};

/// Why a candidate was dropped from its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Another package's file won on `rule`.
    LostTieBreak { rule: TieBreakRule, winner: PackageId },
    /// The same package lists the key twice; the earlier path is kept.
    SamePackageDuplicate { kept_path: String },
    /// The host platform already provides the file.
    ProvidedByPlatform { platform: PackageId },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LostTieBreak { rule, winner } => write!(f, "{rule}: {winner} wins"),
            Self::SamePackageDuplicate { kept_path } => {
                write!(f, "duplicate within package, keeping {kept_path}")
            }
            Self::ProvidedByPlatform { platform } => write!(f, "provided by platform {platform}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub candidate: Candidate,
    pub reason: ExclusionReason,
}

/// Every file sharing one logical key within a target, and the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictGroup {
    pub key: AssetKey,
    pub kept: Candidate,
    pub excluded: Vec<Exclusion>,
}

impl ConflictGroup {
    /// More than one file competed for the key.
    pub fn is_conflict(&self) -> bool {
        !self.excluded.is_empty()
    }

    /// The winner comes from the host platform, so nothing is deployed for the key.
    pub fn is_platform(&self) -> bool {
        self.kept.platform
    }

    pub fn len(&self) -> usize {
        1 + self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// The result of conflict resolution for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolution {
    pub target: Target,
    /// Sorted by key. With conflict handling disabled, one group per file.
    pub groups: Vec<ConflictGroup>,
}

impl TargetResolution {
    pub fn kept(&self) -> impl Iterator<Item = &Candidate> {
        self.groups.iter().map(|g| &g.kept)
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &ConflictGroup> {
        self.groups.iter().filter(|g| g.is_conflict())
    }

    pub fn excluded_count(&self) -> usize {
        self.groups.iter().map(|g| g.excluded.len()).sum()
    }

    pub fn report(&self) -> ConflictReport {
        let mut report = ConflictReport::new(self.target.clone());
        for group in self.conflicts() {
            report.add(FileConflict {
                key: group.key.to_string(),
                kept: group.kept.to_string(),
                dropped: group
                    .excluded
                    .iter()
                    .map(|e| (e.candidate.to_string(), e.reason.to_string()))
                    .collect(),
            });
        }
        report
    }
}

/// Resolve every file conflict in one target.
pub fn resolve_target(
    graph: &TargetGraph,
    options: &ResolverOptions,
) -> Result<TargetResolution, DepsmithError> {
    let target = graph.target().clone();
    let pipeline = TieBreakPipeline::from_rules(&options.tie_break);
    let policy = options.key_policy();

    let mut candidates: Vec<(AssetKey, Candidate)> = Vec::new();
    for package in graph.all_packages() {
        for file in package.files() {
            candidates.push((
                file.logical_key(policy),
                Candidate::new(graph, package, file, options),
            ));
        }
    }
    candidates.sort_by(|(ka, a), (kb, b)| {
        ka.cmp(kb)
            .then_with(|| a.package.key().cmp(&b.package.key()))
            .then_with(|| a.file.path.cmp(&b.file.path))
    });

    if !options.handle_conflicts {
        tracing::warn!(target_id = %target, "file conflict handling is disabled");
        let groups = candidates
            .into_iter()
            .map(|(key, kept)| ConflictGroup {
                key,
                kept,
                excluded: Vec::new(),
            })
            .collect();
        return Ok(TargetResolution { target, groups });
    }

    let mut by_key: BTreeMap<AssetKey, Vec<Candidate>> = BTreeMap::new();
    for (key, candidate) in candidates {
        by_key.entry(key).or_default().push(candidate);
    }

    let mut groups = Vec::with_capacity(by_key.len());
    for (key, members) in by_key {
        let group = resolve_group(&target, key, members, &pipeline)?;
        if group.is_conflict() {
            tracing::debug!(
                target_id = %target,
                key = %group.key,
                kept = %group.kept,
                dropped = group.excluded.len(),
                "resolved file conflict"
            );
        }
        groups.push(group);
    }

    let resolution = TargetResolution { target, groups };
    tracing::info!(
        target_id = %resolution.target,
        groups = resolution.groups.len(),
        excluded = resolution.excluded_count(),
        "resolved target"
    );
    Ok(resolution)
}

/// Pick the single winner of a group. `members` must be non-empty and sorted
/// by package then path. Platform files beat everything else; the pipeline
/// decides among the rest.
fn resolve_group(
    target: &Target,
    key: AssetKey,
    mut members: Vec<Candidate>,
    pipeline: &TieBreakPipeline,
) -> Result<ConflictGroup, DepsmithError> {
    let prefer = |a: &Candidate, b: &Candidate| {
        b.platform
            .cmp(&a.platform)
            .then_with(|| pipeline.compare(a, b))
    };
    let mut best = 0;
    for i in 1..members.len() {
        if prefer(&members[i], &members[best]) == Ordering::Less {
            best = i;
        }
    }
    let kept = members.swap_remove(best);
    // swap_remove moved the last element into `best`; restore deterministic order.
    members.sort_by(|a, b| {
        a.package
            .key()
            .cmp(&b.package.key())
            .then_with(|| a.file.path.cmp(&b.file.path))
    });

    let mut tied = Vec::new();
    let mut excluded = Vec::with_capacity(members.len());
    for candidate in members {
        if kept.platform && !candidate.platform {
            let reason = ExclusionReason::ProvidedByPlatform {
                platform: kept.package.clone(),
            };
            excluded.push(Exclusion { candidate, reason });
            continue;
        }
        let reason = match pipeline.decide(&kept, &candidate) {
            Some((_, rule)) => ExclusionReason::LostTieBreak {
                rule,
                winner: kept.package.clone(),
            },
            None if candidate.package == kept.package => ExclusionReason::SamePackageDuplicate {
                kept_path: kept.file.path.clone(),
            },
            None => {
                tied.push(candidate.package.to_string());
                continue;
            }
        };
        excluded.push(Exclusion { candidate, reason });
    }

    if !tied.is_empty() {
        let mut packages = vec![kept.package.to_string()];
        packages.extend(tied);
        return Err(DepsmithError::UnresolvableConflict {
            target: target.to_string(),
            key: key.to_string(),
            packages,
        });
    }

    Ok(ConflictGroup {
        key,
        kept,
        excluded,
    })
}

/// A report of every file conflict in one target, for display.
#[derive(Debug)]
pub struct ConflictReport {
    pub target: Target,
    pub conflicts: Vec<FileConflict>,
}

/// One conflicted key: the kept file and every dropped file with its reason.
#[derive(Debug, Clone)]
pub struct FileConflict {
    pub key: String,
    pub kept: String,
    pub dropped: Vec<(String, String)>,
}

impl ConflictReport {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            conflicts: Vec::new(),
        }
    }

    pub fn add(&mut self, conflict: FileConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return writeln!(f, "No file conflicts in {}.", self.target);
        }
        writeln!(f, "File conflicts in {} ({}):", self.target, self.conflicts.len())?;
        for c in &self.conflicts {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FileConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {} kept {}", self.key, self.kept)?;
        for (candidate, reason) in &self.dropped {
            writeln!(f, "    dropped {candidate}: {reason}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graph_from_json, only_target};
    use depsmith_core::asset::AssetKind;

    const TWO_FOOS: &str = r#"{
      "project": {"name": "App", "references": ["A", "B"]},
      "targets": [{"framework": "netcoreapp2.0", "packages": [
        {"name": "A", "version": "1.0.0",
         "files": [{"path": "lib/netstandard1.3/Foo.dll", "kind": "runtime"}]},
        {"name": "B", "version": "2.0.0",
         "files": [{"path": "lib/netstandard1.3/Foo.dll", "kind": "runtime"},
                   {"path": "lib/netstandard1.3/Bar.dll", "kind": "runtime"}]}
      ]}]
    }"#;

    #[test]
    fn version_wins_between_equally_direct_packages() {
        let graph = graph_from_json(TWO_FOOS);
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        let foo = resolution
            .groups
            .iter()
            .find(|g| g.key.key == "foo")
            .unwrap();
        assert_eq!(foo.kept.package.name, "B");
        assert_eq!(foo.excluded.len(), 1);
        assert_eq!(foo.excluded[0].candidate.package.name, "A");
        assert!(matches!(
            foo.excluded[0].reason,
            ExclusionReason::LostTieBreak {
                rule: TieBreakRule::HigherVersion,
                ..
            }
        ));
    }

    #[test]
    fn direct_reference_wins_over_higher_transitive_version() {
        let graph = graph_from_json(
            r#"{
              "project": {"name": "App", "references": ["A"]},
              "targets": [{"framework": "netcoreapp2.0", "packages": [
                {"name": "A", "version": "1.0.0", "dependencies": ["B"],
                 "files": [{"path": "lib/netstandard1.3/Foo.dll", "kind": "runtime"}]},
                {"name": "B", "version": "2.0.0",
                 "files": [{"path": "lib/netstandard1.3/Foo.dll", "kind": "runtime"}]}
              ]}]
            }"#,
        );
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        let group = &resolution.groups[0];
        assert_eq!(group.kept.package.name, "A");
        assert!(matches!(
            group.excluded[0].reason,
            ExclusionReason::LostTieBreak {
                rule: TieBreakRule::DirectReference,
                ..
            }
        ));
    }

    #[test]
    fn configured_direct_reference_counts_as_direct() {
        let graph = graph_from_json(
            r#"{
              "project": {"name": "App", "references": ["Top"]},
              "targets": [{"framework": "netcoreapp2.0", "packages": [
                {"name": "Top", "version": "1.0.0", "dependencies": ["A", "B"]},
                {"name": "A", "version": "1.0.0",
                 "files": [{"path": "lib/Foo.dll", "kind": "runtime"}]},
                {"name": "B", "version": "2.0.0",
                 "files": [{"path": "lib/Foo.dll", "kind": "runtime"}]}
              ]}]
            }"#,
        );
        let options = ResolverOptions {
            direct_references: vec!["a".to_string()],
            ..ResolverOptions::default()
        };
        let resolution = resolve_target(only_target(&graph), &options).unwrap();
        assert_eq!(resolution.groups[0].kept.package.name, "A");
    }

    #[test]
    fn singleton_groups_are_kept_unconditionally() {
        let graph = graph_from_json(TWO_FOOS);
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        let bar = resolution
            .groups
            .iter()
            .find(|g| g.key.key == "bar")
            .unwrap();
        assert!(!bar.is_conflict());
        assert_eq!(bar.len(), 1);
        assert_eq!(resolution.conflicts().count(), 1);
    }

    #[test]
    fn every_group_has_exactly_one_winner() {
        let graph = graph_from_json(TWO_FOOS);
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        let total_files: usize = only_target(&graph)
            .all_packages()
            .map(|p| p.files().len())
            .sum();
        let accounted: usize = resolution.groups.iter().map(|g| g.len()).sum();
        assert_eq!(accounted, total_files);
        assert_eq!(resolution.kept().count(), resolution.groups.len());
    }

    #[test]
    fn native_duplicates_across_packages_are_trimmed() {
        let graph = graph_from_json(
            r#"{
              "project": {"name": "App", "references": ["A", "B"]},
              "targets": [{"framework": "netcoreapp2.0", "runtime": "win-x64", "packages": [
                {"name": "A", "version": "1.0.0",
                 "files": [{"path": "runtimes/win-x64/native/sni.dll", "kind": "native", "destination": "sni.dll"}]},
                {"name": "B", "version": "1.0.0",
                 "files": [{"path": "runtimes/win/native/SNI.dll", "kind": "native", "destination": "SNI.dll"}]}
              ]}]
            }"#,
        );
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        assert_eq!(resolution.groups.len(), 1);
        let group = &resolution.groups[0];
        assert_eq!(group.key.kind, AssetKind::Native);
        assert_eq!(group.kept.package.name, "A");
        assert!(matches!(
            group.excluded[0].reason,
            ExclusionReason::LostTieBreak {
                rule: TieBreakRule::PackageName,
                ..
            }
        ));

        let sensitive = ResolverOptions {
            native_keys_case_sensitive: true,
            ..ResolverOptions::default()
        };
        let resolution = resolve_target(only_target(&graph), &sensitive).unwrap();
        assert_eq!(resolution.groups.len(), 2);
    }

    #[test]
    fn closer_framework_wins_when_versions_tie() {
        let graph = graph_from_json(
            r#"{
              "project": {"name": "App", "references": ["A", "B"]},
              "targets": [{"framework": "netcoreapp2.0", "packages": [
                {"name": "A", "version": "4.3.0",
                 "files": [{"path": "lib/netstandard1.0/Foo.dll", "kind": "runtime", "framework": "netstandard1.0"}]},
                {"name": "B", "version": "4.3.0",
                 "files": [{"path": "lib/netcoreapp2.0/Foo.dll", "kind": "runtime", "framework": "netcoreapp2.0"}]}
              ]}]
            }"#,
        );
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        assert_eq!(resolution.groups[0].kept.package.name, "B");
    }

    #[test]
    fn full_tie_without_name_rule_is_unresolvable() {
        let graph = graph_from_json(TWO_FOOS.replace("2.0.0", "1.0.0").as_str());
        let options = ResolverOptions {
            tie_break: vec![TieBreakRule::DirectReference, TieBreakRule::HigherVersion],
            ..ResolverOptions::default()
        };
        let err = resolve_target(only_target(&graph), &options).unwrap_err();
        match err {
            DepsmithError::UnresolvableConflict {
                target,
                key,
                packages,
            } => {
                assert_eq!(target, ".NETCoreApp,Version=v2.0");
                assert_eq!(key, "runtime:foo");
                assert_eq!(packages, vec!["A/1.0.0", "B/1.0.0"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_package_duplicates_keep_earliest_path() {
        let graph = graph_from_json(
            r#"{
              "project": {"name": "App", "references": ["A"]},
              "targets": [{"framework": "netcoreapp2.0", "packages": [
                {"name": "A", "version": "1.0.0",
                 "files": [{"path": "lib/b/Foo.dll", "kind": "runtime"},
                           {"path": "lib/a/Foo.dll", "kind": "runtime"}]}
              ]}]
            }"#,
        );
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        let group = &resolution.groups[0];
        assert_eq!(group.kept.file.path, "lib/a/Foo.dll");
        assert_eq!(
            group.excluded[0].reason,
            ExclusionReason::SamePackageDuplicate {
                kept_path: "lib/a/Foo.dll".to_string()
            }
        );
    }

    #[test]
    fn disabled_handling_keeps_everything() {
        let graph = graph_from_json(TWO_FOOS);
        let options = ResolverOptions {
            handle_conflicts: false,
            ..ResolverOptions::default()
        };
        let resolution = resolve_target(only_target(&graph), &options).unwrap();
        assert_eq!(resolution.groups.len(), 3);
        assert_eq!(resolution.excluded_count(), 0);
    }

    #[test]
    fn project_files_take_part_and_win_as_direct() {
        let graph = graph_from_json(
            r#"{
              "project": {"name": "App", "files": [{"path": "App.dll", "kind": "runtime"}]},
              "targets": [{"framework": "netcoreapp2.0", "packages": [
                {"name": "App.Shim", "version": "9.0.0",
                 "files": [{"path": "lib/App.dll", "kind": "runtime"}]}
              ]}]
            }"#,
        );
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        assert_eq!(resolution.groups[0].kept.package.name, "App");
    }

    const WITH_PLATFORM: &str = r#"{
      "project": {"name": "App", "references": ["Microsoft.NETCore.App", "A"]},
      "targets": [{"framework": "netcoreapp2.0", "packages": [
        {"name": "Microsoft.NETCore.App", "version": "2.0.0",
         "files": [{"path": "ref/netcoreapp2.0/System.Buffers.dll", "kind": "runtime"},
                   {"path": "ref/netcoreapp2.0/System.Runtime.dll", "kind": "runtime"}]},
        {"name": "A", "version": "9.0.0",
         "files": [{"path": "lib/netstandard2.0/System.Buffers.dll", "kind": "runtime"},
                   {"path": "lib/netstandard2.0/A.dll", "kind": "runtime"}]}
      ]}]
    }"#;

    #[test]
    fn platform_files_win_over_any_package() {
        let graph = graph_from_json(WITH_PLATFORM);
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        let buffers = resolution
            .groups
            .iter()
            .find(|g| g.key.key == "system.buffers")
            .unwrap();
        assert!(buffers.is_platform());
        assert_eq!(buffers.kept.package.name, "Microsoft.NETCore.App");
        assert_eq!(
            buffers.excluded[0].reason.to_string(),
            "provided by platform Microsoft.NETCore.App/2.0.0"
        );

        let a = resolution.groups.iter().find(|g| g.key.key == "a").unwrap();
        assert!(!a.is_platform());
    }

    #[test]
    fn platform_can_be_configured_away() {
        let graph = graph_from_json(WITH_PLATFORM);
        let options = ResolverOptions {
            platform_packages: Vec::new(),
            ..ResolverOptions::default()
        };
        let resolution = resolve_target(only_target(&graph), &options).unwrap();
        let buffers = resolution
            .groups
            .iter()
            .find(|g| g.key.key == "system.buffers")
            .unwrap();
        assert_eq!(buffers.kept.package.name, "A");
        assert!(resolution.groups.iter().all(|g| !g.is_platform()));
    }

    #[test]
    fn report_lists_conflicts() {
        let graph = graph_from_json(TWO_FOOS);
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        let report = resolution.report();
        assert_eq!(report.len(), 1);
        let s = report.to_string();
        assert!(s.contains("File conflicts in .NETCoreApp,Version=v2.0 (1):"), "got: {s}");
        assert!(s.contains("runtime:foo kept B/2.0.0"), "got: {s}");
        assert!(s.contains("dropped A/1.0.0 (lib/netstandard1.3/Foo.dll): higher-version: B/2.0.0 wins"), "got: {s}");
    }

    #[test]
    fn empty_report() {
        let graph = graph_from_json(r#"{"project": {"name": "App"}, "targets": [{"framework": "net461"}]}"#);
        let resolution = resolve_target(only_target(&graph), &ResolverOptions::default()).unwrap();
        let report = resolution.report();
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "No file conflicts in .NETFramework,Version=v4.6.1.\n");
    }
}
