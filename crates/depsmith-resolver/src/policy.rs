//! The tie-break pipeline: an ordered list of total-order comparators.
//!
//! Each comparator returns `Ordering::Less` when its first argument is the
//! preferred candidate. The pipeline applies them left to right and stops at
//! the first one that distinguishes the two candidates.

use std::cmp::Ordering;
use std::fmt;

use depsmith_core::asset::ContributedFile;
use depsmith_core::config::{ResolverOptions, TieBreakRule};
use depsmith_core::framework::Proximity;
use depsmith_core::graph::TargetGraph;
use depsmith_core::package::{Package, PackageId};

/// One contributed file competing for a logical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub package: PackageId,
    pub file: ContributedFile,
    /// The owning package is the project or one of its direct references.
    pub direct: bool,
    /// The owning package is provided by the host platform.
    pub platform: bool,
    /// Framework match against the target; `None` when unknown or incompatible.
    pub proximity: Option<Proximity>,
}

impl Candidate {
    pub fn new(
        graph: &TargetGraph,
        package: &Package,
        file: &ContributedFile,
        options: &ResolverOptions,
    ) -> Self {
        let target_framework = &graph.target().framework;
        let proximity = file
            .framework
            .as_ref()
            .and_then(|fw| options.compatibility.proximity(target_framework, fw));
        Self {
            package: package.id.clone(),
            file: file.clone(),
            direct: graph.is_direct(package.name()) || options.is_configured_direct(package.name()),
            platform: !package.is_project() && options.is_platform(package.name()),
            proximity,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.package, self.file.path)
    }
}

/// A single comparator in the pipeline.
pub trait TieBreak: Send + Sync {
    fn rule(&self) -> TieBreakRule;

    /// `Less` when `a` should be kept over `b`.
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering;
}

pub struct DirectReference;

impl TieBreak for DirectReference {
    fn rule(&self) -> TieBreakRule {
        TieBreakRule::DirectReference
    }

    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        b.direct.cmp(&a.direct)
    }
}

pub struct HigherVersion;

impl TieBreak for HigherVersion {
    fn rule(&self) -> TieBreakRule {
        TieBreakRule::HigherVersion
    }

    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        b.package.version.cmp(&a.package.version)
    }
}

pub struct FrameworkProximity;

impl TieBreak for FrameworkProximity {
    fn rule(&self) -> TieBreakRule {
        TieBreakRule::FrameworkProximity
    }

    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        match (&a.proximity, &b.proximity) {
            (Some(pa), Some(pb)) => pa.cmp(pb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

pub struct PackageName;

impl TieBreak for PackageName {
    fn rule(&self) -> TieBreakRule {
        TieBreakRule::PackageName
    }

    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        a.package.key().cmp(&b.package.key())
    }
}

/// Comparators applied in configured order.
pub struct TieBreakPipeline {
    steps: Vec<Box<dyn TieBreak>>,
}

impl TieBreakPipeline {
    pub fn from_rules(rules: &[TieBreakRule]) -> Self {
        let steps = rules
            .iter()
            .map(|rule| -> Box<dyn TieBreak> {
                match rule {
                    TieBreakRule::DirectReference => Box::new(DirectReference),
                    TieBreakRule::HigherVersion => Box::new(HigherVersion),
                    TieBreakRule::FrameworkProximity => Box::new(FrameworkProximity),
                    TieBreakRule::PackageName => Box::new(PackageName),
                }
            })
            .collect();
        Self { steps }
    }

    /// Append a custom comparator after the configured ones.
    pub fn push(&mut self, step: Box<dyn TieBreak>) {
        self.steps.push(step);
    }

    pub fn rules(&self) -> Vec<TieBreakRule> {
        self.steps.iter().map(|s| s.rule()).collect()
    }

    /// The first rule that distinguishes `a` from `b`, with its verdict.
    pub fn decide(&self, a: &Candidate, b: &Candidate) -> Option<(Ordering, TieBreakRule)> {
        self.steps.iter().find_map(|step| match step.compare(a, b) {
            Ordering::Equal => None,
            ord => Some((ord, step.rule())),
        })
    }

    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        self.decide(a, b).map_or(Ordering::Equal, |(ord, _)| ord)
    }
}

impl Default for TieBreakPipeline {
    fn default() -> Self {
        Self::from_rules(&TieBreakRule::default_order())
    }
}

impl fmt::Debug for TieBreakPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depsmith_core::asset::AssetKind;
    use depsmith_core::framework::{CompatibilityTable, FrameworkMoniker};
    use depsmith_core::version::PackageVersion;

    fn candidate(name: &str, version: &str, direct: bool, fw: Option<&str>) -> Candidate {
        let target = FrameworkMoniker::parse("netcoreapp2.0").unwrap();
        let framework = fw.map(|f| FrameworkMoniker::parse(f).unwrap());
        let proximity = framework
            .as_ref()
            .and_then(|f| CompatibilityTable::default().proximity(&target, f));
        let mut file = ContributedFile::new(name, AssetKind::Runtime, "lib/Foo.dll");
        file.framework = framework;
        Candidate {
            package: PackageId::new(name, PackageVersion::parse(version).unwrap()),
            file,
            direct,
            platform: false,
            proximity,
        }
    }

    #[test]
    fn direct_reference_beats_higher_version() {
        let pipeline = TieBreakPipeline::default();
        let a = candidate("A", "1.0.0", true, None);
        let b = candidate("B", "2.0.0", false, None);
        assert_eq!(
            pipeline.decide(&a, &b),
            Some((Ordering::Less, TieBreakRule::DirectReference))
        );
    }

    #[test]
    fn higher_version_wins_without_direct_distinction() {
        let pipeline = TieBreakPipeline::default();
        let a = candidate("A", "1.0.0", false, None);
        let b = candidate("B", "2.0.0", false, None);
        assert_eq!(
            pipeline.decide(&b, &a),
            Some((Ordering::Less, TieBreakRule::HigherVersion))
        );
        assert_eq!(pipeline.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn closer_framework_breaks_version_ties() {
        let pipeline = TieBreakPipeline::default();
        let near = candidate("A", "1.0.0", false, Some("netstandard2.0"));
        let far = candidate("B", "1.0.0", false, Some("netstandard1.3"));
        let none = candidate("C", "1.0.0", false, None);
        assert_eq!(
            pipeline.decide(&near, &far),
            Some((Ordering::Less, TieBreakRule::FrameworkProximity))
        );
        assert_eq!(pipeline.compare(&far, &none), Ordering::Less);
    }

    #[test]
    fn package_name_is_final_fallback() {
        let pipeline = TieBreakPipeline::default();
        let a = candidate("alpha", "1.0.0", false, None);
        let b = candidate("Beta", "1.0.0", false, None);
        assert_eq!(
            pipeline.decide(&a, &b),
            Some((Ordering::Less, TieBreakRule::PackageName))
        );
    }

    #[test]
    fn identical_candidates_are_undecided() {
        let pipeline = TieBreakPipeline::from_rules(&[TieBreakRule::HigherVersion]);
        let a = candidate("A", "1.0.0", false, None);
        let b = candidate("B", "1.0.0", false, None);
        assert_eq!(pipeline.decide(&a, &b), None);
    }

    #[test]
    fn custom_steps_run_after_configured_rules() {
        struct PreferShortPaths;
        impl TieBreak for PreferShortPaths {
            fn rule(&self) -> TieBreakRule {
                TieBreakRule::PackageName
            }
            fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
                a.file.path.len().cmp(&b.file.path.len())
            }
        }

        let mut pipeline = TieBreakPipeline::from_rules(&[TieBreakRule::HigherVersion]);
        pipeline.push(Box::new(PreferShortPaths));
        let mut a = candidate("A", "1.0.0", false, None);
        a.file.path = "Foo.dll".to_string();
        let b = candidate("B", "1.0.0", false, None);
        assert_eq!(pipeline.compare(&a, &b), Ordering::Less);
        assert_eq!(pipeline.rules().len(), 2);
    }
}
