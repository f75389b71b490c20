//! The per-target runtime manifest built from a conflict resolution.

use std::fmt;

use depsmith_core::asset::{AssetKey, AssetKind, ContributedFile, KeyPolicy};
use depsmith_core::graph::TargetGraph;
use depsmith_core::package::PackageKind;
use depsmith_core::target::Target;

use crate::conflict::TargetResolution;

/// One file the host loads at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub package: String,
    pub version: String,
    pub package_kind: PackageKind,
    pub kind: AssetKind,
    /// Package-relative path.
    pub path: String,
    pub destination: Option<String>,
    pub culture: Option<String>,
    pub key: AssetKey,
}

impl ManifestEntry {
    pub fn from_file(
        version: impl Into<String>,
        package_kind: PackageKind,
        file: &ContributedFile,
        policy: KeyPolicy,
    ) -> Self {
        Self {
            package: file.package.clone(),
            version: version.into(),
            package_kind,
            kind: file.kind,
            path: file.path.clone(),
            destination: file.destination.clone(),
            culture: file.culture.clone(),
            key: file.logical_key(policy),
        }
    }

    /// The contributed file this entry was produced from, minus its framework.
    pub fn to_file(&self) -> ContributedFile {
        let mut file = ContributedFile::new(&self.package, self.kind, &self.path);
        if let Some(dest) = &self.destination {
            file = file.with_destination(dest);
        }
        if let Some(culture) = &self.culture {
            file = file.with_culture(culture);
        }
        file
    }

    /// `name/version` of the owning package.
    pub fn library(&self) -> String {
        format!("{}/{}", self.package, self.version)
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.kind, self.package, self.version, self.path)
    }
}

/// Ordered runtime assemblies, native assets, and resource assemblies for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub target: Target,
    pub runtime_assemblies: Vec<ManifestEntry>,
    pub native_assets: Vec<ManifestEntry>,
    pub resources: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            runtime_assemblies: Vec::new(),
            native_assets: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Route an entry to its section. Returns false for `other` files, which
    /// are not part of a manifest.
    pub fn push(&mut self, entry: ManifestEntry) -> bool {
        let section = match entry.kind {
            AssetKind::Runtime => &mut self.runtime_assemblies,
            AssetKind::Native => &mut self.native_assets,
            AssetKind::Resource => &mut self.resources,
            AssetKind::Other => return false,
        };
        section.push(entry);
        true
    }

    /// Put every section into canonical order: package name, then path.
    pub fn sort(&mut self) {
        for section in [
            &mut self.runtime_assemblies,
            &mut self.native_assets,
            &mut self.resources,
        ] {
            section.sort_by(|a, b| {
                a.package
                    .to_ascii_lowercase()
                    .cmp(&b.package.to_ascii_lowercase())
                    .then_with(|| a.path.cmp(&b.path))
            });
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.runtime_assemblies
            .iter()
            .chain(&self.native_assets)
            .chain(&self.resources)
    }

    pub fn len(&self) -> usize {
        self.runtime_assemblies.len() + self.native_assets.len() + self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// SHA-256 over the target and every entry, in order.
    pub fn fingerprint(&self) -> String {
        let header = self.target.to_string();
        depsmith_util::hash::sha256_lines(
            std::iter::once(header).chain(self.entries().map(|e| e.to_string())),
        )
    }
}

/// Build the manifest for one target from its kept candidates. Keys won by a
/// platform package are served by the host and get no entry.
pub fn build_manifest(graph: &TargetGraph, resolution: &TargetResolution) -> Manifest {
    let mut manifest = Manifest::new(resolution.target.clone());
    for group in resolution.groups.iter().filter(|g| !g.is_platform()) {
        let kept = &group.kept;
        let package_kind = graph
            .package(&kept.package.name)
            .map_or(PackageKind::Package, |p| p.kind);
        let entry = ManifestEntry {
            package: kept.package.name.clone(),
            version: kept.package.version.to_string(),
            package_kind,
            kind: kept.file.kind,
            path: kept.file.path.clone(),
            destination: kept.file.destination.clone(),
            culture: kept.file.culture.clone(),
            key: group.key.clone(),
        };
        manifest.push(entry);
    }
    manifest.sort();
    tracing::debug!(
        target_id = %manifest.target,
        runtime = manifest.runtime_assemblies.len(),
        native = manifest.native_assets.len(),
        resources = manifest.resources.len(),
        "built manifest"
    );
    manifest
}
