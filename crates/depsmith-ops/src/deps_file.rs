//! The `<project>.deps.json` file: serialized runtime manifests.

use std::collections::BTreeMap;
use std::path::Path;

use depsmith_core::asset::{AssetKind, ContributedFile, KeyPolicy};
use depsmith_core::package::{PackageId, PackageKind};
use depsmith_core::target::Target;
use depsmith_resolver::manifest::{Manifest, ManifestEntry};
use depsmith_util::errors::DepsmithError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepsFile {
    pub runtime_target: RuntimeTarget,
    /// Target name → `name/version` → assets.
    #[serde(default)]
    pub targets: BTreeMap<String, BTreeMap<String, TargetLibrary>>,
    #[serde(default)]
    pub libraries: BTreeMap<String, Library>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeTarget {
    pub name: String,
}

/// The assets one library contributes to one target, keyed by package path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetLibrary {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub runtime: BTreeMap<String, AssetEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub native: BTreeMap<String, AssetEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, AssetEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(rename = "type")]
    pub kind: String,
}

impl DepsFile {
    /// Serialize manifests. The first manifest names the runtime target.
    pub fn from_manifests<'m>(
        project: &PackageId,
        manifests: impl IntoIterator<Item = &'m Manifest>,
    ) -> Self {
        let mut file = DepsFile {
            runtime_target: RuntimeTarget::default(),
            targets: BTreeMap::new(),
            libraries: BTreeMap::new(),
        };
        file.libraries.insert(
            project.to_string(),
            Library {
                kind: PackageKind::Project.as_str().to_string(),
            },
        );

        for manifest in manifests {
            let target_name = manifest.target.to_string();
            if file.runtime_target.name.is_empty() {
                file.runtime_target.name = target_name.clone();
            }
            let libraries = file.targets.entry(target_name).or_default();
            for entry in manifest.entries() {
                let library = entry.library();
                file.libraries
                    .entry(library.clone())
                    .or_insert_with(|| Library {
                        kind: entry.package_kind.as_str().to_string(),
                    });
                let assets = libraries.entry(library).or_default();
                let section = match entry.kind {
                    AssetKind::Runtime => &mut assets.runtime,
                    AssetKind::Native => &mut assets.native,
                    AssetKind::Resource => &mut assets.resources,
                    AssetKind::Other => continue,
                };
                section.insert(
                    entry.path.clone(),
                    AssetEntry {
                        destination: entry.destination.clone(),
                        locale: entry.culture.clone(),
                    },
                );
            }
        }
        file
    }

    /// Rebuild manifests, recomputing logical keys under `policy`.
    pub fn to_manifests(&self, policy: KeyPolicy) -> Result<Vec<Manifest>, DepsmithError> {
        let mut manifests = Vec::with_capacity(self.targets.len());
        for (target_name, libraries) in &self.targets {
            let target = Target::parse(target_name).ok_or_else(|| DepsmithError::Generic {
                message: format!("deps file names an invalid target `{target_name}`"),
            })?;
            let mut manifest = Manifest::new(target);
            for (library, assets) in libraries {
                let (name, version) = library.split_once('/').ok_or_else(|| {
                    DepsmithError::Generic {
                        message: format!("deps file library `{library}` is not `name/version`"),
                    }
                })?;
                let package_kind = match self.libraries.get(library) {
                    Some(lib) if lib.kind == PackageKind::Project.as_str() => PackageKind::Project,
                    _ => PackageKind::Package,
                };
                for (kind, section) in [
                    (AssetKind::Runtime, &assets.runtime),
                    (AssetKind::Native, &assets.native),
                    (AssetKind::Resource, &assets.resources),
                ] {
                    for (path, asset) in section {
                        let mut file = ContributedFile::new(name, kind, path.as_str());
                        if let Some(dest) = &asset.destination {
                            file = file.with_destination(dest.as_str());
                        }
                        if let Some(locale) = &asset.locale {
                            file = file.with_culture(locale.as_str());
                        }
                        manifest.push(ManifestEntry::from_file(version, package_kind, &file, policy));
                    }
                }
            }
            manifest.sort();
            manifests.push(manifest);
        }
        Ok(manifests)
    }

    pub fn from_path(path: &Path) -> Result<Self, DepsmithError> {
        let content = std::fs::read_to_string(path).map_err(|e| DepsmithError::Generic {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        serde_json::from_str(&content).map_err(|e| DepsmithError::Generic {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the deps file, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<(), DepsmithError> {
        let json = self.to_json_pretty().map_err(|e| DepsmithError::Generic {
            message: format!("Failed to serialize deps file: {e}"),
        })?;
        depsmith_util::fs::write_with_parents(path, format!("{json}\n").as_bytes())?;
        Ok(())
    }
}

/// `<project>.deps.json`
pub fn deps_file_name(project: &PackageId) -> String {
    format!("{}.deps.json", project.name)
}
