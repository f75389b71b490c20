use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use depsmith_util::errors::DepsmithError;

use crate::asset::KeyPolicy;
use crate::framework::CompatibilityTable;

/// File name looked up next to (or above) the assets file.
pub const CONFIG_FILE_NAME: &str = "depsmith.toml";

/// The shared framework package a `netcoreapp` host provides at run time.
pub const DEFAULT_PLATFORM_PACKAGE: &str = "Microsoft.NETCore.App";

/// One step of the conflict tie-break pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreakRule {
    /// Prefer files from packages the project references directly.
    DirectReference,
    /// Prefer the higher package version.
    HigherVersion,
    /// Prefer the file built for the framework closest to the target's.
    FrameworkProximity,
    /// Prefer the lexicographically earlier package name.
    PackageName,
}

impl TieBreakRule {
    pub fn default_order() -> Vec<Self> {
        vec![
            Self::DirectReference,
            Self::HigherVersion,
            Self::FrameworkProximity,
            Self::PackageName,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectReference => "direct-reference",
            Self::HigherVersion => "higher-version",
            Self::FrameworkProximity => "framework-proximity",
            Self::PackageName => "package-name",
        }
    }
}

impl fmt::Display for TieBreakRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options passed explicitly into the resolver, from `[resolver]` in `depsmith.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// When false, no file is ever excluded and duplicates reach the manifest.
    #[serde(default = "default_true", rename = "handle-conflicts")]
    pub handle_conflicts: bool,

    #[serde(default, rename = "native-keys-case-sensitive")]
    pub native_keys_case_sensitive: bool,

    /// Resolve targets concurrently.
    #[serde(default = "default_true")]
    pub parallel: bool,

    #[serde(default = "TieBreakRule::default_order", rename = "tie-break")]
    pub tie_break: Vec<TieBreakRule>,

    /// Extra package names treated as direct references.
    #[serde(default, rename = "direct-references")]
    pub direct_references: Vec<String>,

    /// Packages whose files the host already provides. They win every
    /// conflict they take part in and are left out of the manifest.
    #[serde(default = "default_platform_packages", rename = "platform-packages")]
    pub platform_packages: Vec<String>,

    #[serde(skip)]
    pub compatibility: CompatibilityTable,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            handle_conflicts: true,
            native_keys_case_sensitive: false,
            parallel: true,
            tie_break: TieBreakRule::default_order(),
            direct_references: Vec::new(),
            platform_packages: default_platform_packages(),
            compatibility: CompatibilityTable::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_platform_packages() -> Vec<String> {
    vec![DEFAULT_PLATFORM_PACKAGE.to_string()]
}

/// On-disk layout of `depsmith.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    resolver: ResolverOptions,
    #[serde(default)]
    compatibility: BTreeMap<String, Vec<String>>,
}

impl ResolverOptions {
    pub fn key_policy(&self) -> KeyPolicy {
        KeyPolicy {
            native_case_sensitive: self.native_keys_case_sensitive,
        }
    }

    /// Whether `name` was configured as a direct reference.
    pub fn is_configured_direct(&self, name: &str) -> bool {
        self.direct_references
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
    }

    pub fn is_platform(&self, name: &str) -> bool {
        self.platform_packages
            .iter()
            .any(|p| p.eq_ignore_ascii_case(name))
    }

    /// Parse options from TOML text.
    pub fn parse_toml(content: &str) -> Result<Self, DepsmithError> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| DepsmithError::Config {
            message: format!("Failed to parse {CONFIG_FILE_NAME}: {e}"),
        })?;
        let mut options = file.resolver;
        options.compatibility = CompatibilityTable::from_strings(&file.compatibility)
            .map_err(|message| DepsmithError::Config { message })?;
        options.check()?;
        Ok(options)
    }

    /// Load options from a file.
    pub fn from_path(path: &Path) -> Result<Self, DepsmithError> {
        let content = std::fs::read_to_string(path).map_err(|e| DepsmithError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Find `depsmith.toml` in `start` or an ancestor, or return defaults.
    pub fn discover(start: &Path) -> Result<(Self, Option<PathBuf>), DepsmithError> {
        match depsmith_util::fs::find_ancestor_with(start, CONFIG_FILE_NAME) {
            Some(dir) => {
                let path = dir.join(CONFIG_FILE_NAME);
                tracing::debug!(path = %path.display(), "using resolver configuration");
                Ok((Self::from_path(&path)?, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    fn check(&self) -> Result<(), DepsmithError> {
        if self.tie_break.is_empty() {
            return Err(DepsmithError::Config {
                message: "tie-break must list at least one rule".to_string(),
            });
        }
        for (i, rule) in self.tie_break.iter().enumerate() {
            if self.tie_break[..i].contains(rule) {
                return Err(DepsmithError::Config {
                    message: format!("tie-break rule `{rule}` is listed twice"),
                });
            }
        }
        Ok(())
    }
}
