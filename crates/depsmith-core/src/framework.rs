//! Target framework monikers and framework compatibility.
//!
//! Accepts the short folder form used inside packages (`netcoreapp2.0`,
//! `netstandard1.3`, `net461`, `net5.0`) as well as the long form that
//! restore writes into target definitions (`.NETCoreApp,Version=v1.1`).

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const NETCOREAPP: &str = ".NETCoreApp";
pub const NETSTANDARD: &str = ".NETStandard";
pub const NETFRAMEWORK: &str = ".NETFramework";

/// Known identifiers compare case-insensitively and are stored in their
/// canonical spelling.
fn canonical_identifier(identifier: &str) -> String {
    [NETCOREAPP, NETSTANDARD, NETFRAMEWORK]
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(identifier))
        .unwrap_or(identifier)
        .to_string()
}

/// A `major.minor.patch` framework version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameworkVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FrameworkVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    fn parse_dotted(s: &str) -> Option<Self> {
        let mut parts = [0u32; 3];
        let mut count = 0;
        for piece in s.split('.') {
            if count == parts.len() {
                return None;
            }
            parts[count] = piece.parse().ok()?;
            count += 1;
        }
        Some(Self::new(parts[0], parts[1], parts[2]))
    }

    /// `461` → 4.6.1, `45` → 4.5, `4` → 4.0.
    fn parse_compact(s: &str) -> Option<Self> {
        if s.is_empty() || s.len() > 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits: Vec<u32> = s.bytes().map(|b| u32::from(b - b'0')).collect();
        Some(Self::new(
            digits[0],
            digits.get(1).copied().unwrap_or(0),
            digits.get(2).copied().unwrap_or(0),
        ))
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.patch != 0 {
            write!(f, ".{}", self.patch)?;
        }
        Ok(())
    }
}

/// A target framework: identifier plus version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameworkMoniker {
    identifier: String,
    version: FrameworkVersion,
}

impl FrameworkMoniker {
    pub fn new(identifier: impl AsRef<str>, version: FrameworkVersion) -> Self {
        Self {
            identifier: canonical_identifier(identifier.as_ref()),
            version,
        }
    }

    /// Parse a short (`netcoreapp2.0`) or long (`.NETCoreApp,Version=v2.0`) moniker.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Some((identifier, rest)) = s.split_once(",Version=") {
            let identifier = identifier.trim();
            if identifier.is_empty() {
                return None;
            }
            // Anything after another comma is a profile, which does not affect identity.
            let version = rest.split(',').next().unwrap_or(rest).trim();
            let version = version.strip_prefix('v').unwrap_or(version);
            return Some(Self::new(identifier, FrameworkVersion::parse_dotted(version)?));
        }
        Self::parse_short(s)
    }

    fn parse_short(s: &str) -> Option<Self> {
        let lower = s.to_ascii_lowercase();
        // `net5.0-windows`: the platform suffix is not part of the framework.
        let lower = lower.split('-').next().unwrap_or(&lower);
        if let Some(v) = lower.strip_prefix("netcoreapp") {
            return Some(Self::new(NETCOREAPP, FrameworkVersion::parse_dotted(v)?));
        }
        if let Some(v) = lower.strip_prefix("netstandard") {
            return Some(Self::new(NETSTANDARD, FrameworkVersion::parse_dotted(v)?));
        }
        let v = lower.strip_prefix("net")?;
        if v.contains('.') {
            let version = FrameworkVersion::parse_dotted(v)?;
            let identifier = if version.major >= 5 {
                NETCOREAPP
            } else {
                NETFRAMEWORK
            };
            return Some(Self::new(identifier, version));
        }
        Some(Self::new(NETFRAMEWORK, FrameworkVersion::parse_compact(v)?))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn version(&self) -> FrameworkVersion {
        self.version
    }

    /// The short folder name, e.g. `netcoreapp2.0` or `net461`.
    pub fn short_name(&self) -> String {
        let v = self.version;
        match self.identifier.as_str() {
            NETCOREAPP if v.major >= 5 => format!("net{v}"),
            NETCOREAPP => format!("netcoreapp{v}"),
            NETSTANDARD => format!("netstandard{v}"),
            NETFRAMEWORK if v.patch != 0 => format!("net{}{}{}", v.major, v.minor, v.patch),
            NETFRAMEWORK => format!("net{}{}", v.major, v.minor),
            _ => self.to_string(),
        }
    }

    /// Highest .NETStandard version this framework implements, if any.
    pub fn netstandard_support(&self) -> Option<FrameworkVersion> {
        let v = self.version;
        match self.identifier.as_str() {
            NETCOREAPP if v.major >= 3 => Some(FrameworkVersion::new(2, 1, 0)),
            NETCOREAPP if v.major == 2 => Some(FrameworkVersion::new(2, 0, 0)),
            NETCOREAPP => Some(FrameworkVersion::new(1, 6, 0)),
            NETFRAMEWORK if v >= FrameworkVersion::new(4, 6, 1) => {
                Some(FrameworkVersion::new(2, 0, 0))
            }
            NETFRAMEWORK if v >= FrameworkVersion::new(4, 6, 0) => {
                Some(FrameworkVersion::new(1, 3, 0))
            }
            NETFRAMEWORK if v >= FrameworkVersion::new(4, 5, 1) => {
                Some(FrameworkVersion::new(1, 2, 0))
            }
            NETFRAMEWORK if v >= FrameworkVersion::new(4, 5, 0) => {
                Some(FrameworkVersion::new(1, 1, 0))
            }
            _ => None,
        }
    }
}

impl fmt::Display for FrameworkMoniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},Version=v{}", self.identifier, self.version)
    }
}

impl TryFrom<String> for FrameworkMoniker {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("invalid target framework `{s}`"))
    }
}

impl From<FrameworkMoniker> for String {
    fn from(f: FrameworkMoniker) -> Self {
        f.to_string()
    }
}

/// How closely an asset's framework matches the consuming target. Lower is closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Proximity {
    tier: u32,
    distance: Reverse<FrameworkVersion>,
}

impl Proximity {
    fn ranked(tier: u32) -> Self {
        Self {
            tier,
            distance: Reverse(FrameworkVersion::default()),
        }
    }

    fn versioned(tier: u32, asset: FrameworkVersion) -> Self {
        Self {
            tier,
            distance: Reverse(asset),
        }
    }
}

/// Per-target ordered lists of compatible frameworks, nearest first.
///
/// Targets without an entry fall back to the built-in rules: the same
/// framework family at or below the target version, then the .NETStandard
/// versions the target implements.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityTable {
    entries: BTreeMap<FrameworkMoniker, Vec<FrameworkMoniker>>,
}

impl CompatibilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from the `[compatibility]` section of `depsmith.toml`.
    pub fn from_strings(raw: &BTreeMap<String, Vec<String>>) -> Result<Self, String> {
        let mut table = Self::new();
        for (target, compatible) in raw {
            let target = FrameworkMoniker::parse(target)
                .ok_or_else(|| format!("invalid target framework `{target}`"))?;
            let compatible = compatible
                .iter()
                .map(|c| {
                    FrameworkMoniker::parse(c)
                        .ok_or_else(|| format!("invalid compatible framework `{c}`"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            table.insert(target, compatible);
        }
        Ok(table)
    }

    pub fn insert(&mut self, target: FrameworkMoniker, compatible: Vec<FrameworkMoniker>) {
        self.entries.insert(target, compatible);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank `asset` for consumption by `target`, or `None` if incompatible.
    pub fn proximity(&self, target: &FrameworkMoniker, asset: &FrameworkMoniker) -> Option<Proximity> {
        if let Some(list) = self.entries.get(target) {
            return list
                .iter()
                .position(|f| f == asset)
                .map(|i| Proximity::ranked(i as u32));
        }
        if asset.identifier == target.identifier && asset.version <= target.version {
            return Some(Proximity::versioned(0, asset.version));
        }
        match target.netstandard_support() {
            Some(max) if asset.identifier == NETSTANDARD && asset.version <= max => {
                Some(Proximity::versioned(1, asset.version))
            }
            _ => None,
        }
    }
}
