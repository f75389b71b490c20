use std::fmt;

use crate::framework::FrameworkMoniker;

/// A resolution scope: a framework plus an optional runtime identifier.
///
/// Ordering puts the ridless target of a framework before its
/// runtime-specific targets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target {
    pub framework: FrameworkMoniker,
    pub runtime: Option<String>,
}

impl Target {
    pub fn new(framework: FrameworkMoniker, runtime: Option<String>) -> Self {
        Self { framework, runtime }
    }

    /// A target with no runtime identifier.
    pub fn ridless(framework: FrameworkMoniker) -> Self {
        Self {
            framework,
            runtime: None,
        }
    }

    pub fn is_ridless(&self) -> bool {
        self.runtime.is_none()
    }

    /// Parse `framework` or `framework/rid`.
    pub fn parse(s: &str) -> Option<Self> {
        let (framework, runtime) = match s.rsplit_once('/') {
            Some((fw, rid)) if !rid.trim().is_empty() => (fw, Some(rid.trim().to_string())),
            Some(_) => return None,
            None => (s, None),
        };
        Some(Self::new(FrameworkMoniker::parse(framework)?, runtime))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.runtime {
            Some(rid) => write!(f, "{}/{rid}", self.framework),
            None => write!(f, "{}", self.framework),
        }
    }
}
