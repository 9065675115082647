use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// A single Go module dependency.
///
/// Identity is the `(path, version)` pair; `indirect` and `hash` are carried
/// along for reporting but do not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Import path, such as `github.com/spf13/cobra`.
    pub path: String,
    /// Version like `v1.2.3`.
    pub version: String,
    #[serde(default)]
    pub indirect: bool,
    /// go.sum hash such as `h1:abcd1234`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Module {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            indirect: false,
            hash: None,
        }
    }

    /// Copy of this module pointing at another import path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.version == other.version
    }
}

impl Eq for Module {}

impl Hash for Module {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.version.hash(state);
    }
}

impl PartialOrd for Module {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Module {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.path, &self.version).cmp(&(&other.path, &other.version))
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.path, self.version)
    }
}

/// A resolved license. `spdx` is empty when only a free-text name is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub spdx: String,
}

impl License {
    pub fn new(name: impl Into<String>, spdx: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spdx: spdx.into(),
        }
    }
}

impl std::fmt::Display for License {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.spdx.is_empty() || self.spdx == self.name {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.spdx)
        }
    }
}

/// Result of running a finder (or the whole finder chain) for one module.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Found(License),
    NotFound,
    Failed(LookupError),
}

impl Outcome {
    pub fn license(&self) -> Option<&License> {
        match self {
            Outcome::Found(license) => Some(license),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyVerdict {
    Allowed,
    Denied,
    Unknown,
}

impl std::fmt::Display for PolicyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyVerdict::Allowed => write!(f, "allowed"),
            PolicyVerdict::Denied => write!(f, "denied"),
            PolicyVerdict::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LicenseRisk {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Unknown,
}

impl std::fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseRisk::Permissive => write!(f, "Permissive"),
            LicenseRisk::WeakCopyleft => write!(f, "Weak Copyleft"),
            LicenseRisk::StrongCopyleft => write!(f, "Strong Copyleft"),
            LicenseRisk::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Final record for one module, as aggregated by the report sinks.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub module: Module,
    pub outcome: Outcome,
    pub verdict: PolicyVerdict,
}

impl Resolution {
    pub fn new(module: Module, outcome: Outcome, verdict: PolicyVerdict) -> Self {
        Self {
            module,
            outcome,
            verdict,
        }
    }

    pub fn license(&self) -> Option<&License> {
        self.outcome.license()
    }

    pub fn error(&self) -> Option<&LookupError> {
        match &self.outcome {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_module_identity_ignores_indirect_and_hash() {
        let a = Module::new("github.com/foo/bar", "v1.0.0");
        let mut b = a.clone();
        b.indirect = true;
        b.hash = Some("h1:abc".to_string());
        assert_eq!(a, b);

        let set: HashSet<Module> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_module_version_is_part_of_identity() {
        let a = Module::new("github.com/foo/bar", "v1.0.0");
        let b = Module::new("github.com/foo/bar", "v1.1.0");
        assert_ne!(a, b);
    }

    #[test]
    fn test_with_path_leaves_original_untouched() {
        let m = Module::new("gopkg.in/yaml.v2", "v2.4.0");
        let t = m.with_path("github.com/go-yaml/yaml");
        assert_eq!(m.path, "gopkg.in/yaml.v2");
        assert_eq!(t.path, "github.com/go-yaml/yaml");
        assert_eq!(t.version, "v2.4.0");
    }

    #[test]
    fn test_license_display() {
        assert_eq!(License::new("MIT", "MIT").to_string(), "MIT");
        assert_eq!(
            License::new("MIT License", "MIT").to_string(),
            "MIT License (MIT)"
        );
        assert_eq!(License::new("Custom", "").to_string(), "Custom");
    }
}
