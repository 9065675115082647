use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use serde::Deserialize;

use crate::models::{License, Outcome, PolicyVerdict};

/// Root configuration structure, deserialized from `.modlicense/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Glob patterns of licenses (SPDX id or name) that are allowed.
    #[serde(default)]
    pub allow: Vec<String>,
    /// Glob patterns of licenses that are denied. Checked before `allow`.
    #[serde(default)]
    pub deny: Vec<String>,
    /// Module path (or path prefix) → replacement path, tried before any
    /// built-in translator.
    #[serde(default)]
    pub translate: HashMap<String, String>,
    /// Module path → license, skipping every remote lookup.
    #[serde(default, rename = "override")]
    pub overrides: HashMap<String, String>,

    #[serde(skip)]
    allow_patterns: Vec<Pattern>,
    #[serde(skip)]
    deny_patterns: Vec<Pattern>,
}

impl Config {
    /// Build a policy from allow/deny patterns, validating every pattern.
    #[cfg(test)]
    pub fn new(allow: Vec<String>, deny: Vec<String>) -> Result<Self> {
        Config {
            allow,
            deny,
            ..Default::default()
        }
        .compiled()
    }

    /// Parse and validate a TOML policy document.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.compiled()
    }

    fn compiled(mut self) -> Result<Self> {
        self.allow_patterns = compile_all(&self.allow).context("invalid `allow` pattern")?;
        self.deny_patterns = compile_all(&self.deny).context("invalid `deny` pattern")?;

        for (from, to) in &self.translate {
            if from.trim().is_empty() || to.trim().is_empty() {
                bail!("`translate` entries need a non-empty path on both sides");
            }
        }
        for (path, license) in &self.overrides {
            if license.trim().is_empty() {
                bail!("`override` for {:?} names no license", path);
            }
        }
        Ok(self)
    }

    fn denies(&self, license: &License) -> bool {
        self.deny_patterns.iter().any(|p| p.matches_license(license))
    }

    fn allows(&self, license: &License) -> bool {
        self.allow_patterns.iter().any(|p| p.matches_license(license))
    }
}

/// A `*` / `?` glob over a license id or name, matched case-insensitively
/// against the whole value.
#[derive(Debug, Clone)]
struct Pattern {
    matcher: GlobMatcher,
}

impl Pattern {
    fn new(glob: &str) -> Result<Self> {
        let glob = glob.trim();
        if glob.is_empty() {
            bail!("empty pattern");
        }

        let matcher = GlobBuilder::new(glob)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("pattern {:?}", glob))?
            .compile_matcher();
        Ok(Self { matcher })
    }

    fn matches(&self, value: &str) -> bool {
        !value.is_empty() && self.matcher.is_match(value)
    }

    /// A hit on either the SPDX id or the free-text name counts.
    fn matches_license(&self, license: &License) -> bool {
        self.matches(&license.spdx) || self.matches(&license.name)
    }
}

fn compile_all(globs: &[String]) -> Result<Vec<Pattern>> {
    globs.iter().map(|g| Pattern::new(g)).collect()
}

/// Load the policy configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.modlicense/config.toml`
/// 3. `~/.config/modlicense/config.toml`
///
/// `None` means no policy: every verdict is [`PolicyVerdict::Unknown`].
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Option<Config>> {
    if let Some(path) = config_override {
        return read_config(path).map(Some);
    }

    let project_config = project_path.join(".modlicense").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config).map(Some);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("modlicense").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config).map(Some);
        }
    }

    Ok(None)
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Config::parse(&content).with_context(|| format!("parsing config {}", path.display()))
}

/// Classify a lookup outcome against the policy.
///
/// Deny patterns are checked before allow patterns so a specific prohibition
/// beats a broad allow. No license, no policy, or no matching pattern all
/// yield `Unknown`.
pub fn apply_policy(config: Option<&Config>, outcome: &Outcome) -> PolicyVerdict {
    let Some(license) = outcome.license() else {
        return PolicyVerdict::Unknown;
    };
    let Some(config) = config else {
        return PolicyVerdict::Unknown;
    };

    if config.denies(license) {
        return PolicyVerdict::Denied;
    }
    if config.allows(license) {
        return PolicyVerdict::Allowed;
    }
    PolicyVerdict::Unknown
}
