//! go.mod / go.sum ingestion.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::models::Module;

pub trait Analyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<Module>>;
}

/// Reads the `require` directives of `<dir>/go.mod`.
///
/// Indirect requirements (`// indirect`) are dropped unless
/// `include_indirect` is set. Hashes are filled in from `go.sum` when it
/// exists next to go.mod.
pub struct GoModAnalyzer {
    include_indirect: bool,
}

impl GoModAnalyzer {
    pub fn new(include_indirect: bool) -> Self {
        Self { include_indirect }
    }
}

impl Analyzer for GoModAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<Module>> {
        let go_mod = path.join("go.mod");
        let content = std::fs::read_to_string(&go_mod)
            .with_context(|| format!("reading {}", go_mod.display()))?;
        let mut modules = parse_go_mod(&content)
            .with_context(|| format!("parsing {}", go_mod.display()))?;

        if !self.include_indirect {
            modules.retain(|m| !m.indirect);
        }

        let go_sum = path.join("go.sum");
        if go_sum.exists() {
            let content = std::fs::read_to_string(&go_sum)
                .with_context(|| format!("reading {}", go_sum.display()))?;
            let hashes = parse_go_sum(&content);
            for m in &mut modules {
                m.hash = hashes
                    .get(&(m.path.clone(), m.version.clone()))
                    .cloned();
            }
        }

        Ok(modules)
    }
}

/// Parse the `require` directives of a go.mod file.
///
/// Handles both the single-line form and `require ( ... )` blocks; other
/// block directives (`replace`, `exclude`, `retract`, ...) are skipped.
fn parse_go_mod(content: &str) -> Result<Vec<Module>> {
    let mut modules = Vec::new();
    // Name of the directive whose `( ... )` block we are inside.
    let mut block: Option<String> = None;

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let (code, comment) = match raw.find("//") {
            Some(i) => (&raw[..i], &raw[i + 2..]),
            None => (raw, ""),
        };
        let tokens: Vec<&str> = code.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if let Some(directive) = &block {
            if tokens == [")"] {
                block = None;
                continue;
            }
            if directive == "require" {
                modules.push(require_entry(&tokens, comment, lineno)?);
            }
            continue;
        }

        match tokens.as_slice() {
            [directive, "("] => block = Some(directive.to_string()),
            ["require", rest @ ..] => modules.push(require_entry(rest, comment, lineno)?),
            _ => {}
        }
    }

    if let Some(directive) = block {
        bail!("unterminated `{} (` block", directive);
    }

    Ok(modules)
}

fn require_entry(tokens: &[&str], comment: &str, lineno: usize) -> Result<Module> {
    let [path, version] = tokens else {
        bail!("line {}: expected `<module path> <version>`", lineno);
    };
    let mut module = Module::new(path.trim_matches('"'), version.trim_matches('"'));
    module.indirect = comment
        .split(';')
        .next()
        .is_some_and(|c| c.trim() == "indirect");
    Ok(module)
}

/// Map `(path, version)` → `h1:` hash from go.sum, ignoring `/go.mod` lines.
fn parse_go_sum(content: &str) -> HashMap<(String, String), String> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let (path, version, hash) = (parts.next()?, parts.next()?, parts.next()?);
            if version.ends_with("/go.mod") {
                return None;
            }
            Some(((path.to_string(), version.to_string()), hash.to_string()))
        })
        .collect()
}
