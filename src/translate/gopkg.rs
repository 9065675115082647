use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::models::Module;
use crate::status::StatusHandle;

/// Rewrites `gopkg.in` paths to the GitHub repository they redirect to.
///
/// - `gopkg.in/pkg.v3` → `github.com/go-pkg/pkg`
/// - `gopkg.in/user/pkg.v3` → `github.com/user/pkg`
pub struct GopkgTranslator {
    re: Regex,
}

impl GopkgTranslator {
    pub fn new() -> Result<Self> {
        let re = Regex::new(
            r"^gopkg\.in/(?:([a-zA-Z0-9][-a-zA-Z0-9]*)/)?([a-zA-Z][-.a-zA-Z0-9]*)\.v\d+(?:-unstable)?(?:/.*)?$",
        )?;
        Ok(Self { re })
    }

    fn rewrite(&self, path: &str) -> Option<String> {
        let caps = self.re.captures(path)?;
        let pkg = caps.get(2)?.as_str();
        let user = match caps.get(1) {
            Some(user) => user.as_str().to_string(),
            None => format!("go-{}", pkg),
        };
        Some(format!("github.com/{}/{}", user, pkg))
    }
}

#[async_trait]
impl super::Translator for GopkgTranslator {
    fn name(&self) -> &'static str {
        "gopkg.in"
    }

    async fn translate(&self, module: &Module, _status: &StatusHandle) -> Option<Module> {
        self.rewrite(&module.path).map(|path| module.with_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites() {
        let t = GopkgTranslator::new().unwrap();
        let cases = [
            ("gopkg.in/yaml.v2", Some("github.com/go-yaml/yaml")),
            ("gopkg.in/check.v1", Some("github.com/go-check/check")),
            ("gopkg.in/src-d/go-git.v4", Some("github.com/src-d/go-git")),
            ("gopkg.in/yaml.v3/internal", Some("github.com/go-yaml/yaml")),
            ("gopkg.in/yaml", None),
            ("github.com/go-yaml/yaml", None),
        ];

        for (input, expected) in cases {
            assert_eq!(t.rewrite(input).as_deref(), expected, "input {}", input);
        }
    }
}
