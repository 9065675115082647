use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use crate::models::Module;
use crate::status::{StatusHandle, UpdateKind};

/// Resolves vanity import paths through the `go get` discovery protocol.
///
/// Fetches `https://<path>?go-get=1` and reads the
/// `<meta name="go-import" content="<prefix> <vcs> <repo>">` tag. Only
/// repositories hosted on GitHub produce a match, since that is where the
/// license finders can look.
pub struct VanityTranslator {
    client: Client,
    meta_re: Regex,
    attr_re: Regex,
}

impl VanityTranslator {
    pub fn new(client: Client) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            meta_re: Regex::new(r"(?is)<meta\s[^>]*>")?,
            attr_re: Regex::new(r#"(?is)([a-z-]+)\s*=\s*["']([^"']*)["']"#)?,
        })
    }

    /// Extract the GitHub module path from the `go-import` meta tag in `html`.
    ///
    /// The tag's import prefix must cover `path`.
    fn parse_go_import(&self, html: &str, path: &str) -> Option<String> {
        for tag in self.meta_re.find_iter(html) {
            let mut name = None;
            let mut content = None;
            for caps in self.attr_re.captures_iter(tag.as_str()) {
                match caps[1].to_ascii_lowercase().as_str() {
                    "name" => name = Some(caps[2].to_string()),
                    "content" => content = Some(caps[2].to_string()),
                    _ => {}
                }
            }

            if name.as_deref() != Some("go-import") {
                continue;
            }
            let Some(content) = content else {
                continue;
            };

            let fields: Vec<&str> = content.split_whitespace().collect();
            let [prefix, _vcs, repo] = fields.as_slice() else {
                continue;
            };
            let covers = path == *prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'));
            if !covers {
                continue;
            }

            if let Some(github) = github_path(repo) {
                return Some(github);
            }
        }

        None
    }
}

#[async_trait]
impl super::Translator for VanityTranslator {
    fn name(&self) -> &'static str {
        "go-import"
    }

    async fn translate(&self, module: &Module, status: &StatusHandle) -> Option<Module> {
        if module.path.starts_with("github.com/") {
            return None;
        }

        status.update(UpdateKind::Normal, "resolving vanity import path");
        let url = format!("https://{}?go-get=1", module.path);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(module = %module.path, "go-import lookup failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(module = %module.path, status = %response.status(), "go-import lookup failed");
            return None;
        }

        let body = response.text().await.ok()?;
        self.parse_go_import(&body, &module.path).map(|path| module.with_path(path))
    }
}

/// `https://github.com/owner/repo.git` → `github.com/owner/repo`
fn github_path(repo_url: &str) -> Option<String> {
    let rest = repo_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("git://")
        .strip_prefix("github.com/")?;
    let mut parts = rest.trim_end_matches('/').split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next().filter(|s| !s.is_empty())?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    Some(format!("github.com/{}/{}", owner, repo))
}
