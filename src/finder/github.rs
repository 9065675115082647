use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::LookupError;
use crate::license::classifier::{self, Classifier};
use crate::models::{License, Module, Outcome};
use crate::status::{StatusHandle, UpdateKind};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Response of `GET /repos/{owner}/{repo}/license`.
#[derive(Debug, Deserialize)]
struct RepositoryLicense {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    license: Option<LicenseInfo>,
}

#[derive(Debug, Deserialize)]
struct LicenseInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    spdx_id: Option<String>,
}

/// Looks up a repository's declared license through the GitHub REST API.
///
/// Only `github.com/<owner>/<repo>[/...]` paths are handled; everything else
/// is `NotFound` so the translated retry can point it at GitHub.
pub struct RepoApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    classifier: Arc<dyn Classifier>,
}

impl RepoApi {
    pub fn new(client: Client, token: Option<String>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            token,
            classifier,
        }
    }
}

#[async_trait]
impl super::Finder for RepoApi {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn find(&self, module: &Module, status: &StatusHandle) -> Outcome {
        let Some((owner, repo)) = repo_of(&module.path) else {
            return Outcome::NotFound;
        };

        status.update(UpdateKind::Normal, format!("querying GitHub for {}/{}", owner, repo));
        let url = format!("{}/repos/{}/{}/license", self.base_url, owner, repo);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", concat!("modlicense/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return Outcome::Failed(e.into()),
        };

        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if let Some(outcome) = check_status(response.status(), remaining, &url) {
            debug!(module = %module.path, status = %response.status(), "GitHub license lookup");
            return outcome;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Outcome::Failed(e.into()),
        };
        interpret(&body, self.classifier.as_ref(), status)
    }
}

/// `github.com/owner/repo/sub/pkg` → `("owner", "repo")`
fn repo_of(path: &str) -> Option<(&str, &str)> {
    let mut parts = path.strip_prefix("github.com/")?.split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next().filter(|s| !s.is_empty())?;
    Some((owner, repo))
}

/// Map a non-success status to its outcome; `None` means read the body.
fn check_status(status: StatusCode, ratelimit_remaining: Option<u64>, url: &str) -> Option<Outcome> {
    if status.is_success() {
        return None;
    }

    let err = match status {
        StatusCode::NOT_FOUND => return Some(Outcome::NotFound),
        StatusCode::UNAUTHORIZED => LookupError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => LookupError::RateLimited("GitHub".to_string()),
        StatusCode::FORBIDDEN if ratelimit_remaining == Some(0) => {
            LookupError::RateLimited("GitHub".to_string())
        }
        other => LookupError::Http {
            status: other.as_u16(),
            url: url.to_string(),
        },
    };
    Some(Outcome::Failed(err))
}

/// Turn a successful response body into an outcome, falling back to the
/// content classifier when the API did not recognise the license.
fn interpret(body: &str, classifier: &dyn Classifier, status: &StatusHandle) -> Outcome {
    let rl: RepositoryLicense = match serde_json::from_str(body) {
        Ok(rl) => rl,
        Err(e) => return Outcome::Failed(LookupError::Decode(e.to_string())),
    };

    if let Some(info) = &rl.license {
        if let Some(spdx) = info
            .spdx_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != "NOASSERTION")
        {
            let name = info.name.clone().unwrap_or_else(|| spdx.to_string());
            return Outcome::Found(License::new(name, spdx));
        }
    }

    let Some(content) = rl.content.as_deref().filter(|c| !c.trim().is_empty()) else {
        return Outcome::NotFound;
    };
    if rl.encoding.as_deref().is_some_and(|e| e != "base64") {
        return Outcome::Failed(LookupError::Decode(format!(
            "unsupported content encoding {:?}",
            rl.encoding
        )));
    }

    // GitHub wraps base64 content at 60 columns.
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let text = match STANDARD.decode(compact) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => return Outcome::Failed(LookupError::Decode(e.to_string())),
    };

    status.update(UpdateKind::Warning, "no SPDX id reported, classifying license text");
    match classifier::detect(&text, classifier) {
        Ok(Some(license)) => Outcome::Found(license),
        Ok(None) => Outcome::NotFound,
        Err(e) => Outcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::classifier::{Match, PhraseClassifier};
    use crate::status::StatusChannel;

    const ISC_TEXT: &str = "Permission to use, copy, modify, and/or distribute this software for any purpose with or without fee is hereby granted, provided that the above copyright notice and this permission notice appear in all copies.\n\nTHE SOFTWARE IS PROVIDED \"AS IS\" AND THE AUTHOR DISCLAIMS ALL WARRANTIES";

    struct Always(&'static str);

    impl Classifier for Always {
        fn classify(&self, _text: &str) -> Vec<Match> {
            vec![Match {
                id: self.0.to_string(),
                confidence: 0.99,
            }]
        }
    }

    fn status() -> StatusHandle {
        StatusChannel::detached().handle(&Module::new("github.com/foo/bar", "v1.0.0"))
    }

    fn body_with_content(text: &str) -> String {
        serde_json::json!({
            "name": "LICENSE",
            "content": STANDARD.encode(text),
            "encoding": "base64",
            "license": { "key": "other", "name": "Other", "spdx_id": "NOASSERTION" }
        })
        .to_string()
    }

    #[test]
    fn test_repo_of() {
        assert_eq!(repo_of("github.com/foo/bar"), Some(("foo", "bar")));
        assert_eq!(repo_of("github.com/foo/bar/v2/pkg"), Some(("foo", "bar")));
        assert_eq!(repo_of("github.com/foo"), None);
        assert_eq!(repo_of("gitlab.com/foo/bar"), None);
    }

    #[test]
    fn test_check_status() {
        let url = "https://api.github.com/repos/foo/bar/license";
        assert_eq!(check_status(StatusCode::OK, None, url), None);
        assert_eq!(
            check_status(StatusCode::NOT_FOUND, None, url),
            Some(Outcome::NotFound)
        );
        assert_eq!(
            check_status(StatusCode::UNAUTHORIZED, None, url),
            Some(Outcome::Failed(LookupError::Unauthorized))
        );
        assert_eq!(
            check_status(StatusCode::FORBIDDEN, Some(0), url),
            Some(Outcome::Failed(LookupError::RateLimited("GitHub".to_string())))
        );
        assert_eq!(
            check_status(StatusCode::FORBIDDEN, Some(12), url),
            Some(Outcome::Failed(LookupError::Http {
                status: 403,
                url: url.to_string()
            }))
        );
    }

    #[test]
    fn test_spdx_id_from_api() {
        let body = r#"{"license": {"key": "mit", "name": "MIT License", "spdx_id": "MIT"}}"#;
        assert_eq!(
            interpret(body, &PhraseClassifier, &status()),
            Outcome::Found(License::new("MIT License", "MIT"))
        );
    }

    #[test]
    fn test_falls_back_to_content() {
        let body = body_with_content(ISC_TEXT);
        assert_eq!(
            interpret(&body, &PhraseClassifier, &status()),
            Outcome::Found(License::new("ISC License", "ISC"))
        );
    }

    #[test]
    fn test_unrecognised_content_is_not_found() {
        let body = body_with_content("All rights reserved. Ask us first.");
        assert_eq!(interpret(&body, &PhraseClassifier, &status()), Outcome::NotFound);
    }

    #[test]
    fn test_no_license_field_and_no_content() {
        assert_eq!(interpret("{}", &PhraseClassifier, &status()), Outcome::NotFound);
    }

    #[test]
    fn test_classifier_id_missing_from_registry() {
        let body = body_with_content("anything");
        assert_eq!(
            interpret(&body, &Always("Made-Up-1.0"), &status()),
            Outcome::Failed(LookupError::UnknownLicenseId("Made-Up-1.0".to_string()))
        );
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            interpret("not json", &PhraseClassifier, &status()),
            Outcome::Failed(LookupError::Decode(_))
        ));
    }
}
