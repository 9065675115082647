use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::license::spdx;
use crate::models::{License, LicenseRisk, Module, PolicyVerdict, Resolution};
use crate::status::{Sink, UpdateKind};

#[derive(Debug, Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    module: &'a Module,
    license: Option<&'a License>,
    risk: LicenseRisk,
    verdict: PolicyVerdict,
    error: Option<String>,
}

impl<'a> From<&'a Resolution> for Row<'a> {
    fn from(r: &'a Resolution) -> Self {
        Row {
            module: &r.module,
            license: r.license(),
            risk: r
                .license()
                .map(|l| spdx::risk_of(&l.spdx))
                .unwrap_or(LicenseRisk::Unknown),
            verdict: r.verdict,
            error: r.error().map(ToString::to_string),
        }
    }
}

/// Writes every resolution as a pretty-printed JSON array on close.
pub struct JsonSink {
    path: PathBuf,
    resolutions: Mutex<Vec<Resolution>>,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resolutions: Mutex::new(Vec::new()),
        }
    }
}

impl Sink for JsonSink {
    fn start(&self, _module: &Module) {}

    fn update(&self, _module: &Module, _kind: UpdateKind, _message: &str) {}

    fn finish(&self, resolution: &Resolution) {
        self.resolutions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(resolution.clone());
    }

    fn close(&self) -> Result<()> {
        let resolutions = super::sorted(&self.resolutions);

        let rows: Vec<Row> = resolutions.iter().map(Row::from).collect();
        let json = serde_json::to_string_pretty(&rows)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::models::Outcome;

    #[test]
    fn test_close_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let sink = JsonSink::new(&path);
        sink.finish(&Resolution::new(
            Module::new("github.com/b/b", "v1.0.0"),
            Outcome::Failed(LookupError::RateLimited("GitHub".to_string())),
            PolicyVerdict::Unknown,
        ));
        sink.finish(&Resolution::new(
            Module::new("github.com/a/a", "v1.0.0"),
            Outcome::Found(License::new("MIT License", "MIT")),
            PolicyVerdict::Allowed,
        ));
        sink.close().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["path"], "github.com/a/a");
        assert_eq!(rows[0]["license"]["spdx"], "MIT");
        assert_eq!(rows[0]["risk"], "Permissive");
        assert_eq!(rows[0]["verdict"], "allowed");
        assert!(rows[0]["error"].is_null());
        assert!(rows[1]["license"].is_null());
        assert!(rows[1]["error"].as_str().unwrap().starts_with("rate limited"));
    }
}
