use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::{columns, sorted, COLUMNS};
use crate::models::{Module, Resolution};
use crate::status::{Sink, UpdateKind};

/// Writes one CSV row per module to `path` on close, sorted by module path.
pub struct CsvSink {
    path: PathBuf,
    resolutions: Mutex<Vec<Resolution>>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resolutions: Mutex::new(Vec::new()),
        }
    }
}

impl Sink for CsvSink {
    fn start(&self, _module: &Module) {}

    fn update(&self, _module: &Module, _kind: UpdateKind, _message: &str) {}

    fn finish(&self, resolution: &Resolution) {
        self.resolutions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(resolution.clone());
    }

    fn close(&self) -> Result<()> {
        let rows = sorted(&self.resolutions);
        let mut file = std::fs::File::create(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        file.write_all(render(&rows).as_bytes())
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

fn render(rows: &[Resolution]) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');
    for r in rows {
        let fields: Vec<String> = columns(r).iter().map(|f| escape(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
