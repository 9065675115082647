//! Report sinks for license resolution results.
//!
//! - [`terminal`] — progress bar or plain lines while running, then a summary
//!   box and per-verdict tables; respects `--plain` / `--verbose`.
//! - [`csv`] — one row per module, written on close (`--out-csv`).
//! - [`json`] — pretty JSON array, written on close (`--out-json`).
//! - [`xlsx`] — the CSV columns as an Excel worksheet (`--out-xlsx`).

pub mod csv;
pub mod json;
pub mod terminal;
pub mod xlsx;

use crate::models::{PolicyVerdict, Resolution};

const UNKNOWN: &str = "unknown";

/// Column layout shared by the tabular sinks.
pub(crate) const COLUMNS: [&str; 6] = ["Dependency", "Version", "SPDX ID", "License", "Allowed", "Indirect"];

/// One tabular row, unescaped. A failed lookup reports `ERROR: <msg>` as its
/// license and `no` as allowed.
pub(crate) fn columns(r: &Resolution) -> [String; 6] {
    let (spdx, license) = match (r.license(), r.error()) {
        (Some(l), _) => {
            let spdx = if l.spdx.is_empty() { UNKNOWN } else { l.spdx.as_str() };
            (spdx.to_string(), l.name.clone())
        }
        (None, Some(err)) => (
            UNKNOWN.to_string(),
            format!("ERROR: {}", err).replace('\n', " "),
        ),
        (None, None) => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    };
    let allowed = if r.error().is_some() {
        "no"
    } else {
        match r.verdict {
            PolicyVerdict::Allowed => "yes",
            PolicyVerdict::Denied => "no",
            PolicyVerdict::Unknown => UNKNOWN,
        }
    };

    [
        r.module.path.clone(),
        r.module.version.clone(),
        spdx,
        license,
        allowed.to_string(),
        r.module.indirect.to_string(),
    ]
}

/// Sorted snapshot of a sink's collected resolutions.
pub(crate) fn sorted(resolutions: &std::sync::Mutex<Vec<Resolution>>) -> Vec<Resolution> {
    let mut rows = resolutions
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    rows.sort_by(|a, b| a.module.cmp(&b.module));
    rows
}
