use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use super::{columns, sorted, COLUMNS};
use crate::models::{Module, Resolution};
use crate::status::{Sink, UpdateKind};

const SHEET_NAME: &str = "Licenses";

/// Writes the CSV columns into a single-sheet Excel workbook on close.
pub struct XlsxSink {
    path: PathBuf,
    resolutions: Mutex<Vec<Resolution>>,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resolutions: Mutex::new(Vec::new()),
        }
    }
}

impl Sink for XlsxSink {
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
        let mut workbook = build(&rows)?;
        workbook
            .save(&self.path)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

fn build(rows: &[Resolution]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in columns(r).iter().enumerate() {
            sheet.write_string(row, col as u16, value.as_str())?;
        }
    }
    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();

    Ok(workbook)
}
