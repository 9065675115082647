use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

use crate::license::spdx;
use crate::models::{LicenseRisk, Module, PolicyVerdict, Resolution};
use crate::status::{Sink, UpdateKind};

/// Live terminal output.
///
/// Shows a progress bar while lookups run (or one line per event with
/// `plain`), then a summary box and per-verdict tables on close.
pub struct TerminalSink {
    plain: bool,
    verbose: bool,
    progress: Option<ProgressBar>,
    resolutions: Mutex<Vec<Resolution>>,
}

impl TerminalSink {
    pub fn new(total: usize, plain: bool, verbose: bool) -> Result<Self> {
        let progress = if plain {
            None
        } else {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )?
                    .progress_chars("#>-"),
            );
            Some(pb)
        };

        Ok(Self {
            plain,
            verbose,
            progress,
            resolutions: Mutex::new(Vec::new()),
        })
    }

    /// Number of modules whose license the policy denies.
    pub fn denied_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|r| r.verdict == PolicyVerdict::Denied)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Resolution>> {
        // A panic while holding the lock cannot leave the list half-written.
        self.resolutions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for TerminalSink {
    fn start(&self, module: &Module) {
        if let Some(pb) = &self.progress {
            pb.set_message(module.path.clone());
        } else if self.verbose {
            eprintln!("  {} {}", "→".cyan(), module);
        }
    }

    fn update(&self, module: &Module, kind: UpdateKind, message: &str) {
        if let Some(pb) = &self.progress {
            pb.set_message(format!("{}: {}", module.path, message));
            return;
        }
        if !self.verbose {
            return;
        }
        let marker = match kind {
            UpdateKind::Normal => "·".normal(),
            UpdateKind::Warning => "⚠".yellow(),
            UpdateKind::Error => "✗".red(),
        };
        eprintln!("    {} {}: {}", marker, module.path, message);
    }

    fn finish(&self, resolution: &Resolution) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        } else if self.plain {
            println!(
                "{} {} {}",
                verdict_marker(resolution.verdict),
                resolution.module,
                license_label(resolution)
            );
        }
        self.lock().push(resolution.clone());
    }

    fn close(&self) -> Result<()> {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
        let mut resolutions = self.lock().clone();
        resolutions.sort_by(|a, b| a.module.cmp(&b.module));
        render(&resolutions, self.verbose);
        Ok(())
    }
}

fn verdict_marker(verdict: PolicyVerdict) -> ColoredString {
    match verdict {
        PolicyVerdict::Allowed => "✓".green(),
        PolicyVerdict::Denied => "✗".red(),
        PolicyVerdict::Unknown => "?".yellow(),
    }
}

fn license_label(r: &Resolution) -> String {
    match (r.license(), r.error()) {
        (Some(license), _) => license.to_string(),
        (None, Some(err)) => format!("ERROR: {}", err),
        (None, None) => "<license not found or detected>".to_string(),
    }
}

/// Render the summary box and tables.
fn render(resolutions: &[Resolution], verbose: bool) {
    let total = resolutions.len();
    let count = |v: PolicyVerdict| resolutions.iter().filter(|r| r.verdict == v).count();
    let allowed_count = count(PolicyVerdict::Allowed);
    let denied_count = count(PolicyVerdict::Denied);
    let unknown_count = count(PolicyVerdict::Unknown);
    let failed_count = resolutions.iter().filter(|r| r.error().is_some()).count();

    println!(
        "\n {} v{}\n",
        "modlicense".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total modules      : {}", total));
    println!(
        " │  {:<48} │",
        format!(
            "{}  Allowed         : {:>4}  {}",
            "✓".green(),
            allowed_count,
            summarize_licenses(resolutions, PolicyVerdict::Allowed)
        )
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Denied          : {:>4}  {}",
            "✗".red(),
            denied_count,
            summarize_licenses(resolutions, PolicyVerdict::Denied)
        )
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Unknown         : {:>4}  ({} lookup errors)",
            "?".yellow(),
            unknown_count,
            failed_count
        )
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if denied_count > 0 {
        println!(" {} Modules with denied licenses:\n", "[DENIED]".red().bold());
        render_table(resolutions, PolicyVerdict::Denied);
        println!();
    }

    if unknown_count > 0 {
        println!(" {} Modules needing review:\n", "[UNKNOWN]".yellow().bold());
        render_table(resolutions, PolicyVerdict::Unknown);
        println!();
    }

    if verbose && allowed_count > 0 {
        println!(" {} All allowed modules:\n", "[ALLOWED]".green().bold());
        render_table(resolutions, PolicyVerdict::Allowed);
        println!();
    }
}

fn render_table(resolutions: &[Resolution], verdict_filter: PolicyVerdict) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Module").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Risk").add_attribute(Attribute::Bold),
            Cell::new("Verdict").add_attribute(Attribute::Bold),
        ]);

    for r in resolutions.iter().filter(|r| r.verdict == verdict_filter) {
        let (verdict_str, verdict_color) = match r.verdict {
            PolicyVerdict::Allowed => ("✓ allowed", Color::Green),
            PolicyVerdict::Denied => ("✗ denied", Color::Red),
            PolicyVerdict::Unknown => ("? unknown", Color::Yellow),
        };

        let risk = r
            .license()
            .map(|l| spdx::risk_of(&l.spdx))
            .unwrap_or(LicenseRisk::Unknown);
        let risk_color = match risk {
            LicenseRisk::Permissive => Color::Green,
            LicenseRisk::WeakCopyleft => Color::Yellow,
            LicenseRisk::StrongCopyleft => Color::Red,
            LicenseRisk::Unknown => Color::DarkGrey,
        };

        let mut license_cell = Cell::new(license_label(r));
        if r.error().is_some() {
            license_cell = license_cell.fg(Color::Red);
        }

        table.add_row(vec![
            Cell::new(&r.module.path),
            Cell::new(&r.module.version),
            license_cell,
            Cell::new(risk.to_string()).fg(risk_color),
            Cell::new(verdict_str)
                .fg(verdict_color)
                .set_alignment(CellAlignment::Center),
        ]);
    }

    println!("{}", table);
}

/// Top three licenses for a verdict, e.g. `[MIT (12), Apache-2.0 (4)]`.
fn summarize_licenses(resolutions: &[Resolution], verdict: PolicyVerdict) -> String {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for r in resolutions.iter().filter(|r| r.verdict == verdict) {
        let lic = match r.license() {
            Some(l) if !l.spdx.is_empty() => l.spdx.clone(),
            Some(l) => l.name.clone(),
            None => "unknown".to_string(),
        };
        *counts.entry(lic).or_insert(0) += 1;
    }

    let mut pairs: Vec<(String, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(lic, cnt)| format!("{} ({})", lic, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}
