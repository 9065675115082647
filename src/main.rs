//! `modlicense` — resolve the license of every Go module dependency and check
//! it against policy.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and initialise logging ([`logging`]).
//! 2. Load the policy config ([`config::load_config`]); errors are fatal.
//! 3. Read go.mod / go.sum of every project directory ([`manifest`]).
//! 4. Resolve every distinct module ([`resolve`]): finder chain ([`finder`]),
//!    then the translator chain ([`translate`]) and the finder chain again.
//! 5. Classify each outcome against the policy ([`config::apply_policy`]) and
//!    stream lifecycle events ([`status`]) to the report sinks ([`report`]).
//! 6. Exit `0`, or `1` if any license is denied.

mod cli;
mod config;
mod error;
mod finder;
mod license;
mod logging;
mod manifest;
mod models;
mod report;
mod resolve;
mod status;
mod translate;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use cli::Cli;
use config::load_config;
use finder::Finder;
use license::classifier::PhraseClassifier;
use manifest::{Analyzer, GoModAnalyzer};
use resolve::Resolver;
use status::{MultiSink, Sink, StatusChannel};
use translate::Translator;

const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if cli.plain {
        colored::control::set_override(false);
    }

    let project_root = cli.paths[0]
        .canonicalize()
        .unwrap_or_else(|_| cli.paths[0].clone());
    let config = load_config(&project_root, cli.config.as_deref())?;
    if config.is_none() {
        info!("no policy config found; every verdict will be unknown");
    }

    // Union of every project's requirements, deduplicated by (path, version).
    let analyzer = GoModAnalyzer::new(cli.indirect);
    let mut modules = BTreeSet::new();
    for path in &cli.paths {
        let found = analyzer.analyze(path)?;
        info!(project = %path.display(), modules = found.len(), "read go.mod");
        modules.extend(found);
    }
    let modules: Vec<_> = modules.into_iter().collect();

    // File reports are written even for a project with no requirements.
    let mut sinks = MultiSink::new();
    if let Some(path) = &cli.out_csv {
        sinks.push(Box::new(report::csv::CsvSink::new(path)));
    }
    if let Some(path) = &cli.out_json {
        sinks.push(Box::new(report::json::JsonSink::new(path)));
    }
    if let Some(path) = &cli.out_xlsx {
        sinks.push(Box::new(report::xlsx::XlsxSink::new(path)));
    }

    if modules.is_empty() {
        eprintln!("No module requirements found.");
        return sinks.close();
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()
        .context("building HTTP client")?;
    let token = std::env::var(ENV_GITHUB_TOKEN)
        .ok()
        .filter(|t| !t.trim().is_empty());
    if token.is_none() && !cli.no_license {
        eprintln!(
            "  {} {} is not set; GitHub lookups are rate limited to 60 per hour",
            "⚠".yellow(),
            ENV_GITHUB_TOKEN
        );
    }

    let (translate_map, override_map) = match &config {
        Some(c) => (c.translate.clone(), c.overrides.clone()),
        None => Default::default(),
    };

    // Translators and finders run in priority order: user tables first.
    // Without finders there is nothing to retry, so skip translation too.
    let translators: Vec<Box<dyn Translator>> = if cli.no_license {
        Vec::new()
    } else {
        vec![
            Box::new(translate::mapper::MapTranslator::new(translate_map)),
            Box::new(translate::vanity::VanityTranslator::new(client.clone())?),
            Box::new(translate::golang::GolangTranslator),
            Box::new(translate::gopkg::GopkgTranslator::new()?),
        ]
    };
    let finders: Vec<Box<dyn Finder>> = if cli.no_license {
        Vec::new()
    } else {
        vec![
            Box::new(finder::mapper::OverrideFinder::new(override_map)),
            Box::new(finder::github::RepoApi::new(
                client,
                token,
                Arc::new(PhraseClassifier),
            )),
        ]
    };

    let terminal = Arc::new(report::terminal::TerminalSink::new(
        modules.len(),
        cli.plain,
        cli.verbose,
    )?);
    sinks.push(Box::new(terminal.clone()));
    let sinks = Arc::new(sinks);

    let resolver = Arc::new(
        Resolver::new(translators, finders)
            .with_policy(config)
            .with_concurrency(cli.concurrency),
    );

    let (channel, dispatcher) = StatusChannel::spawn(sinks.clone());
    resolver.run(modules, &channel).await;
    drop(channel);
    dispatcher.await.context("status dispatcher panicked")?;

    sinks.close()?;

    if terminal.denied_count() > 0 {
        std::process::exit(1);
    }

    Ok(())
}
