use std::path::PathBuf;

use clap::builder::TypedValueParser;
use clap::Parser;

use crate::resolve::DEFAULT_CONCURRENCY;

#[derive(Parser, Debug)]
#[command(
    name = "modlicense",
    about = "Resolve the license of every Go module dependency and check it against policy",
    version
)]
pub struct Cli {
    /// Project directories containing a go.mod
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Policy config file [default: ./.modlicense/config.toml, fallback ~/.config/modlicense/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List dependencies without looking up licenses
    #[arg(long)]
    pub no_license: bool,

    /// Include indirect (`// indirect`) requirements
    #[arg(long)]
    pub indirect: bool,

    /// Maximum number of lookups in flight at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub concurrency: usize,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub timeout: u64,

    /// Plain output: no colors or live progress, one line per module
    #[arg(long)]
    pub plain: bool,

    /// Show lookup progress and all allowed modules
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write the report as CSV to this path
    #[arg(long, value_name = "FILE")]
    pub out_csv: Option<PathBuf>,

    /// Also write the report as JSON to this path
    #[arg(long, value_name = "FILE")]
    pub out_json: Option<PathBuf>,

    /// Also write the report as an Excel workbook to this path
    #[arg(long, value_name = "FILE")]
    pub out_xlsx: Option<PathBuf>,
}
