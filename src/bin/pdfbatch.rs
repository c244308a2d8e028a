//! CLI binary for pdfbatch.
//!
//! A thin shim over the library crate: read the configuration file named on
//! the command line, run the selected converter and map configuration
//! errors to a non-zero exit status.

use anyhow::{Context, Result};
use clap::Parser;
use pdfbatch::{load_settings, Engine, LogContext, RunReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run with ./config.toml
  pdfbatch

  # Run with an explicit configuration file
  pdfbatch --config jobs/scans.toml

MINIMAL CONFIGURATION:
  [Settings]
  work_mode = "img2pdf"     # or "pdf2img"

  Every other key is optional and falls back to a documented default with
  a warning. Invalid values are ignored with an [OPT] warning.

EXIT STATUS:
  0  the run completed (individual file failures are logged, not fatal)
  1  the configuration file is missing, unparseable or lacks work_mode

ENVIRONMENT VARIABLES:
  PDFBATCH_CONFIG   Default for --config
  PDFIUM_LIB_PATH   Path to libpdfium (pdf2img only)
  RUST_LOG          Log filter, e.g. RUST_LOG=debug
"#;

/// Batch-convert between image directories and PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdfbatch",
    version,
    about = "Batch-convert images to PDF and PDF pages to images, driven by a TOML file",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", env = "PDFBATCH_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logs = LogContext::stdout();

    logs.in_scope(|| match run(&cli.config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Configuration error: {e:#}");
            ExitCode::FAILURE
        }
    })
}

fn run(config: &Path) -> Result<RunReport> {
    let resolved = load_settings(config)
        .with_context(|| format!("cannot use '{}'", config.display()))?;
    Ok(Engine::new(&resolved.settings).execute())
}
