//! Run coordination: settings → converter → report.
//!
//! [`Engine`] is the library entry point. It selects the converter for the
//! configured [`WorkMode`], runs it to completion and logs a summary line.
//! Configuration errors are the only failure that reaches the caller; see
//! [`run_config_file`].

use crate::error::ConfigError;
use crate::pipeline::img2pdf::ImageToPdfConverter;
use crate::pipeline::pdf2img::PdfToImageConverter;
use crate::pipeline::render::PdfRasterizer;
use crate::progress::{self, ProgressCallback};
use crate::report::{RunReport, RunStatus};
use crate::resolver::load_settings;
use crate::settings::{AppSettings, WorkMode};
use std::path::Path;
use tracing::{info, warn};

/// Executes one conversion run for resolved settings.
pub struct Engine<'a> {
    settings: &'a AppSettings,
    progress: ProgressCallback,
    rasterizer: Option<Box<dyn PdfRasterizer + 'a>>,
}

impl<'a> Engine<'a> {
    pub fn new(settings: &'a AppSettings) -> Self {
        Self {
            settings,
            progress: progress::noop(),
            rasterizer: None,
        }
    }

    /// Receive batch events while the run is in progress.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Rasterise PDFs with `rasterizer` instead of binding pdfium.
    ///
    /// Only consulted in [`WorkMode::PdfToImage`].
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn PdfRasterizer + 'a>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Run the converter selected by the work mode.
    pub fn execute(self) -> RunReport {
        let mode = self.settings.work_mode;
        info!("Engine Work Mode: {mode}");

        let report = match mode {
            WorkMode::ImageToPdf => ImageToPdfConverter::new(self.settings)
                .with_progress(self.progress)
                .run(),
            WorkMode::PdfToImage => {
                let converter =
                    PdfToImageConverter::new(self.settings).with_progress(self.progress);
                match self.rasterizer {
                    Some(rasterizer) => converter.with_rasterizer(rasterizer).run(),
                    None => converter.run(),
                }
            }
        };

        match report.status {
            RunStatus::Completed => info!("Run finished: {}", report.summary()),
            status => warn!("Run stopped early: {status}"),
        }
        report
    }
}

/// Run `settings` with no progress callback and the default rasteriser.
pub fn run(settings: &AppSettings) -> RunReport {
    Engine::new(settings).execute()
}

/// Load the configuration file at `path` and run it.
///
/// # Errors
/// Only configuration errors are returned; conversion problems are logged
/// and recorded in the report.
pub fn run_config_file(path: impl AsRef<Path>) -> Result<RunReport, ConfigError> {
    let resolved = load_settings(path)?;
    Ok(run(&resolved.settings))
}
