//! PDF → image converter.
//!
//! Every PDF in the input directory gets its own subdirectory in the output
//! directory, named after the PDF's file stem, holding one image per page.
//!
//! Failures are contained to the smallest unit of work: a PDF that cannot be
//! opened fails as one item and the batch moves on; a page that cannot be
//! rendered or written fails as one item and the remaining pages still run.
//! Pages whose target already exists are skipped before rendering, so
//! re-running over a large batch only renders what is missing.

use crate::error::ConvertError;
use crate::pipeline::encode::{encode_page, write_output};
use crate::pipeline::input::list_pdfs;
use crate::pipeline::render::{PdfRasterizer, PdfiumRasterizer, RasterOptions};
use crate::pipeline::{discover, file_name, record};
use crate::progress::{self, ProgressCallback};
use crate::report::{ItemOutcome, RunReport, RunStatus};
use crate::settings::{AppSettings, WorkMode};
use crate::strategy::{select_page_plan, PagePlan};
use std::path::Path;
use tracing::{error, info, warn};

/// Converts a directory of PDFs into per-page images.
pub struct PdfToImageConverter<'a> {
    settings: &'a AppSettings,
    rasterizer: Option<Box<dyn PdfRasterizer + 'a>>,
    progress: ProgressCallback,
}

impl<'a> PdfToImageConverter<'a> {
    /// Converter that binds pdfium when it runs.
    pub fn new(settings: &'a AppSettings) -> Self {
        Self {
            settings,
            rasterizer: None,
            progress: progress::noop(),
        }
    }

    /// Use `rasterizer` instead of binding pdfium.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn PdfRasterizer + 'a>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Rasterise every PDF in the input directory.
    ///
    /// Never fails: missing directories, an unavailable pdfium library and
    /// per-item errors are logged and recorded in the returned report.
    pub fn run(&self) -> RunReport {
        let mode = WorkMode::PdfToImage;
        let batch = match discover(&self.settings.directories, "PDFs", list_pdfs) {
            Ok(batch) => batch,
            Err(status) => return self.stopped(status),
        };

        let (plan, notice) = select_page_plan(&self.settings.img_strategy);
        if let Some(notice) = notice {
            warn!("{notice}");
        }

        // Bound only once there is something to render.
        let bound;
        let rasterizer: &dyn PdfRasterizer = match &self.rasterizer {
            Some(injected) => injected.as_ref(),
            None => match PdfiumRasterizer::bind() {
                Ok(pdfium) => {
                    bound = pdfium;
                    &bound
                }
                Err(e) => {
                    error!("{e}");
                    return self.stopped(RunStatus::RasterizerUnavailable);
                }
            },
        };

        info!(
            "Rasterising {} PDFs from {} at {} DPI ({}, {})",
            batch.inputs.len(),
            batch.input_dir.display(),
            plan.dpi,
            plan.format,
            plan.color_mode
        );
        self.progress.on_run_start(mode, batch.inputs.len());

        let mut report = RunReport::new(mode);
        for pdf in &batch.inputs {
            self.convert_pdf(rasterizer, pdf, &batch.output_dir, &plan, &mut report);
        }

        self.progress.on_run_complete(&report);
        report
    }

    fn stopped(&self, status: RunStatus) -> RunReport {
        let report = RunReport::stopped(WorkMode::PdfToImage, status);
        self.progress.on_run_complete(&report);
        report
    }

    fn convert_pdf(
        &self,
        rasterizer: &dyn PdfRasterizer,
        pdf: &Path,
        output_dir: &Path,
        plan: &PagePlan,
        report: &mut RunReport,
    ) {
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let page_dir = output_dir.join(&stem);

        if let Err(e) = std::fs::create_dir_all(&page_dir) {
            let e = ConvertError::io(&page_dir, e);
            error!("Failed to process {}: {e}", file_name(pdf));
            record(report, &self.progress, ItemOutcome::failed(pdf, Some(page_dir), e));
            return;
        }

        let document = match rasterizer.open(pdf) {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to process {}: {e}", file_name(pdf));
                record(report, &self.progress, ItemOutcome::failed(pdf, None, e));
                return;
            }
        };

        let pages = document.page_count();
        info!("Processing {} ({} pages)", file_name(pdf), pages);
        let options = RasterOptions { dpi: plan.dpi };

        for index in 0..pages {
            let target = page_dir.join(plan.file_name(&stem, index));
            if !plan.overwrite && target.exists() {
                info!("Skipping {}/{} (exists)", stem, file_name(&target));
                record(report, &self.progress, ItemOutcome::skipped(pdf, target));
                continue;
            }

            let written = document
                .render_page(index, &options)
                .and_then(|image| encode_page(&image, plan.color_mode, plan.format, &target))
                .and_then(|bytes| write_output(&target, &bytes, plan.overwrite));
            let outcome = match written {
                Ok(()) => {
                    info!("  Saved {}/{}", stem, file_name(&target));
                    ItemOutcome::written(pdf, target)
                }
                Err(e) => {
                    error!("Failed page {} of {}: {e}", index + 1, file_name(pdf));
                    ItemOutcome::failed(pdf, Some(target), e)
                }
            };
            record(report, &self.progress, outcome);
        }
    }
}
