//! Image → PDF converter.
//!
//! Merges the images of the input directory into one PDF, or converts each
//! image into its own PDF, depending on the resolved [`ImagePlan`].
//!
//! The two collision policies differ on purpose:
//!
//! * a merge never fails or overwrites because the name is taken; the new
//!   file is written under a timestamped name instead
//! * per-image conversion skips images whose `<stem>.pdf` already exists, so
//!   re-running over the same directory only converts new images

use crate::pipeline::compose::compose_pdf;
use crate::pipeline::encode::write_output;
use crate::pipeline::input::list_images;
use crate::pipeline::{discover, file_name, record, Batch};
use crate::progress::{self, ProgressCallback};
use crate::report::{ItemOutcome, ItemStatus, RunReport};
use crate::settings::{AppSettings, WorkMode};
use crate::strategy::{image_pdf_name, merged_target, select_image_plan, ImagePlan};
use chrono::Utc;
use std::path::Path;
use tracing::{error, info, warn};

/// Converts a directory of images into PDF(s).
pub struct ImageToPdfConverter<'a> {
    settings: &'a AppSettings,
    progress: ProgressCallback,
}

impl<'a> ImageToPdfConverter<'a> {
    pub fn new(settings: &'a AppSettings) -> Self {
        Self {
            settings,
            progress: progress::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Convert every image in the input directory.
    ///
    /// Never fails: missing directories and per-item errors are logged and
    /// recorded in the returned report.
    pub fn run(&self) -> RunReport {
        let mode = WorkMode::ImageToPdf;
        let batch = match discover(&self.settings.directories, "images", list_images) {
            Ok(batch) => batch,
            Err(status) => {
                let report = RunReport::stopped(mode, status);
                self.progress.on_run_complete(&report);
                return report;
            }
        };

        let (plan, notice) = select_image_plan(&self.settings.pdf_strategy);
        if let Some(notice) = notice {
            warn!("{notice}");
        }
        info!(
            "Converting {} images from {} ({})",
            batch.inputs.len(),
            batch.input_dir.display(),
            self.settings.pdf_strategy.mode
        );
        self.progress.on_run_start(mode, batch.inputs.len());

        let mut report = RunReport::new(mode);
        match plan {
            ImagePlan::Merge {
                output_name,
                overwrite,
            } => {
                let outcome = self.merge(&batch, &output_name, overwrite);
                record(&mut report, &self.progress, outcome);
            }
            ImagePlan::PerImage { overwrite } => {
                for image in &batch.inputs {
                    let outcome = self.convert_one(image, &batch.output_dir, overwrite);
                    record(&mut report, &self.progress, outcome);
                }
            }
        }

        self.progress.on_run_complete(&report);
        report
    }

    fn merge(&self, batch: &Batch, output_name: &str, overwrite: bool) -> ItemOutcome {
        let target = merged_target(
            &batch.output_dir,
            output_name,
            overwrite,
            Utc::now().timestamp(),
        );
        if target.requested.is_some() {
            warn!(
                "Output file exists. Renaming to {}",
                file_name(&target.path)
            );
        }

        let written = compose_pdf(&batch.inputs, &target.path)
            .and_then(|bytes| write_output(&target.path, &bytes, overwrite));
        match written {
            Ok(()) => {
                info!(
                    "  Saved {} ({} pages)",
                    file_name(&target.path),
                    batch.inputs.len()
                );
                let status = match target.requested {
                    Some(requested) => ItemStatus::Renamed { requested },
                    None => ItemStatus::Written,
                };
                ItemOutcome {
                    source: batch.input_dir.clone(),
                    target: Some(target.path),
                    status,
                }
            }
            Err(e) => {
                error!("Failed to create {}: {e}", file_name(&target.path));
                ItemOutcome::failed(batch.input_dir.clone(), Some(target.path), e)
            }
        }
    }

    fn convert_one(&self, image: &Path, output_dir: &Path, overwrite: bool) -> ItemOutcome {
        let target = output_dir.join(image_pdf_name(image));
        if !overwrite && target.exists() {
            info!("Skipping {} (exists)", file_name(&target));
            return ItemOutcome::skipped(image, target);
        }

        let written = compose_pdf(&[image], &target)
            .and_then(|bytes| write_output(&target, &bytes, overwrite));
        match written {
            Ok(()) => {
                info!("  Saved {}", file_name(&target));
                ItemOutcome::written(image, target)
            }
            Err(e) => {
                error!("Failed to convert {}: {e}", file_name(image));
                ItemOutcome::failed(image, Some(target), e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::report::RunStatus;
    use crate::settings::PdfMode;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::fs;

    fn workspace(images: &[&str]) -> (tempfile::TempDir, AppSettings) {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("input");
        fs::create_dir(&input).unwrap();
        for name in images {
            DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([9, 9, 9])))
                .save(input.join(name))
                .unwrap();
        }
        let settings = AppSettings::with_defaults(WorkMode::ImageToPdf, root.path());
        (root, settings)
    }

    #[test]
    fn merge_writes_single_file() {
        let (root, settings) = workspace(&["a.png", "b.png"]);
        let report = ImageToPdfConverter::new(&settings).run();
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.items.len(), 1);
        assert!(matches!(report.items[0].status, ItemStatus::Written));
        assert!(root.path().join("output/merged.pdf").is_file());
    }

    #[test]
    fn merge_failure_is_one_failed_item() {
        let (root, settings) = workspace(&["a.png"]);
        fs::write(root.path().join("input/broken.jpg"), b"garbage").unwrap();
        let report = ImageToPdfConverter::new(&settings).run();
        assert_eq!(report.items.len(), 1);
        assert!(matches!(
            report.items[0].error(),
            Some(ConvertError::ImageDecode { .. })
        ));
        assert!(!root.path().join("output/merged.pdf").exists());
    }

    #[test]
    fn one_to_one_isolates_failures() {
        let (root, mut settings) = workspace(&["a.png", "c.png"]);
        fs::write(root.path().join("input/b.png"), b"garbage").unwrap();
        settings.pdf_strategy.mode = PdfMode::OneToOne;

        let report = ImageToPdfConverter::new(&settings).run();
        let summary = report.summary();
        assert_eq!((summary.written, summary.failed), (2, 1));
        assert!(root.path().join("output/a.pdf").is_file());
        assert!(!root.path().join("output/b.pdf").exists());
        assert!(root.path().join("output/c.pdf").is_file());
    }

    #[test]
    fn empty_input_is_no_inputs() {
        let (_root, settings) = workspace(&[]);
        let report = ImageToPdfConverter::new(&settings).run();
        assert_eq!(report.status, RunStatus::NoInputs);
        assert!(report.items.is_empty());
    }
}
