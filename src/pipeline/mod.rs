//! Pipeline stages and the two converters built from them.
//!
//! Each stage module implements exactly one transformation step, so each is
//! independently testable and the PDF backend can be swapped without
//! touching the batch logic.
//!
//! ## Data Flow
//!
//! ```text
//! img2pdf:  input ──▶ compose ──▶ write
//!           (list)    (lopdf)
//!
//! pdf2img:  input ──▶ render ──▶ encode ──▶ write
//!           (list)    (pdfium)   (image)
//! ```
//!
//! 1. [`input`]   — non-recursive, sorted listing of the input directory
//! 2. [`compose`] — assemble images into a PDF, one page per image
//! 3. [`render`]  — rasterise PDF pages behind the [`render::PdfRasterizer`] seam
//! 4. [`encode`]  — colour conversion, in-memory encoding, create-new writes
//!
//! [`img2pdf`] and [`pdf2img`] drive the stages for a whole directory and
//! record one [`ItemOutcome`] per unit of work.

pub mod compose;
pub mod encode;
pub mod img2pdf;
pub mod input;
pub mod pdf2img;
pub mod render;

use crate::progress::ProgressCallback;
use crate::report::{ItemOutcome, RunReport, RunStatus};
use crate::settings::DirectoriesConfig;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Input files and output directory of a run that passed its preconditions.
pub(crate) struct Batch {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub inputs: Vec<PathBuf>,
}

/// Check the input directory, create the output directory and list inputs.
///
/// `kind` names the inputs in log lines ("images", "PDFs").
pub(crate) fn discover(
    dirs: &DirectoriesConfig,
    kind: &str,
    list: fn(&Path) -> io::Result<Vec<PathBuf>>,
) -> Result<Batch, RunStatus> {
    let input_dir = dirs.absolute_input();
    let output_dir = dirs.absolute_output();

    if !input_dir.is_dir() {
        error!("Input directory does not exist: {}", input_dir.display());
        return Err(RunStatus::InputDirMissing);
    }
    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        error!(
            "Failed to create output directory {}: {e}",
            output_dir.display()
        );
        return Err(RunStatus::OutputDirUnavailable);
    }
    let inputs = match list(&input_dir) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("Failed to read input directory {}: {e}", input_dir.display());
            return Err(RunStatus::InputUnreadable);
        }
    };
    if inputs.is_empty() {
        warn!("No {kind} found in {}", input_dir.display());
        return Err(RunStatus::NoInputs);
    }

    Ok(Batch {
        input_dir,
        output_dir,
        inputs,
    })
}

/// Append `outcome` to `report` and forward it to the progress callback.
pub(crate) fn record(report: &mut RunReport, progress: &ProgressCallback, outcome: ItemOutcome) {
    progress.on_item(&outcome);
    report.items.push(outcome);
}

/// Display name of a path for log lines.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
