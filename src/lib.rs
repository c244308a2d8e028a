//! # pdfbatch
//!
//! Configuration-driven batch conversion between image sets and PDFs.
//!
//! One run works in one direction, chosen by `work_mode`:
//!
//! * `img2pdf` merges the images of a directory into one PDF, or converts
//!   each image into its own PDF
//! * `pdf2img` rasterises every page of every PDF in a directory into
//!   PNG, JPEG or WebP files
//!
//! ## Pipeline Overview
//!
//! ```text
//! config.toml
//!  │
//!  ├─ 1. Resolve   validate keys, substitute defaults, report fallbacks
//!  ├─ 2. Select    map the strategy onto a plan (merge / per image / per page)
//!  ├─ 3. Discover  sorted, non-recursive listing of the input directory
//!  ├─ 4. Convert   lopdf (images → PDF) or pdfium (PDF → images)
//!  └─ 5. Report    one outcome per image, PDF or page
//! ```
//!
//! Only configuration errors are fatal. A missing input directory stops the
//! run cleanly, and a file that fails to convert fails alone while the rest
//! of the batch carries on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfbatch::{load_settings, Engine, LogContext};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let logs = LogContext::stdout();
//!     let report = logs.in_scope(|| -> Result<_, pdfbatch::ConfigError> {
//!         let resolved = load_settings("config.toml")?;
//!         Ok(Engine::new(&resolved.settings).execute())
//!     })?;
//!     eprintln!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [Settings]
//! work_mode = "pdf2img"            # required: img2pdf | pdf2img
//!
//! [Settings.Directories]
//! work_space = "/data"             # default: current directory
//! input_dir  = "input"
//! output_dir = "output"
//!
//! [Settings.PdfOutputStrategy]
//! mode = "many_to_one"             # many_to_one | one_to_one | auto_grouping
//! output_name = "merged.pdf"
//! overwrite_existing = false
//!
//! [Settings.ImageOutputStrategy.Output]
//! image_format = "png"             # png | jpg | jpeg | webp
//! dpi = 300
//! color_mode = "rgb"               # rgb | grayscale
//!
//! [Settings.ImageOutputStrategy.Naming]
//! page_naming = "page_index"       # page_index | original | custom
//! start_index = 1
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfbatch` binary (clap + anyhow) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdfbatch = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! `pdf2img` needs the pdfium shared library at runtime. Set
//! `PDFIUM_LIB_PATH`, place the library in the working directory, or install
//! it system-wide. `img2pdf` does not use pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod convert;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod resolver;
pub mod settings;
pub mod strategy;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use convert::{run, run_config_file, Engine};
pub use error::{ConfigError, ConvertError};
pub use logging::{LogBuffer, LogContext};
pub use pipeline::img2pdf::ImageToPdfConverter;
pub use pipeline::pdf2img::PdfToImageConverter;
pub use pipeline::render::{PdfRasterizer, PdfiumRasterizer, RasterDocument, RasterOptions};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{ItemOutcome, ItemStatus, RunReport, RunStatus, Summary};
pub use resolver::{load_settings, resolve, resolve_str, ConfigResolver, Fallback, Resolved};
pub use settings::{
    AppSettings, AutoGroupingConfig, ColorMode, DirectoriesConfig, GroupBy, ImageFormat,
    ImageMode, ImageNamingConfig, ImageOutputConfig, ImageOutputStrategy, PageNaming, PdfMode,
    PdfOutputStrategy, WorkMode,
};
