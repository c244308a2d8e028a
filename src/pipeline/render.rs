//! PDF rasterisation: render every page of a PDF to a `DynamicImage`.
//!
//! ## Why a trait?
//!
//! pdfium is a native library loaded at runtime. [`PdfRasterizer`] is the
//! seam between the PDF → image converter and that library, so the batch
//! logic (naming, skipping, per-page failure isolation) can be exercised
//! without a pdfium binary on the machine.
//!
//! ## Binding order
//!
//! 1. `PDFIUM_LIB_PATH`, when set
//! 2. the platform library name in the working directory (`./libpdfium.so`, …)
//! 3. the system library search path
//!
//! The first that loads wins. Failing all three is reported once for the
//! whole run, not once per PDF.

use crate::error::ConvertError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium library.
pub const PDFIUM_LIB_PATH: &str = "PDFIUM_LIB_PATH";

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Rendering parameters shared by every page of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    pub dpi: u32,
}

impl RasterOptions {
    /// Scale factor from PDF points to output pixels.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / POINTS_PER_INCH
    }
}

/// Opens PDFs for rendering.
pub trait PdfRasterizer {
    /// Open `path`; a corrupt or unreadable file is [`ConvertError::CorruptPdf`].
    fn open<'r>(&'r self, path: &Path) -> Result<Box<dyn RasterDocument + 'r>, ConvertError>;
}

/// An opened PDF.
pub trait RasterDocument {
    fn page_count(&self) -> usize;

    /// Render the 0-based page `index`.
    fn render_page(
        &self,
        index: usize,
        options: &RasterOptions,
    ) -> Result<DynamicImage, ConvertError>;
}

/// [`PdfRasterizer`] backed by pdfium-render.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind to a pdfium library (see the module docs for the search order).
    pub fn bind() -> Result<Self, ConvertError> {
        let mut attempts = Vec::new();

        if let Some(path) = std::env::var_os(PDFIUM_LIB_PATH).map(PathBuf::from) {
            match Pdfium::bind_to_library(&path) {
                Ok(bindings) => {
                    info!("Using pdfium from {}", path.display());
                    return Ok(Self::new(Pdfium::new(bindings)));
                }
                Err(e) => attempts.push(format!("{}: {e:?}", path.display())),
            }
        }

        let local = Pdfium::pdfium_platform_library_name_at_path("./");
        match Pdfium::bind_to_library(&local) {
            Ok(bindings) => {
                debug!("Using pdfium from the working directory");
                return Ok(Self::new(Pdfium::new(bindings)));
            }
            Err(e) => attempts.push(format!("working directory: {e:?}")),
        }

        match Pdfium::bind_to_system_library() {
            Ok(bindings) => {
                debug!("Using system pdfium");
                Ok(Self::new(Pdfium::new(bindings)))
            }
            Err(e) => {
                attempts.push(format!("system library: {e:?}"));
                Err(ConvertError::PdfiumBindingFailed(attempts.join("; ")))
            }
        }
    }

    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }
}

impl PdfRasterizer for PdfiumRasterizer {
    fn open<'r>(&'r self, path: &Path) -> Result<Box<dyn RasterDocument + 'r>, ConvertError> {
        let document =
            self.pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| ConvertError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("{:?}", e),
                })?;
        debug!(
            "PDF loaded: {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Box::new(PdfiumDocument {
            path: path.to_path_buf(),
            document,
        }))
    }
}

struct PdfiumDocument<'a> {
    path: PathBuf,
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page_error(&self, index: usize, detail: String) -> ConvertError {
        ConvertError::Rasterisation {
            path: self.path.clone(),
            page: index + 1,
            detail,
        }
    }
}

impl RasterDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(
        &self,
        index: usize,
        options: &RasterOptions,
    ) -> Result<DynamicImage, ConvertError> {
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| self.page_error(index, format!("{:?}", e)))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(options.scale());
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| self.page_error(index, format!("{:?}", e)))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
