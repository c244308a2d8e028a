//! Output strategy selection and file naming.
//!
//! Everything in this module is a pure decision: it maps resolved settings
//! onto a plan and computes target paths, but never writes anything. The
//! converters in [`crate::pipeline`] execute the plans.
//!
//! ## Unimplemented branches
//!
//! `auto_grouping` and `custom` page naming are accepted by the resolver so
//! configuration files written for later versions keep loading. At runtime
//! they behave like their nearest implemented sibling, and the selector
//! returns a [`Notice`] so the converter can say so in the log.

use crate::logging::OPTION_TAG;
use crate::settings::{
    ColorMode, ImageFormat, ImageOutputStrategy, PageNaming, PdfMode, PdfOutputStrategy,
};
use std::fmt;
use std::path::{Path, PathBuf};

// ── Plans ────────────────────────────────────────────────────────────────

/// What an image → PDF run will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePlan {
    /// All images into `output_name`; collisions are renamed.
    Merge { output_name: String, overwrite: bool },
    /// One `<stem>.pdf` per image; collisions are skipped.
    PerImage { overwrite: bool },
}

/// File naming scheme actually executed for rasterised pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageScheme {
    /// `page_NNN.<ext>`
    PageIndex,
    /// `<stem>_page_NNN.<ext>`
    Original,
}

/// What a PDF → image run will do for each page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pub scheme: PageScheme,
    pub format: ImageFormat,
    pub dpi: u32,
    pub color_mode: ColorMode,
    pub overwrite: bool,
    pub start_index: i64,
}

impl PagePlan {
    /// Target file name for the 0-based page `index` of the PDF `stem`.
    pub fn file_name(&self, stem: &str, index: usize) -> String {
        let number = self.start_index.saturating_add(index as i64);
        page_file_name(self.scheme, stem, number, self.format.extension())
    }
}

/// A configured behaviour that is accepted but not implemented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// `auto_grouping` runs as `many_to_one`.
    AutoGroupingFallback,
    /// `custom` page naming names pages like `page_index`.
    CustomNamingFallback,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AutoGroupingFallback => write!(
                f,
                "{OPTION_TAG} Auto grouping not fully implemented. Falling back to {}.",
                PdfMode::ManyToOne
            ),
            Notice::CustomNamingFallback => write!(
                f,
                "{OPTION_TAG} Custom page naming not implemented. Falling back to {}.",
                PageNaming::PageIndex
            ),
        }
    }
}

/// Pick the image → PDF plan for `strategy`.
pub fn select_image_plan(strategy: &PdfOutputStrategy) -> (ImagePlan, Option<Notice>) {
    let merge = ImagePlan::Merge {
        output_name: strategy.output_name.clone(),
        overwrite: strategy.overwrite_existing,
    };
    match strategy.mode {
        PdfMode::ManyToOne => (merge, None),
        PdfMode::OneToOne => (
            ImagePlan::PerImage {
                overwrite: strategy.overwrite_existing,
            },
            None,
        ),
        PdfMode::AutoGrouping => (merge, Some(Notice::AutoGroupingFallback)),
    }
}

/// Pick the PDF → image plan for `strategy`.
pub fn select_page_plan(strategy: &ImageOutputStrategy) -> (PagePlan, Option<Notice>) {
    let (scheme, notice) = match strategy.naming.page_naming {
        PageNaming::PageIndex => (PageScheme::PageIndex, None),
        PageNaming::Original => (PageScheme::Original, None),
        PageNaming::Custom => (PageScheme::PageIndex, Some(Notice::CustomNamingFallback)),
    };
    let out = &strategy.output;
    let plan = PagePlan {
        scheme,
        format: out.format,
        dpi: out.dpi,
        color_mode: out.color_mode,
        overwrite: out.overwrite_existing,
        start_index: strategy.naming.start_index,
    };
    (plan, notice)
}

// ── Naming ───────────────────────────────────────────────────────────────

/// Page file name with the number zero-padded to three digits.
pub fn page_file_name(scheme: PageScheme, stem: &str, number: i64, ext: &str) -> String {
    match scheme {
        PageScheme::PageIndex => format!("page_{number:03}.{ext}"),
        PageScheme::Original => format!("{stem}_page_{number:03}.{ext}"),
    }
}

/// `<stem>.pdf` for a source image.
pub fn image_pdf_name(image: &Path) -> String {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}.pdf")
}

/// Insert `_<suffix>` before the extension: `merged.pdf` → `merged_<suffix>.pdf`.
pub fn timestamped_name(name: &str, suffix: &str) -> String {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}_{suffix}.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        ),
        _ => format!("{name}_{suffix}"),
    }
}

/// Where a merged PDF will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeTarget {
    pub path: PathBuf,
    /// Set when the configured name was taken and `path` is a renamed variant.
    pub requested: Option<PathBuf>,
}

/// Resolve the merged output path for `name` in `dir`.
///
/// With `overwrite` the configured path is used as is. Otherwise a taken
/// path becomes `<stem>_<timestamp>.<ext>`, and if that is taken too,
/// `<stem>_<timestamp>_<n>.<ext>` with the smallest free `n`.
pub fn merged_target(dir: &Path, name: &str, overwrite: bool, timestamp: i64) -> MergeTarget {
    let requested = dir.join(name);
    if overwrite || !requested.exists() {
        return MergeTarget {
            path: requested,
            requested: None,
        };
    }

    let mut path = dir.join(timestamped_name(name, &timestamp.to_string()));
    let mut n = 1u32;
    while path.exists() {
        path = dir.join(timestamped_name(name, &format!("{timestamp}_{n}")));
        n += 1;
    }
    MergeTarget {
        path,
        requested: Some(requested),
    }
}
