//! Typed settings for a conversion run.
//!
//! Every value here has already been validated by [`crate::resolver`]; an
//! [`AppSettings`] is built once at startup and only read afterwards. Enum
//! fields are closed types, so an invalid token from the configuration
//! document can never reach a converter.
//!
//! Each enum accepts its snake_case token (the canonical spelling used in log
//! output) and a PascalCase alias when deserialised.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A closed set of configuration tokens.
pub trait Choice: Sized + Copy {
    /// Canonical tokens accepted for this setting, in declaration order.
    const EXPECTED: &'static [&'static str];

    /// Canonical token for this value.
    fn token(self) -> &'static str;
}

/// Render a choice list the way it appears in warnings: `['a', 'b']`.
pub fn format_choices(choices: &[&str]) -> String {
    let quoted: Vec<String> = choices.iter().map(|c| format!("'{c}'")).collect();
    format!("[{}]", quoted.join(", "))
}

macro_rules! impl_choice {
    ($ty:ty, [$($variant:ident => $token:literal),+ $(,)?]) => {
        impl Choice for $ty {
            const EXPECTED: &'static [&'static str] = &[$($token),+];

            fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }
    };
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Direction of conversion for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum WorkMode {
    /// Merge or convert a directory of images into PDF(s).
    #[serde(rename = "img2pdf")]
    ImageToPdf,
    /// Rasterise a directory of PDFs into per-page images.
    #[serde(rename = "pdf2img")]
    PdfToImage,
}

impl_choice!(WorkMode, [ImageToPdf => "img2pdf", PdfToImage => "pdf2img"]);

/// How images are grouped into PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PdfMode {
    /// All images into a single PDF. (default)
    #[default]
    #[serde(rename = "many_to_one", alias = "ManyToOne")]
    ManyToOne,
    /// One PDF per image.
    #[serde(rename = "one_to_one", alias = "OneToOne")]
    OneToOne,
    /// Accepted for forward compatibility; runs as [`PdfMode::ManyToOne`].
    #[serde(rename = "auto_grouping", alias = "AutoGrouping")]
    AutoGrouping,
}

impl_choice!(PdfMode, [
    ManyToOne => "many_to_one",
    OneToOne => "one_to_one",
    AutoGrouping => "auto_grouping",
]);

/// Grouping key for [`PdfMode::AutoGrouping`]. None of these group yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum GroupBy {
    #[default]
    #[serde(rename = "none", alias = "None")]
    None,
    #[serde(rename = "prefix", alias = "Prefix")]
    Prefix,
    #[serde(rename = "directory", alias = "Directory")]
    Directory,
    #[serde(rename = "metadata", alias = "Metadata")]
    Metadata,
}

impl_choice!(GroupBy, [
    None => "none",
    Prefix => "prefix",
    Directory => "directory",
    Metadata => "metadata",
]);

/// PDF → image mapping. Only one page-per-file mode exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ImageMode {
    #[default]
    #[serde(rename = "one_to_one", alias = "OneToOne")]
    OneToOne,
}

impl_choice!(ImageMode, [OneToOne => "one_to_one"]);

/// Raster output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ImageFormat {
    #[default]
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "jpg")]
    Jpg,
    #[serde(rename = "jpeg")]
    Jpeg,
    #[serde(rename = "webp")]
    WebP,
}

impl_choice!(ImageFormat, [Png => "png", Jpg => "jpg", Jpeg => "jpeg", WebP => "webp"]);

impl ImageFormat {
    /// File extension written for this format (the configured token).
    pub fn extension(self) -> &'static str {
        self.token()
    }

    /// Encoder used by the `image` crate.
    pub fn encoder_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpg | ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

/// Colour model of rasterised pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ColorMode {
    #[default]
    #[serde(rename = "rgb")]
    Rgb,
    #[serde(rename = "grayscale")]
    Grayscale,
}

impl_choice!(ColorMode, [Rgb => "rgb", Grayscale => "grayscale"]);

/// File naming scheme for rasterised pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PageNaming {
    /// `page_NNN.<ext>` (default)
    #[default]
    #[serde(rename = "page_index", alias = "PageIndex")]
    PageIndex,
    /// `<pdf stem>_page_NNN.<ext>`
    #[serde(rename = "original", alias = "Original")]
    Original,
    /// Accepted for forward compatibility; names like [`PageNaming::PageIndex`].
    #[serde(rename = "custom", alias = "Custom")]
    Custom,
}

impl_choice!(PageNaming, [
    PageIndex => "page_index",
    Original => "original",
    Custom => "custom",
]);

// ── Structs ──────────────────────────────────────────────────────────────

/// Input and output locations, relative to `work_space` unless absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoriesConfig {
    pub work_space: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl DirectoriesConfig {
    /// Default input directory, relative to the work space.
    pub const DEFAULT_INPUT_DIR: &'static str = "input";
    /// Default output directory, relative to the work space.
    pub const DEFAULT_OUTPUT_DIR: &'static str = "output";

    /// `work_space/input_dir`.
    pub fn absolute_input(&self) -> PathBuf {
        self.work_space.join(&self.input_dir)
    }

    /// `work_space/output_dir`.
    pub fn absolute_output(&self) -> PathBuf {
        self.work_space.join(&self.output_dir)
    }

    /// Defaults anchored at `work_space`.
    pub fn rooted_at(work_space: impl AsRef<Path>) -> Self {
        Self {
            work_space: work_space.as_ref().to_path_buf(),
            input_dir: PathBuf::from(Self::DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(Self::DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Grouping options for [`PdfMode::AutoGrouping`]; validated but inert.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AutoGroupingConfig {
    pub enable: bool,
    pub group_by: GroupBy,
    pub max_images_per_pdf: u32,
}

/// How images are turned into PDFs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfOutputStrategy {
    pub mode: PdfMode,
    /// File name of the merged PDF (many-to-one).
    pub output_name: String,
    pub overwrite_existing: bool,
    pub auto_grouping: AutoGroupingConfig,
}

impl PdfOutputStrategy {
    pub const DEFAULT_OUTPUT_NAME: &'static str = "merged.pdf";
}

impl Default for PdfOutputStrategy {
    fn default() -> Self {
        Self {
            mode: PdfMode::default(),
            output_name: Self::DEFAULT_OUTPUT_NAME.to_string(),
            overwrite_existing: false,
            auto_grouping: AutoGroupingConfig::default(),
        }
    }
}

/// Encoding of each rasterised page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutputConfig {
    pub format: ImageFormat,
    /// Rendering resolution. Always positive.
    pub dpi: u32,
    pub color_mode: ColorMode,
    pub overwrite_existing: bool,
}

impl ImageOutputConfig {
    pub const DEFAULT_DPI: u32 = 300;
}

impl Default for ImageOutputConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            dpi: Self::DEFAULT_DPI,
            color_mode: ColorMode::default(),
            overwrite_existing: false,
        }
    }
}

/// Page file naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNamingConfig {
    pub page_naming: PageNaming,
    /// Number given to the first page; may be zero or negative.
    pub start_index: i64,
}

impl Default for ImageNamingConfig {
    fn default() -> Self {
        Self {
            page_naming: PageNaming::default(),
            start_index: 1,
        }
    }
}

/// How PDFs are turned into images.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageOutputStrategy {
    pub mode: ImageMode,
    pub output: ImageOutputConfig,
    pub naming: ImageNamingConfig,
}

/// Fully resolved settings for one run.
///
/// Both strategies are always present; the one not selected by
/// [`AppSettings::work_mode`] is simply never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub work_mode: WorkMode,
    pub directories: DirectoriesConfig,
    pub pdf_strategy: PdfOutputStrategy,
    pub img_strategy: ImageOutputStrategy,
}

impl AppSettings {
    /// Settings with every optional value at its default.
    pub fn with_defaults(work_mode: WorkMode, work_space: impl AsRef<Path>) -> Self {
        Self {
            work_mode,
            directories: DirectoriesConfig::rooted_at(work_space),
            pdf_strategy: PdfOutputStrategy::default(),
            img_strategy: ImageOutputStrategy::default(),
        }
    }
}
