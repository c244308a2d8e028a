//! Error types for the pdfbatch library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConfigError`] — **Fatal**: the configuration document is missing,
//!   unparseable, or lacks the required `work_mode`. Nothing is converted;
//!   the binary exits with a non-zero status.
//!
//! * [`ConvertError`] — **Non-fatal**: a single image, PDF or page failed
//!   (decode error, corrupt file, encoder failure). Stored inside
//!   [`crate::report::ItemOutcome`] so the batch keeps going and callers can
//!   inspect partial success afterwards.
//!
//! Optional keys never produce an error at all: they fall back to a default
//! and are reported as [`crate::resolver::Fallback`] values instead.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors returned by [`crate::resolver`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Config file not found: '{path}'")]
    NotFound { path: PathBuf },

    /// The configuration file exists but could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML.
    #[error("Invalid TOML format: {0}")]
    Parse(#[from] toml::de::Error),

    /// The top-level `[Settings]` table is absent.
    #[error("Missing [Settings] section in config.")]
    MissingSettings,

    /// `Settings` exists but is a scalar or an array.
    #[error("[Settings] must be a table, found {found}.")]
    SettingsNotTable { found: &'static str },

    /// A required key is absent.
    #[error("Missing required config key: '{key}'")]
    MissingRequired { key: String },

    /// A required key holds a value outside its enumerated choices.
    #[error("Invalid value for '{key}': {value}. Expected one of {expected}")]
    InvalidRequired {
        key: String,
        value: String,
        expected: String,
    },
}

/// A recoverable failure of one unit of conversion work.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source image could not be read or decoded.
    #[error("Failed to decode image '{path}': {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A rendered page could not be encoded into the target format.
    #[error("Failed to encode image '{path}': {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// lopdf refused to serialise the assembled document.
    #[error("Failed to assemble PDF '{path}': {detail}")]
    PdfAssembly { path: PathBuf, detail: String },

    /// pdfium could not open the source PDF.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium failed while rendering a single page.
    #[error("Rasterisation failed for page {page} of '{path}': {detail}")]
    Rasterisation {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// No pdfium library could be bound for this run.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// Filesystem error while creating a directory or writing an output.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target appeared between the collision check and the write.
    #[error("Output '{path}' was created by someone else while converting; not overwriting")]
    TargetExists { path: PathBuf },
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::AlreadyExists {
            ConvertError::TargetExists { path }
        } else {
            ConvertError::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_display() {
        let e = ConfigError::MissingRequired {
            key: "work_mode".into(),
        };
        assert!(e.to_string().contains("'work_mode'"), "got: {e}");
    }

    #[test]
    fn invalid_required_lists_choices() {
        let e = ConfigError::InvalidRequired {
            key: "work_mode".into(),
            value: "\"pdf2txt\"".into(),
            expected: "['img2pdf', 'pdf2img']".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pdf2txt"));
        assert!(msg.contains("img2pdf"));
    }

    #[test]
    fn already_exists_maps_to_target_exists() {
        let err = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "exists");
        let e = ConvertError::io("out/a.pdf", err);
        assert!(matches!(e, ConvertError::TargetExists { .. }));
    }

    #[test]
    fn other_io_kinds_stay_io() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let e = ConvertError::io("out/a.pdf", err);
        assert!(matches!(e, ConvertError::Io { .. }));
        assert!(e.to_string().contains("out/a.pdf"));
    }

    #[test]
    fn rasterisation_display() {
        let e = ConvertError::Rasterisation {
            path: "doc.pdf".into(),
            page: 3,
            detail: "bad xref".into(),
        };
        assert!(e.to_string().contains("page 3"));
        assert!(e.to_string().contains("bad xref"));
    }
}
