//! Page image encoding and publication.
//!
//! Rendered pages arrive as `DynamicImage`s in whatever pixel layout the
//! rasteriser produced (usually BGRA converted to RGBA). They are first
//! converted to the configured colour model and then encoded in memory.
//!
//! ## Why convert before encoding?
//!
//! Not every encoder accepts every layout: JPEG has no alpha channel and the
//! WebP encoder only takes 8-bit RGB(A)/luma. Reducing to 8-bit RGB or
//! luma first means every configured format can encode every page.
//!
//! ## Why encode to memory first?
//!
//! The target file is only created once the bytes are ready, so an encoder
//! failure never leaves an empty or truncated file that a later run would
//! mistake for finished output and skip.

use crate::error::ConvertError;
use crate::settings::{ColorMode, ImageFormat};
use image::DynamicImage;
use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;

/// Convert `img` to the pixel layout written for `mode`.
pub fn apply_color_mode(img: &DynamicImage, mode: ColorMode) -> DynamicImage {
    match mode {
        ColorMode::Rgb => DynamicImage::ImageRgb8(img.to_rgb8()),
        ColorMode::Grayscale => DynamicImage::ImageLuma8(img.to_luma8()),
    }
}

/// Encode a rendered page; `target` is used for errors only.
pub fn encode_page(
    img: &DynamicImage,
    mode: ColorMode,
    format: ImageFormat,
    target: &Path,
) -> Result<Vec<u8>, ConvertError> {
    let converted = apply_color_mode(img, mode);
    let mut buf = Vec::new();
    converted
        .write_to(&mut Cursor::new(&mut buf), format.encoder_format())
        .map_err(|source| ConvertError::ImageEncode {
            path: target.to_path_buf(),
            source,
        })?;
    debug!(
        "Encoded {}x{} {} page → {} bytes",
        converted.width(),
        converted.height(),
        format,
        buf.len()
    );
    Ok(buf)
}

/// Write `bytes` to `path`.
///
/// Without `overwrite` the file is opened with create-new semantics: a file
/// that appeared since the caller's existence check is reported as
/// [`ConvertError::TargetExists`] and left untouched.
pub fn write_output(path: &Path, bytes: &[u8], overwrite: bool) -> Result<(), ConvertError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options.open(path).map_err(|e| ConvertError::io(path, e))?;
    file.write_all(bytes).map_err(|e| ConvertError::io(path, e))?;
    file.flush().map_err(|e| ConvertError::io(path, e))
}
