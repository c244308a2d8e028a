//! Input discovery: list convertible files directly inside a directory.
//!
//! ## Why not recurse?
//!
//! Output directories are commonly placed next to (or inside) the input
//! directory. A recursive walk would pick up PDFs or page images written by
//! an earlier run and feed them back in. Only regular files at the top level
//! are considered.
//!
//! Results are sorted by file name so page order in a merged PDF, and the
//! order of log lines, are deterministic across platforms.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions accepted as image inputs (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

/// Extension accepted as PDF input (compared case-insensitively).
pub const PDF_EXTENSION: &str = "pdf";

/// Images directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    list_matching(dir, IMAGE_EXTENSIONS)
}

/// PDFs directly inside `dir`, sorted by file name.
pub fn list_pdfs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    list_matching(dir, &[PDF_EXTENSION])
}

/// `true` when `path` has one of `extensions`, ignoring ASCII case.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| ext.eq_ignore_ascii_case(x)))
}

fn list_matching(dir: &Path, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} matching files in {}", files.len(), dir.display());
    Ok(files)
}
