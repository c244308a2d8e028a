//! Shared helpers for the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::Document;
use pdfbatch::{
    AppSettings, ConfigResolver, ConvertError, PdfRasterizer, RasterDocument, RasterOptions,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A temporary work space with an empty `input/` directory.
pub struct Workspace {
    pub root: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        fs::create_dir(root.path().join("input")).expect("input dir");
        Self { root }
    }

    /// A work space without an input directory.
    pub fn without_input() -> Self {
        Self {
            root: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn input(&self) -> PathBuf {
        self.path().join("input")
    }

    pub fn output(&self) -> PathBuf {
        self.path().join("output")
    }

    /// Write a solid-colour image; the format follows the file extension.
    pub fn image(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.input().join(name);
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 60, 30])))
            .save(&path)
            .expect("save image");
        path
    }

    /// Write a placeholder PDF file (contents are only read by the fake rasteriser).
    pub fn pdf(&self, name: &str) -> PathBuf {
        let path = self.input().join(name);
        fs::write(&path, b"%PDF-1.4\n").expect("write pdf");
        path
    }

    /// Resolve `[Settings]` + `body` with this work space as the default root.
    pub fn settings(&self, body: &str) -> AppSettings {
        let text = format!("[Settings]\n{body}");
        let doc: toml::Table = text.parse().expect("valid toml");
        ConfigResolver::with_work_dir(self.path())
            .resolve(&doc)
            .expect("resolvable settings")
            .settings
    }

    /// File names in `dir`, sorted.
    pub fn names_in(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Width in pixels of the image on each page, in page order.
pub fn page_image_widths(pdf: &Path) -> Vec<i64> {
    let doc = Document::load_mem(&fs::read(pdf).expect("read pdf")).expect("parse pdf");
    doc.get_pages()
        .values()
        .map(|page_id| {
            let page = doc.get_dictionary(*page_id).expect("page dict");
            let xobjects = page
                .get(b"Resources")
                .and_then(|r| r.as_dict())
                .and_then(|r| r.get(b"XObject"))
                .and_then(|x| x.as_dict())
                .expect("xobjects");
            let id = xobjects
                .get(b"Im0")
                .and_then(|o| o.as_reference())
                .expect("image ref");
            doc.get_object(id)
                .and_then(|o| o.as_stream())
                .and_then(|s| s.dict.get(b"Width"))
                .and_then(|w| w.as_i64())
                .expect("width")
        })
        .collect()
}

/// Rasteriser returning solid pages, with page counts keyed by file name.
///
/// Files it does not know are reported as corrupt. Every rendered page is
/// recorded as `(file name, page index, dpi)`.
#[derive(Default)]
pub struct FakeRasterizer {
    pub pages: HashMap<String, usize>,
    pub fail_pages: Vec<(String, usize)>,
    pub rendered: Arc<Mutex<Vec<(String, usize, u32)>>>,
}

impl FakeRasterizer {
    pub fn with(pdfs: &[(&str, usize)]) -> Self {
        Self {
            pages: pdfs.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            ..Self::default()
        }
    }
}

struct FakeDocument {
    name: String,
    pages: usize,
    fail_pages: Vec<usize>,
    rendered: Arc<Mutex<Vec<(String, usize, u32)>>>,
}

impl PdfRasterizer for FakeRasterizer {
    fn open<'r>(&'r self, path: &Path) -> Result<Box<dyn RasterDocument + 'r>, ConvertError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pages = *self.pages.get(&name).ok_or_else(|| ConvertError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "not a PDF".into(),
        })?;
        let fail_pages = self
            .fail_pages
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, i)| *i)
            .collect();
        Ok(Box::new(FakeDocument {
            name,
            pages,
            fail_pages,
            rendered: Arc::clone(&self.rendered),
        }))
    }
}

impl RasterDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn render_page(
        &self,
        index: usize,
        options: &RasterOptions,
    ) -> Result<DynamicImage, ConvertError> {
        if self.fail_pages.contains(&index) {
            return Err(ConvertError::Rasterisation {
                path: PathBuf::from(&self.name),
                page: index + 1,
                detail: "injected failure".into(),
            });
        }
        self.rendered
            .lock()
            .expect("lock")
            .push((self.name.clone(), index, options.dpi));
        Ok(DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            8,
            6,
            image::Rgba([200, 40, 40, 255]),
        )))
    }
}
