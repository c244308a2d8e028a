//! Image → PDF assembly with lopdf.
//!
//! Each image becomes one page whose size is the image's pixel size at
//! 96 DPI, with the image filling the page.
//!
//! ## Why embed JPEGs as-is?
//!
//! PDF readers decode baseline and progressive JPEG natively (`DCTDecode`).
//! Copying the file bytes into the image XObject keeps the merge lossless
//! and avoids a decode/re-encode round trip. Only 8-bit greyscale and
//! three-component JPEGs are copied; CMYK or unusual frame types are decoded
//! like any other format.
//!
//! Everything else is decoded with the `image` crate and stored as RGB or
//! greyscale samples behind `FlateDecode`. 16-bit sources keep 16 bits per
//! component (big-endian, as PDF requires); all other sources are stored
//! with 8. Alpha is discarded with a warning.

use crate::error::ConvertError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, DynamicImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// PDF points per image pixel (72 pt per inch / 96 px per inch).
pub const POINTS_PER_PIXEL: f32 = 0.75;

const IMAGE_NAME: &str = "Im0";

/// Incrementally built PDF with one image per page.
pub struct PdfComposer {
    document: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl Default for PdfComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfComposer {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Read `path` and append it as a new page.
    pub fn add_image_file(&mut self, path: &Path) -> Result<(), ConvertError> {
        let bytes = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
        self.add_image_bytes(path, bytes)
    }

    /// Append an already loaded image file; `path` is used for errors only.
    pub fn add_image_bytes(&mut self, path: &Path, bytes: Vec<u8>) -> Result<(), ConvertError> {
        let embedded = match jpeg_frame(&bytes).filter(JpegFrame::is_passthrough) {
            Some(frame) => EmbeddedImage::jpeg(frame, bytes),
            None => {
                let decoded = image::load_from_memory(&bytes).map_err(|source| {
                    ConvertError::ImageDecode {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                if decoded.color().has_alpha() {
                    warn!("Dropping alpha channel of {}", path.display());
                }
                EmbeddedImage::flate(&decoded).map_err(|e| ConvertError::PdfAssembly {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })?
            }
        };
        debug!(
            "Embedding {} ({}x{}, {})",
            path.display(),
            embedded.width,
            embedded.height,
            embedded.filter
        );
        self.push_page(path, embedded)
    }

    fn push_page(&mut self, path: &Path, image: EmbeddedImage) -> Result<(), ConvertError> {
        let width = image.width as f32 * POINTS_PER_PIXEL;
        let height = image.height as f32 * POINTS_PER_PIXEL;

        let xobject = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width),
                "Height" => i64::from(image.height),
                "ColorSpace" => image.color_space,
                "BitsPerComponent" => i64::from(image.bits_per_component),
                "Filter" => image.filter,
            },
            image.data,
        );
        let image_id = self.document.add_object(xobject);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width.into(),
                        0.into(),
                        0.into(),
                        height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|e| ConvertError::PdfAssembly {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, encoded));

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { IMAGE_NAME => image_id },
            },
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Serialise the document; `target` is used for errors only.
    pub fn finish(mut self, target: &Path) -> Result<Vec<u8>, ConvertError> {
        let assembly = |detail: String| ConvertError::PdfAssembly {
            path: target.to_path_buf(),
            detail,
        };
        if self.page_ids.is_empty() {
            return Err(assembly("no pages to write".to_string()));
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        let count = kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.document.add_object(dictionary! {
            "Producer" => Object::string_literal(concat!("pdfbatch ", env!("CARGO_PKG_VERSION"))),
        });
        self.document.trailer.set("Root", catalog_id);
        self.document.trailer.set("Info", info_id);

        let mut out = Vec::new();
        self.document
            .save_to(&mut out)
            .map_err(|e| assembly(e.to_string()))?;
        Ok(out)
    }
}

/// Build a PDF from `images` in the given order.
pub fn compose_pdf<P: AsRef<Path>>(images: &[P], target: &Path) -> Result<Vec<u8>, ConvertError> {
    let mut composer = PdfComposer::new();
    for image in images {
        composer.add_image_file(image.as_ref())?;
    }
    composer.finish(target)
}

// ── Image XObject payloads ───────────────────────────────────────────────

struct EmbeddedImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    bits_per_component: u8,
    filter: &'static str,
    data: Vec<u8>,
}

impl EmbeddedImage {
    fn jpeg(frame: JpegFrame, bytes: Vec<u8>) -> Self {
        Self {
            width: u32::from(frame.width),
            height: u32::from(frame.height),
            color_space: if frame.components == 1 {
                "DeviceGray"
            } else {
                "DeviceRGB"
            },
            bits_per_component: frame.precision,
            filter: "DCTDecode",
            data: bytes,
        }
    }

    fn flate(image: &DynamicImage) -> std::io::Result<Self> {
        let wide = matches!(
            image.color(),
            ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16
        );
        let (color_space, bits_per_component, raw) = match (image.color().has_color(), wide) {
            (true, true) => ("DeviceRGB", 16, big_endian(image.to_rgb16().into_raw())),
            (false, true) => ("DeviceGray", 16, big_endian(image.to_luma16().into_raw())),
            (true, false) => ("DeviceRGB", 8, image.to_rgb8().into_raw()),
            (false, false) => ("DeviceGray", 8, image.to_luma8().into_raw()),
        };
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            color_space,
            bits_per_component,
            filter: "FlateDecode",
            data: encoder.finish()?,
        })
    }
}

fn big_endian(samples: Vec<u16>) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_be_bytes()).collect()
}

/// Frame header of a JPEG file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegFrame {
    marker: u8,
    precision: u8,
    width: u16,
    height: u16,
    components: u8,
}

impl JpegFrame {
    /// Baseline, extended or progressive Huffman; 8-bit; grey or three-channel.
    fn is_passthrough(&self) -> bool {
        matches!(self.marker, 0xC0..=0xC2)
            && self.precision == 8
            && matches!(self.components, 1 | 3)
            && self.width > 0
            && self.height > 0
    }
}

/// Scan the marker segments of a JPEG up to its first SOF header.
fn jpeg_frame(bytes: &[u8]) -> Option<JpegFrame> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut i = 2;
    while i + 1 < bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        match marker {
            // fill byte
            0xFF => {
                i += 1;
                continue;
            }
            // markers without a length field
            0x01 | 0xD0..=0xD7 => {
                i += 2;
                continue;
            }
            // start of scan or end of image before any frame header
            0xDA | 0xD9 => return None,
            _ => {}
        }
        let len = usize::from(u16::from_be_bytes([*bytes.get(i + 2)?, *bytes.get(i + 3)?]));
        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let seg = bytes.get(i + 4..i + 2 + len)?;
            if seg.len() < 6 {
                return None;
            }
            return Some(JpegFrame {
                marker,
                precision: seg[0],
                height: u16::from_be_bytes([seg[1], seg[2]]),
                width: u16::from_be_bytes([seg[3], seg[4]]),
                components: seg[5],
            });
        }
        i += 2 + len;
    }
    None
}
