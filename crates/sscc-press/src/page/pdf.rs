use super::{DocumentWriter, ImageInput, PageGeometry, PageImage, Placement};
use crate::{Error, Result};
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::borrow::Cow;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name under which each page references its label image.
const IMAGE_NAME: &[u8] = b"Label";

/// Converts millimetres to PDF points.
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// Writes pages into a single PDF with `lopdf`.
///
/// Each page gets its own RGB image XObject; streams are Flate-compressed on
/// save. No timestamps are embedded, so identical input yields identical
/// bytes.
///
/// Saving writes a temporary file next to the target and renames it into
/// place, so the target is either the complete document or untouched.
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    spool_dir: Option<PathBuf>,
    /// Set on the first save; the catalog is only created once.
    catalog_id: Option<ObjectId>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    /// Writer that embeds page images straight from memory.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            spool_dir: None,
            catalog_id: None,
        }
    }

    /// Writer that takes page images as PNG files spooled into `dir`.
    pub fn spooled(dir: impl Into<PathBuf>) -> Self {
        Self {
            spool_dir: Some(dir.into()),
            ..Self::new()
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn load(image: PageImage<'_>) -> Result<Cow<'_, RgbImage>> {
        match image {
            PageImage::Raster(pixels) => Ok(Cow::Borrowed(pixels)),
            PageImage::File(path) => image::open(path)
                .map(|img| Cow::Owned(img.to_rgb8()))
                .map_err(|e| Error::Document {
                    context: format!("Failed to read page image {}: {e}", path.display()),
                }),
        }
    }
}

fn pdf_error(what: &str, e: &impl std::fmt::Display) -> Error {
    Error::Document {
        context: format!("{what}: {e}"),
    }
}

impl DocumentWriter for PdfWriter {
    fn image_input(&self) -> ImageInput {
        self.spool_dir
            .as_ref()
            .map_or(ImageInput::Memory, |dir| ImageInput::File { dir: dir.clone() })
    }

    fn add_page(
        &mut self,
        geometry: &PageGeometry,
        placement: &Placement,
        image: PageImage<'_>,
    ) -> Result<()> {
        let pixels = Self::load(image)?;
        let (width, height) = pixels.dimensions();

        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            pixels.as_raw().clone(),
        ));

        // PDF user space grows upwards from the bottom-left corner.
        let page_w = mm_to_pt(geometry.width_mm);
        let page_h = mm_to_pt(geometry.height_mm);
        let draw_w = mm_to_pt(placement.width_mm);
        let draw_h = mm_to_pt(placement.height_mm);
        let x = mm_to_pt(placement.x_mm);
        let y = page_h - mm_to_pt(placement.y_mm) - draw_h;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(draw_w),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(draw_h),
                        Object::Real(x),
                        Object::Real(y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content = content
            .encode()
            .map_err(|e| pdf_error("Failed to encode page content", &e))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_w),
                Object::Real(page_h),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Label" => image_id,
                },
            },
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        if self.catalog_id.is_none() {
            let catalog_id = self.doc.add_object(dictionary! {
                "Type" => "Catalog",
                "Pages" => self.pages_id,
            });
            let info_id = self.doc.add_object(dictionary! {
                "Producer" => Object::string_literal(concat!("sscc-press ", env!("CARGO_PKG_VERSION"))),
            });
            self.doc.trailer.set("Root", catalog_id);
            self.doc.trailer.set("Info", info_id);
            self.catalog_id = Some(catalog_id);
        }
        self.doc.compress();

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file = tempfile::Builder::new()
            .prefix(".sscc-press-")
            .suffix(".pdf.part")
            .tempfile_in(dir)?;

        let mut out = BufWriter::new(file);
        self.doc
            .save_to(&mut out)
            .map_err(|e| pdf_error(&format!("Failed to write {}", path.display()), &e))?;
        out.flush()?;
        let file: NamedTempFile = out.into_inner().map_err(|e| e.into_error())?;

        file.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}
