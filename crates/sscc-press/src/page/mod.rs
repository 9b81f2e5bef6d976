//! Page layout and document output.
//!
//! [`PageAssembler`] turns the ordered labels into one fixed-size [`Page`]
//! each and streams them into a [`DocumentWriter`].
//!
//! ## Structure
//!
//! - [`writer`] - the [`DocumentWriter`] seam and how images are delivered.
//! - [`pdf`] - [`PdfWriter`], the `lopdf` backed writer.
//! - `spool` - scoped temporary PNGs for writers that want files.

mod pdf;
mod spool;
mod writer;

pub use pdf::{PdfWriter, mm_to_pt};
pub use writer::{DocumentWriter, ImageInput, PageImage};

use crate::{LabeledImage, Result};
use spool::SpooledImage;
use std::path::Path;

/// Physical page size and where the label goes on it, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    /// Width of the label on the page.
    pub image_width_mm: f32,
    /// Height of the label on the page. `None` keeps the label's aspect
    /// ratio.
    pub image_height_mm: Option<f32>,
    /// Distance from the top edge of the page to the top of the label.
    pub image_top_mm: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width_mm: 100.0,
            height_mm: 60.0,
            image_width_mm: 80.0,
            image_height_mm: Some(40.0),
            image_top_mm: 10.0,
        }
    }
}

impl PageGeometry {
    /// Placement of a `width_px` x `height_px` label: horizontally centered,
    /// `image_top_mm` below the top edge.
    ///
    /// Without a fixed height the label keeps its aspect ratio and is scaled
    /// down, if needed, so it ends at the bottom edge at the latest.
    pub fn placement(&self, width_px: u32, height_px: u32) -> Placement {
        let (width_mm, height_mm) = match self.image_height_mm {
            Some(height_mm) => (self.image_width_mm, height_mm),
            None if width_px == 0 => (self.image_width_mm, 0.0),
            None => {
                let aspect = height_px as f32 / width_px as f32;
                let available = (self.height_mm - self.image_top_mm).max(0.0);
                let height_mm = self.image_width_mm * aspect;
                if height_mm > available {
                    (available / aspect, available)
                } else {
                    (self.image_width_mm, height_mm)
                }
            }
        };

        Placement {
            x_mm: (self.width_mm - width_mm) / 2.0,
            y_mm: self.image_top_mm,
            width_mm,
            height_mm,
        }
    }
}

/// Where an image sits on its page, measured from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// One label on one page.
#[derive(Clone, Debug)]
pub struct Page {
    image: LabeledImage,
    placement: Placement,
}

impl Page {
    /// Source row index of the label.
    pub const fn index(&self) -> usize {
        self.image.index()
    }

    pub const fn image(&self) -> &LabeledImage {
        &self.image
    }

    pub const fn placement(&self) -> &Placement {
        &self.placement
    }
}

/// Pages in source order, all sharing one geometry.
#[derive(Clone, Debug)]
pub struct Document {
    geometry: PageGeometry,
    pages: Vec<Page>,
}

impl Document {
    pub const fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Lays labels out one per page and writes the result.
#[derive(Clone, Debug, Default)]
pub struct PageAssembler {
    geometry: PageGeometry,
}

impl PageAssembler {
    pub const fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    pub const fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Builds one page per image, keeping the given order.
    pub fn assemble(&self, images: Vec<LabeledImage>) -> Document {
        let pages = images
            .into_iter()
            .map(|image| Page {
                placement: self.geometry.placement(image.width(), image.height()),
                image,
            })
            .collect();

        Document {
            geometry: self.geometry,
            pages,
        }
    }

    /// Hands every page of `document` to `writer`, then saves to `output`.
    ///
    /// Pages are released as soon as they are embedded. When the writer asks
    /// for files, each image is spooled to a temporary PNG that is deleted
    /// right after its page is added, including when adding it fails.
    ///
    /// # Errors
    ///
    /// Returns the first error from spooling, embedding, or saving.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(pages = document.len(), output = %output.display())))]
    pub fn write<W>(&self, document: Document, writer: &mut W, output: &Path) -> Result<()>
    where
        W: DocumentWriter + ?Sized,
    {
        let input = writer.image_input();
        let geometry = document.geometry;

        for page in document.pages {
            match &input {
                ImageInput::Memory => writer.add_page(
                    &geometry,
                    &page.placement,
                    PageImage::Raster(page.image.pixels()),
                )?,
                ImageInput::File { dir } => {
                    let spooled = SpooledImage::create(dir, page.index(), page.image.pixels())?;
                    writer.add_page(
                        &geometry,
                        &page.placement,
                        PageImage::File(spooled.path()),
                    )?;
                }
            }
        }

        writer.save(output)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Document written to {}", output.display());
        Ok(())
    }
}
