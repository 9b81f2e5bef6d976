use super::{PageGeometry, Placement};
use crate::Result;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// How a [`DocumentWriter`] wants page images delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageInput {
    /// Borrowed rasters, straight from memory.
    Memory,
    /// PNG files, spooled into `dir` for the duration of one page.
    File { dir: PathBuf },
}

/// A page image as handed to the writer.
#[derive(Clone, Copy, Debug)]
pub enum PageImage<'a> {
    Raster(&'a RgbImage),
    /// Path of a PNG that is deleted as soon as `add_page` returns.
    File(&'a Path),
}

/// Produces the output document, one page at a time.
pub trait DocumentWriter {
    /// Delivery mode for page images. Defaults to [`ImageInput::Memory`].
    fn image_input(&self) -> ImageInput {
        ImageInput::Memory
    }

    /// Appends a page of size `geometry` with `image` drawn at `placement`.
    ///
    /// The image must be fully consumed before returning; a
    /// [`PageImage::File`] does not outlive the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be read or embedded.
    fn add_page(
        &mut self,
        geometry: &PageGeometry,
        placement: &Placement,
        image: PageImage<'_>,
    ) -> Result<()>;

    /// Writes every page added so far to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or written.
    fn save(&mut self, path: &Path) -> Result<()>;
}
