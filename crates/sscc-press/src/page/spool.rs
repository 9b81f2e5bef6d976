use crate::{Error, Result};
use image::{RgbImage, codecs::png::PngEncoder};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A page image written to a uniquely named temporary PNG.
///
/// The file is removed when the guard drops, whichever way the page embed
/// went.
pub(crate) struct SpooledImage {
    file: NamedTempFile,
}

impl SpooledImage {
    pub(crate) fn create(dir: &Path, index: usize, pixels: &RgbImage) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(&format!("temp_{index}_"))
            .suffix(".png")
            .tempfile_in(dir)?;

        let mut out = BufWriter::new(file);
        pixels
            .write_with_encoder(PngEncoder::new(&mut out))
            .map_err(|e| Error::Document {
                context: format!("Failed to encode page {} as PNG: {e}", index + 1),
            })?;
        out.flush()?;
        let file = out.into_inner().map_err(|e| e.into_error())?;

        Ok(Self { file })
    }

    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }
}
