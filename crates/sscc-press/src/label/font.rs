use crate::{Error, Result};
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::borrow::Cow;
use std::path::Path;

/// DejaVu Sans, shipped with the crate so a label can always be drawn.
/// License: `assets/LICENSE-DejaVu.txt`.
static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Fonts tried, in order, by [`LabelFont::system`].
const SYSTEM_FONTS: [&str; 7] = [
    "arial.ttf",
    "LiberationSans-Regular.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
];

/// Font used to draw the human-readable line under a symbol.
///
/// Cloning is cheap; the font data is shared.
#[derive(Clone)]
pub struct LabelFont {
    font: FontArc,
    source: Cow<'static, str>,
}

impl LabelFont {
    /// Loads a TrueType/OpenType font from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Font`] if
    /// it is not a font `ab_glyph` can parse.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = FontArc::try_from_vec(data).map_err(|_| Error::Font {
            context: format!("Failed to parse font file: {}", path.display()),
        })?;
        Ok(Self {
            font,
            source: Cow::Owned(path.display().to_string()),
        })
    }

    /// The DejaVu Sans font built into the crate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Font`] if the embedded data fails to parse.
    pub fn embedded() -> Result<Self> {
        let font = FontArc::try_from_slice(EMBEDDED_FONT).map_err(|_| Error::Font {
            context: "Failed to parse the embedded DejaVu Sans font".to_string(),
        })?;
        Ok(Self {
            font,
            source: Cow::Borrowed("embedded DejaVu Sans"),
        })
    }

    /// Tries common system sans-serif fonts, falling back to
    /// [`LabelFont::embedded`].
    ///
    /// # Errors
    ///
    /// See [`LabelFont::embedded`].
    pub fn system() -> Result<Self> {
        for path in SYSTEM_FONTS {
            if let Ok(font) = Self::from_path(Path::new(path)) {
                #[cfg(feature = "tracing")]
                tracing::info!("Loaded system font: {}", path);
                return Ok(font);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("No system font found, using the embedded font");
        Self::embedded()
    }

    /// Where the font was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Width and height of `text` when drawn at `px` pixels.
    pub fn text_size(&self, text: &str, px: f32) -> (u32, u32) {
        text_size(PxScale::from(px), &self.font, text)
    }

    /// Draws `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, img: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, px: f32, text: &str) {
        draw_text_mut(img, color, x, y, PxScale::from(px), &self.font, text);
    }
}

impl core::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LabelFont")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
