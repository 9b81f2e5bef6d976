//! Label composition: a symbol with its human-readable line beneath it.
//!
//! ## Structure
//!
//! - [`font`] - TrueType fonts via `ab_glyph`, with DejaVu Sans built in.
//! - [`task`] - [`RenderTask`], one symbol plus label per canonical code.

mod font;
mod task;

pub use font::LabelFont;
pub use task::{RenderContext, RenderTask};

use crate::RenderError;
use image::{Rgb, RgbImage, imageops};

const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Spacing and text size around a rendered symbol, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelLayout {
    /// Blank space above the symbol.
    pub pad_top: u32,
    /// Space between the bottom of the symbol and the top of the text.
    pub label_gap: u32,
    /// Blank space below the text.
    pub pad_bottom: u32,
    /// Text size.
    pub font_px: f32,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            pad_top: 10,
            label_gap: 5,
            pad_bottom: 15,
            font_px: 14.0,
        }
    }
}

/// A composed label. Never mutated once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledImage {
    index: usize,
    pixels: RgbImage,
}

impl LabeledImage {
    pub const fn new(index: usize, pixels: RgbImage) -> Self {
        Self { index, pixels }
    }

    /// Source row index of the code this label was rendered from.
    pub const fn index(&self) -> usize {
        self.index
    }

    pub const fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Places a symbol above its text on a fresh white raster.
#[derive(Debug)]
pub struct LabelComposer {
    font: LabelFont,
    layout: LabelLayout,
}

impl LabelComposer {
    pub const fn new(font: LabelFont, layout: LabelLayout) -> Self {
        Self { font, layout }
    }

    pub const fn layout(&self) -> &LabelLayout {
        &self.layout
    }

    /// Composes `symbol` and `text` into a labeled image for row `index`.
    ///
    /// The raster is as wide as the wider of the two; both are centered
    /// horizontally.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Layout`] if the symbol is empty or the
    /// resulting raster dimensions overflow.
    pub fn compose(
        &self,
        index: usize,
        symbol: &RgbImage,
        text: &str,
    ) -> Result<LabeledImage, RenderError> {
        let layout_err = |reason: &str| RenderError::Layout {
            row: index + 1,
            reason: reason.to_owned(),
        };

        let (symbol_w, symbol_h) = symbol.dimensions();
        if symbol_w == 0 || symbol_h == 0 {
            return Err(layout_err("symbol renderer returned an empty image"));
        }

        let (text_w, text_h) = self.font.text_size(text, self.layout.font_px);
        let width = symbol_w.max(text_w);
        let height = [
            self.layout.pad_top,
            symbol_h,
            self.layout.label_gap,
            text_h,
            self.layout.pad_bottom,
        ]
        .into_iter()
        .try_fold(0_u32, u32::checked_add)
        .ok_or_else(|| layout_err("label height overflows"))?;

        let mut pixels = RgbImage::from_pixel(width, height, BACKGROUND_COLOR);
        imageops::overlay(
            &mut pixels,
            symbol,
            i64::from((width - symbol_w) / 2),
            i64::from(self.layout.pad_top),
        );

        let text_x = ((width - text_w) / 2) as i32;
        let text_y = (self.layout.pad_top + symbol_h + self.layout.label_gap) as i32;
        self.font.draw(
            &mut pixels,
            TEXT_COLOR,
            text_x,
            text_y,
            self.layout.font_px,
            text,
        );

        Ok(LabeledImage { index, pixels })
    }
}
