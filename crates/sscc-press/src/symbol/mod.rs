//! Barcode symbol rendering.
//!
//! The pipeline only talks to [`SymbolRenderer`]; [`Gs1Code128`] is the
//! renderer shipped with the crate.
//!
//! ## Structure
//!
//! - [`gs1`] - element strings as Code 128 writer input.
//!
//! Symbol encoding (code sets, checksum, bar patterns) is done by `rxing`'s
//! Code 128 writer; this module only rasterizes its modules.

pub mod gs1;

use crate::RenderError;
use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use rxing::oned::{Code128Writer, OneDimensionalCodeWriter};

const BAR: Rgb<u8> = Rgb([0, 0, 0]);
const SPACE: Rgb<u8> = Rgb([255, 255, 255]);

/// Renders `data` as a linear barcode raster.
///
/// Implementations are shared by every worker thread, so they must be
/// `Send + Sync` and must not depend on call order.
pub trait SymbolRenderer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RenderError::Encoding`] if `data` cannot be represented in
    /// the symbology.
    fn render(&self, data: &str) -> Result<RgbImage, RenderError>;
}

/// GS1-128 renderer: Code 128, code set C, leading FNC1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gs1Code128 {
    /// Width of the narrowest bar, in pixels.
    pub module_px: u32,
    /// Height of the bars, in pixels.
    pub bar_height_px: u32,
    /// Blank modules on each side of the symbol.
    pub quiet_zone_modules: u32,
}

impl Default for Gs1Code128 {
    fn default() -> Self {
        Self {
            module_px: 2,
            bar_height_px: 100,
            quiet_zone_modules: 10,
        }
    }
}

impl SymbolRenderer for Gs1Code128 {
    fn render(&self, data: &str) -> Result<RgbImage, RenderError> {
        if self.module_px == 0 || self.bar_height_px == 0 {
            return Err(RenderError::Encoding {
                data: data.to_owned(),
                reason: "module width and bar height must be positive".to_owned(),
            });
        }

        let contents = gs1::writer_contents(data)?;
        let modules = Code128Writer::default()
            .encode_oned(&contents)
            .map_err(|e| RenderError::Encoding {
                data: data.to_owned(),
                reason: e.to_string(),
            })?;

        let total_modules = modules.len() as u32 + 2 * self.quiet_zone_modules;
        let mut img = RgbImage::from_pixel(
            total_modules * self.module_px,
            self.bar_height_px,
            SPACE,
        );

        // Paint each run of adjacent bar modules as one rectangle.
        let mut start = 0;
        while start < modules.len() {
            if !modules[start] {
                start += 1;
                continue;
            }
            let end = modules[start..]
                .iter()
                .position(|&m| !m)
                .map_or(modules.len(), |len| start + len);

            let x = (self.quiet_zone_modules + start as u32) * self.module_px;
            let width = (end - start) as u32 * self.module_px;
            draw_filled_rect_mut(
                &mut img,
                Rect::at(x as i32, 0).of_size(width, self.bar_height_px),
                BAR,
            );
            start = end;
        }

        Ok(img)
    }
}
