use anyhow::bail;
use clap::Parser;
use sscc_press::{DEFAULT_WORKERS, Gs1Code128, LabelLayout, PageGeometry, output_path_for};
use std::path::PathBuf;

/// Upper bound on render workers. Labels are cheap; more threads than this
/// only add contention.
pub const MAX_WORKERS: usize = 256;

/// Command line of the `sscc-press` binary.
///
/// Every option can also be set through the environment (or a `.env` file in
/// the working directory).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sscc-press",
    version,
    about = "Turn a spreadsheet column of SSCC codes into a PDF of GS1-128 labels"
)]
pub struct CliArgs {
    /// Spreadsheet to read. Codes are taken from the first column of the
    /// first sheet, one per row, without a header.
    pub input: PathBuf,

    /// Where to write the PDF. Defaults to the input path with a `.pdf`
    /// extension.
    ///
    /// Environment variable: `SSCC_OUTPUT`
    #[arg(short, long, env = "SSCC_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Number of threads rendering labels concurrently.
    ///
    /// Environment variable: `SSCC_WORKERS`
    #[arg(short, long, env = "SSCC_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// TrueType/OpenType font for the text under each symbol. When unset,
    /// common system sans fonts are tried before the built-in DejaVu Sans.
    ///
    /// Environment variable: `SSCC_FONT`
    #[arg(long, env = "SSCC_FONT")]
    pub font: Option<PathBuf>,

    /// Hand label images to the PDF writer as temporary PNG files instead of
    /// in-memory rasters.
    ///
    /// Environment variable: `SSCC_SPOOL_IMAGES`
    #[arg(long, env = "SSCC_SPOOL_IMAGES", default_value_t = false)]
    pub spool_images: bool,

    /// Page width in millimetres.
    ///
    /// Environment variable: `SSCC_PAGE_WIDTH_MM`
    #[arg(long, env = "SSCC_PAGE_WIDTH_MM", default_value_t = 100.0)]
    pub page_width_mm: f32,

    /// Page height in millimetres.
    ///
    /// Environment variable: `SSCC_PAGE_HEIGHT_MM`
    #[arg(long, env = "SSCC_PAGE_HEIGHT_MM", default_value_t = 60.0)]
    pub page_height_mm: f32,

    /// Width of the label on the page, in millimetres. The label is centered
    /// horizontally.
    ///
    /// Environment variable: `SSCC_IMAGE_WIDTH_MM`
    #[arg(long, env = "SSCC_IMAGE_WIDTH_MM", default_value_t = 80.0)]
    pub image_width_mm: f32,

    /// Height of the label on the page, in millimetres. `0` keeps the
    /// label's aspect ratio.
    ///
    /// Environment variable: `SSCC_IMAGE_HEIGHT_MM`
    #[arg(long, env = "SSCC_IMAGE_HEIGHT_MM", default_value_t = 40.0)]
    pub image_height_mm: f32,

    /// Distance from the top of the page to the top of the label, in
    /// millimetres.
    ///
    /// Environment variable: `SSCC_IMAGE_TOP_MM`
    #[arg(long, env = "SSCC_IMAGE_TOP_MM", default_value_t = 10.0)]
    pub image_top_mm: f32,

    /// Width of the narrowest bar, in pixels.
    ///
    /// Environment variable: `SSCC_MODULE_PX`
    #[arg(long, env = "SSCC_MODULE_PX", default_value_t = 2)]
    pub module_px: u32,

    /// Height of the bars, in pixels.
    ///
    /// Environment variable: `SSCC_BAR_HEIGHT_PX`
    #[arg(long, env = "SSCC_BAR_HEIGHT_PX", default_value_t = 100)]
    pub bar_height_px: u32,

    /// Size of the text under the symbol, in pixels.
    ///
    /// Environment variable: `SSCC_FONT_PX`
    #[arg(long, env = "SSCC_FONT_PX", default_value_t = 14.0)]
    pub font_px: f32,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub num_workers: usize,
    pub font: Option<PathBuf>,
    pub spool_images: bool,
    pub geometry: PageGeometry,
    pub symbol: Gs1Code128,
    pub layout: LabelLayout,
}

fn positive(name: &str, value: f32) -> anyhow::Result<f32> {
    if !value.is_finite() || value <= 0.0 {
        bail!("{name} must be a positive number (got {value})");
    }
    Ok(value)
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.workers == 0 {
            bail!("SSCC_WORKERS must be greater than 0");
        }
        if args.workers > MAX_WORKERS {
            bail!(
                "SSCC_WORKERS ({}) exceeds the maximum of {}",
                args.workers,
                MAX_WORKERS
            );
        }

        let page_width_mm = positive("SSCC_PAGE_WIDTH_MM", args.page_width_mm)?;
        let page_height_mm = positive("SSCC_PAGE_HEIGHT_MM", args.page_height_mm)?;
        let image_width_mm = positive("SSCC_IMAGE_WIDTH_MM", args.image_width_mm)?;
        let font_px = positive("SSCC_FONT_PX", args.font_px)?;

        if !args.image_top_mm.is_finite() || args.image_top_mm < 0.0 {
            bail!(
                "SSCC_IMAGE_TOP_MM must not be negative (got {})",
                args.image_top_mm
            );
        }
        let image_height_mm = if args.image_height_mm == 0.0 {
            None
        } else {
            Some(positive("SSCC_IMAGE_HEIGHT_MM", args.image_height_mm)?)
        };

        if image_width_mm > page_width_mm {
            bail!("Label width ({image_width_mm} mm) exceeds page width ({page_width_mm} mm)");
        }
        match image_height_mm {
            Some(height) if args.image_top_mm + height > page_height_mm => bail!(
                "Label ({height} mm at {} mm from the top) runs off the page ({page_height_mm} mm)",
                args.image_top_mm
            ),
            None if args.image_top_mm >= page_height_mm => bail!(
                "SSCC_IMAGE_TOP_MM ({} mm) leaves no room on the page ({page_height_mm} mm)",
                args.image_top_mm
            ),
            _ => {}
        }

        if args.module_px == 0 {
            bail!("SSCC_MODULE_PX must be greater than 0");
        }
        if args.bar_height_px == 0 {
            bail!("SSCC_BAR_HEIGHT_PX must be greater than 0");
        }

        let output = args
            .output
            .unwrap_or_else(|| output_path_for(&args.input));

        Ok(Self {
            input: args.input,
            output,
            num_workers: args.workers,
            font: args.font,
            spool_images: args.spool_images,
            geometry: PageGeometry {
                width_mm: page_width_mm,
                height_mm: page_height_mm,
                image_width_mm,
                image_height_mm,
                image_top_mm: args.image_top_mm,
            },
            symbol: Gs1Code128 {
                module_px: args.module_px,
                bar_height_px: args.bar_height_px,
                ..Gs1Code128::default()
            },
            layout: LabelLayout {
                font_px,
                ..LabelLayout::default()
            },
        })
    }
}
