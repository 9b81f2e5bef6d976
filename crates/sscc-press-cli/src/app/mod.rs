//! Wiring of the `sscc-press` binary.
//!
//! ## Structure
//!
//! - [`config`] - command line, environment, and validation into [`AppConfig`].
//! - [`source`] - [`WorkbookSource`], the spreadsheet reader.
//! - [`progress`] - [`LogProgress`], status updates as log lines.
//! - [`telemetry`] - `tracing` subscriber setup.

pub mod config;
pub mod progress;
pub mod source;
pub mod telemetry;

use anyhow::Context;
use config::AppConfig;
use sscc_press::{
    LabelComposer, LabelFont, OrderedPipeline, PageAssembler, PdfWriter, PipelineConfig, Press,
    ProgressSink, RowSource, Summary,
};
use std::sync::Arc;

pub use progress::LogProgress;
pub use source::WorkbookSource;

/// Builds the label press described by `config`.
///
/// # Errors
///
/// Fails if the configured font cannot be loaded or the worker pool cannot
/// start.
pub fn build_press(config: &AppConfig) -> anyhow::Result<Press> {
    let font = match &config.font {
        Some(path) => LabelFont::from_path(path)
            .with_context(|| format!("Failed to load font {}", path.display()))?,
        None => LabelFont::system().context("Failed to load a label font")?,
    };
    let composer = LabelComposer::new(font, config.layout);

    let pipeline = OrderedPipeline::new(
        PipelineConfig {
            num_workers: config.num_workers,
            ..PipelineConfig::default()
        },
        Arc::new(config.symbol.clone()),
        composer,
    )
    .context("Failed to start render workers")?;

    Ok(Press::new(pipeline, PageAssembler::new(config.geometry)))
}

/// Runs one batch from `source` into `config.output`.
///
/// # Errors
///
/// Fails with the first error of the batch; no output is written in that
/// case.
pub fn generate<S>(
    config: &AppConfig,
    source: &mut S,
    progress: &mut dyn ProgressSink,
) -> anyhow::Result<Summary>
where
    S: RowSource + ?Sized,
{
    let press = build_press(config)?;
    let mut writer = if config.spool_images {
        PdfWriter::spooled(std::env::temp_dir())
    } else {
        PdfWriter::new()
    };

    let summary = press
        .run(source, &mut writer, &config.output, progress)
        .with_context(|| format!("No labels written to {}", config.output.display()))?;

    if let Err(e) = press.pipeline().shutdown() {
        tracing::warn!("Render workers did not stop cleanly: {e}");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use config::CliArgs;
    use sscc_press::{Error, RawRow, Status};

    fn config(dir: &std::path::Path, extra: &[&str]) -> AppConfig {
        let input = dir.join("codes.xlsx");
        let input = input.to_str().unwrap();
        let mut argv = vec!["sscc-press", input, "--workers", "3"];
        argv.extend_from_slice(extra);
        AppConfig::try_from(CliArgs::try_parse_from(argv).unwrap()).unwrap()
    }

    fn rows(n: usize) -> Vec<RawRow> {
        (0..n)
            .map(|i| RawRow::new(i, format!("(00){:018}", 340_123_450_000_000_000_u64 + i as u64)))
            .collect()
    }

    #[test]
    fn writes_pdf_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &[]);
        let mut statuses = Vec::new();

        let summary = generate(&config, &mut rows(12), &mut statuses).unwrap();
        assert_eq!(summary.pages, 12);
        assert_eq!(summary.output, dir.path().join("codes.pdf"));
        assert!(summary.output.exists());
        assert_eq!(
            statuses.last(),
            Some(&Status::Saved {
                path: summary.output.clone()
            })
        );
    }

    #[test]
    fn spooled_run_writes_same_document() {
        let dir = tempfile::tempdir().unwrap();
        let direct_out = dir.path().join("direct.pdf");
        let spooled_out = dir.path().join("spooled.pdf");
        let direct = config(dir.path(), &["-o", direct_out.to_str().unwrap()]);
        let spooled = config(
            dir.path(),
            &["-o", spooled_out.to_str().unwrap(), "--spool-images"],
        );
        assert!(spooled.spool_images);

        generate(&direct, &mut rows(3), &mut Vec::new()).unwrap();
        generate(&spooled, &mut rows(3), &mut Vec::new()).unwrap();
        assert_eq!(
            std::fs::read(&direct_out).unwrap(),
            std::fs::read(&spooled_out).unwrap()
        );
    }

    #[test]
    fn invalid_rows_leave_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &[]);
        let mut source = vec![
            RawRow::new(0, "(00)123456789012345678"),
            RawRow::new(1, "12345"),
        ];

        let err = generate(&config, &mut source, &mut Vec::new()).unwrap_err();
        let inner = err.downcast_ref::<Error>().unwrap();
        assert_eq!(inner.to_string(), "Errors in rows: 2");
        assert!(!config.output.exists());
    }

    #[test]
    fn unreadable_font_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("broken.ttf");
        std::fs::write(&font, b"not a font").unwrap();
        let config = config(dir.path(), &["--font", font.to_str().unwrap()]);

        let err = build_press(&config).err().unwrap();
        assert!(err.to_string().contains("broken.ttf"));
    }
}
