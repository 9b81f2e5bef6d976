//! End-to-end batch: read, validate, render, assemble, write.

use crate::{
    CancelToken, DocumentWriter, Error, OrderedPipeline, PageAssembler, ProgressSink, RawRow,
    Result, Status, validate,
};
use std::path::{Path, PathBuf};

/// Produces the raw rows of a batch.
pub trait RowSource {
    /// Reads every row, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Spreadsheet`] if the source cannot
    /// be read.
    fn read_rows(&mut self) -> Result<Vec<RawRow>>;
}

/// Rows already in memory. Reading drains them.
impl RowSource for Vec<RawRow> {
    fn read_rows(&mut self) -> Result<Vec<RawRow>> {
        Ok(std::mem::take(self))
    }
}

/// Outcome of a successful batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub pages: usize,
    pub output: PathBuf,
}

/// Output path for `input`: same directory and stem, `.pdf` extension.
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

/// Runs whole batches through a pipeline and an assembler.
pub struct Press {
    pipeline: OrderedPipeline,
    assembler: PageAssembler,
}

impl Press {
    pub const fn new(pipeline: OrderedPipeline, assembler: PageAssembler) -> Self {
        Self {
            pipeline,
            assembler,
        }
    }

    pub const fn pipeline(&self) -> &OrderedPipeline {
        &self.pipeline
    }

    pub const fn assembler(&self) -> &PageAssembler {
        &self.assembler
    }

    /// Turns every row of `source` into one page of `output`.
    ///
    /// Nothing is rendered unless every row validates, and nothing is saved
    /// unless every row rendered. A failure is reported to `progress` as
    /// [`Status::Failed`] before it is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyBatch`] if the source has no rows.
    /// - [`Error::Validation`] listing every rejected row.
    /// - Any error from the source, the pipeline or the writer.
    pub fn run<S, W>(
        &self,
        source: &mut S,
        writer: &mut W,
        output: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<Summary>
    where
        S: RowSource + ?Sized,
        W: DocumentWriter + ?Sized,
    {
        self.run_with_cancel(source, writer, output, progress, &CancelToken::new())
    }

    /// Like [`Press::run`], stopping early if `cancel` fires while rendering.
    ///
    /// # Errors
    ///
    /// See [`Press::run`]; additionally [`Error::Cancelled`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(output = %output.display())))]
    pub fn run_with_cancel<S, W>(
        &self,
        source: &mut S,
        writer: &mut W,
        output: &Path,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Summary>
    where
        S: RowSource + ?Sized,
        W: DocumentWriter + ?Sized,
    {
        let result = self.press(source, writer, output, progress, cancel);
        match &result {
            Ok(summary) => progress.report(Status::Saved {
                path: summary.output.clone(),
            }),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Batch failed: {e}");
                progress.report(Status::Failed {
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    fn press<S, W>(
        &self,
        source: &mut S,
        writer: &mut W,
        output: &Path,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Summary>
    where
        S: RowSource + ?Sized,
        W: DocumentWriter + ?Sized,
    {
        progress.report(Status::Reading);
        let rows = source.read_rows()?;
        if rows.is_empty() {
            return Err(Error::EmptyBatch);
        }

        progress.report(Status::Validating { rows: rows.len() });
        let codes = validate(&rows)?;
        drop(rows);

        let images = self.pipeline.run_with_cancel(codes, progress, cancel)?;

        let document = self.assembler.assemble(images);
        let pages = document.len();
        progress.report(Status::Assembling { pages });
        self.assembler.write(document, writer, output)?;

        #[cfg(feature = "tracing")]
        tracing::info!("Wrote {pages} labels to {}", output.display());

        Ok(Summary {
            pages,
            output: output.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Gs1Code128, LabelComposer, LabelFont, LabelLayout, PageGeometry, PageImage,
        PdfWriter, PipelineConfig, Placement, RenderError, SymbolRenderer,
    };
    use image::RgbImage;
    use portable_atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts render calls so tests can prove nothing was rendered.
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl SymbolRenderer for Counting {
        fn render(&self, data: &str) -> core::result::Result<RgbImage, RenderError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Gs1Code128::default().render(data)
        }
    }

    struct FailingSource;

    impl RowSource for FailingSource {
        fn read_rows(&mut self) -> Result<Vec<RawRow>> {
            Err(Error::Spreadsheet {
                context: "unreadable".to_string(),
            })
        }
    }

    /// Accepts pages but refuses to save.
    #[derive(Default)]
    struct RefusesSave {
        pages: usize,
    }

    impl DocumentWriter for RefusesSave {
        fn add_page(&mut self, _: &PageGeometry, _: &Placement, _: PageImage<'_>) -> Result<()> {
            self.pages += 1;
            Ok(())
        }

        fn save(&mut self, _: &Path) -> Result<()> {
            Err(Error::Document {
                context: "disk full".to_string(),
            })
        }
    }

    fn press(renderer: Arc<dyn SymbolRenderer>) -> Press {
        let pipeline = OrderedPipeline::new(
            PipelineConfig::default(),
            renderer,
            LabelComposer::new(LabelFont::embedded().unwrap(), LabelLayout::default()),
        )
        .unwrap();
        Press::new(pipeline, PageAssembler::default())
    }

    fn rows(texts: &[&str]) -> Vec<RawRow> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| RawRow::new(i, *t))
            .collect()
    }

    #[test]
    fn single_tagged_row_makes_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("single.pdf");
        let press = press(Arc::new(Gs1Code128::default()));
        let mut statuses = Vec::new();

        let summary = press
            .run(
                &mut rows(&["(00)123456789012345678"]),
                &mut PdfWriter::new(),
                &out,
                &mut statuses,
            )
            .unwrap();

        assert_eq!(summary.pages, 1);
        assert_eq!(summary.output, out);
        assert_eq!(lopdf::Document::load(&out).unwrap().get_pages().len(), 1);
        assert_eq!(
            statuses,
            vec![
                Status::Reading,
                Status::Validating { rows: 1 },
                Status::Rendering { done: 0, total: 1 },
                Status::Rendering { done: 1, total: 1 },
                Status::Assembling { pages: 1 },
                Status::Saved { path: out },
            ]
        );
    }

    #[test]
    fn invalid_rows_stop_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bad.pdf");
        let renderer = Arc::new(Counting::default());
        let press = press(renderer.clone());
        let mut statuses = Vec::new();

        let err = press
            .run(
                &mut rows(&["12345", "123456789012345678", "", "ABC123456789012345"]),
                &mut PdfWriter::new(),
                &out,
                &mut statuses,
            )
            .unwrap_err();

        let Error::Validation(validation) = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(validation.row_numbers(), vec![1, 3, 4]);
        assert_eq!(renderer.calls.load(Ordering::Relaxed), 0);
        assert!(!out.exists());
        assert_eq!(
            statuses.last(),
            Some(&Status::Failed {
                reason: "Errors in rows: 1, 3, 4".to_string()
            })
        );
    }

    #[test]
    fn twelve_rows_make_twelve_pages() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("batch.pdf");
        let press = press(Arc::new(Gs1Code128::default()));
        let mut source: Vec<RawRow> = (0..12)
            .map(|i| RawRow::new(i, format!("{:018}", 340_123_450_000_000_000_u64 + i as u64)))
            .collect();

        let summary = press
            .run(&mut source, &mut PdfWriter::new(), &out, &mut Vec::new())
            .unwrap();
        assert_eq!(summary.pages, 12);
        assert_eq!(lopdf::Document::load(&out).unwrap().get_pages().len(), 12);
        assert!(source.is_empty(), "source is drained");
    }

    #[test]
    fn empty_source_is_rejected() {
        let press = press(Arc::new(Gs1Code128::default()));
        let err = press
            .run(
                &mut Vec::new(),
                &mut PdfWriter::new(),
                Path::new("unused.pdf"),
                &mut NoProgressCheck,
            )
            .unwrap_err();
        assert!(matches!(err, Error::EmptyBatch));
    }

    #[test]
    fn source_error_is_reported() {
        let press = press(Arc::new(Gs1Code128::default()));
        let mut statuses = Vec::new();
        let err = press
            .run(
                &mut FailingSource,
                &mut PdfWriter::new(),
                Path::new("unused.pdf"),
                &mut statuses,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Spreadsheet { .. }));
        assert_eq!(
            statuses,
            vec![
                Status::Reading,
                Status::Failed {
                    reason: "Spreadsheet error: unreadable".to_string()
                },
            ]
        );
    }

    #[test]
    fn save_failure_is_surfaced() {
        let press = press(Arc::new(Gs1Code128::default()));
        let mut writer = RefusesSave::default();
        let err = press
            .run(
                &mut rows(&["123456789012345678", "(00)000000000000000001"]),
                &mut writer,
                Path::new("unused.pdf"),
                &mut Vec::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Document { .. }));
        assert_eq!(writer.pages, 2);
    }

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(
            output_path_for(Path::new("/data/in/shipments.xlsx")),
            PathBuf::from("/data/in/shipments.pdf")
        );
        assert_eq!(
            output_path_for(Path::new("codes")),
            PathBuf::from("codes.pdf")
        );
    }

    /// Fails the test if any status arrives after a failure.
    struct NoProgressCheck;

    impl ProgressSink for NoProgressCheck {
        fn report(&mut self, status: Status) {
            assert!(
                matches!(status, Status::Reading | Status::Failed { .. }),
                "unexpected status {status:?}"
            );
        }
    }
}
