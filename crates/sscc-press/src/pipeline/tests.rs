use super::*;
use crate::{
    Gs1Code128, LabelFont, LabelLayout, RawRow, RenderError, SymbolRenderer, validate,
};
use image::RgbImage;
use std::thread;

/// Delays each render so that later rows finish first.
struct ReverseDelay {
    inner: Gs1Code128,
    rows: u64,
}

impl SymbolRenderer for ReverseDelay {
    fn render(&self, data: &str) -> core::result::Result<RgbImage, RenderError> {
        let row: u64 = data[data.len() - 2..].parse().unwrap();
        thread::sleep(Duration::from_millis((self.rows - row) * 3));
        self.inner.render(data)
    }
}

/// Fails (or panics) on one specific row.
struct FailsOn {
    row: u64,
    panic: bool,
}

impl SymbolRenderer for FailsOn {
    fn render(&self, data: &str) -> core::result::Result<RgbImage, RenderError> {
        let row: u64 = data[data.len() - 2..].parse().unwrap();
        if row == self.row {
            if self.panic {
                panic!("renderer blew up on row {row}");
            }
            return Err(RenderError::Encoding {
                data: data.to_owned(),
                reason: "rejected for test".to_owned(),
            });
        }
        Gs1Code128::default().render(data)
    }
}

/// Cancels the batch while rendering the first row.
struct CancelsFirst {
    token: CancelToken,
}

impl SymbolRenderer for CancelsFirst {
    fn render(&self, data: &str) -> core::result::Result<RgbImage, RenderError> {
        if data.ends_with("00") {
            self.token.cancel();
        }
        Gs1Code128::default().render(data)
    }
}

fn codes(n: usize) -> Vec<CanonicalCode> {
    let rows: Vec<_> = (0..n)
        .map(|i| RawRow::new(i, format!("(00){i:018}")))
        .collect();
    validate(&rows).unwrap()
}

fn pipeline(workers: usize, renderer: Arc<dyn SymbolRenderer>) -> OrderedPipeline {
    OrderedPipeline::new(
        PipelineConfig {
            num_workers: workers,
            ..PipelineConfig::default()
        },
        renderer,
        LabelComposer::new(LabelFont::embedded().unwrap(), LabelLayout::default()),
    )
    .unwrap()
}

fn indices(images: &[LabeledImage]) -> Vec<usize> {
    images.iter().map(LabeledImage::index).collect()
}

#[test]
fn twelve_rows_on_six_workers_stay_ordered() {
    let p = pipeline(6, Arc::new(Gs1Code128::default()));
    let images = p.run(codes(12), &mut NoProgress).unwrap();
    assert_eq!(images.len(), 12);
    assert_eq!(indices(&images), (0..12).collect::<Vec<_>>());
}

#[test]
fn completion_order_does_not_affect_output_order() {
    for workers in [1, 2, 3, 6, 16] {
        let renderer = Arc::new(ReverseDelay {
            inner: Gs1Code128::default(),
            rows: 12,
        });
        let p = pipeline(workers, renderer);
        let images = p.run(codes(12), &mut NoProgress).unwrap();
        assert_eq!(
            indices(&images),
            (0..12).collect::<Vec<_>>(),
            "{workers} workers"
        );
    }
}

#[test]
fn images_match_single_task_renders() {
    let p = pipeline(4, Arc::new(Gs1Code128::default()));
    let ctx = RenderContext::new(
        Arc::new(Gs1Code128::default()),
        LabelComposer::new(LabelFont::embedded().unwrap(), LabelLayout::default()),
    );

    let input = codes(8);
    let images = p.run(input.clone(), &mut NoProgress).unwrap();
    for (code, image) in input.into_iter().zip(&images) {
        let expected = RenderTask::new(code).run(&ctx).unwrap();
        assert_eq!(image, &expected);
    }
}

#[test]
fn repeated_runs_are_byte_identical() {
    let p = pipeline(3, Arc::new(Gs1Code128::default()));
    let first = p.run(codes(9), &mut NoProgress).unwrap();
    let second = p.run(codes(9), &mut NoProgress).unwrap();
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.pixels().as_raw(), b.pixels().as_raw());
    }
}

#[test]
fn empty_batch_renders_nothing() {
    let p = pipeline(2, Arc::new(Gs1Code128::default()));
    let mut statuses = Vec::new();
    assert!(p.run(Vec::new(), &mut statuses).unwrap().is_empty());
    assert!(statuses.is_empty());
}

#[test]
fn progress_counts_up_to_total() {
    let p = pipeline(3, Arc::new(Gs1Code128::default()));
    let mut statuses = Vec::new();
    p.run(codes(7), &mut statuses).unwrap();

    assert_eq!(statuses.len(), 8);
    assert_eq!(statuses[0], Status::Rendering { done: 0, total: 7 });
    assert_eq!(statuses[7], Status::Rendering { done: 7, total: 7 });

    let done: Vec<usize> = statuses
        .iter()
        .map(|s| match s {
            Status::Rendering { done, .. } => *done,
            other => panic!("unexpected status {other:?}"),
        })
        .collect();
    assert!(done.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn first_failure_aborts_the_batch() {
    let p = pipeline(
        3,
        Arc::new(FailsOn {
            row: 5,
            panic: false,
        }),
    );
    let err = p.run(codes(12), &mut NoProgress).unwrap_err();
    assert!(matches!(err, Error::Render(RenderError::Encoding { .. })));
}

#[test]
fn panicking_task_is_reported_not_fatal() {
    let p = pipeline(
        2,
        Arc::new(FailsOn {
            row: 3,
            panic: true,
        }),
    );
    let err = p.run(codes(6), &mut NoProgress).unwrap_err();
    assert!(matches!(err, Error::Render(RenderError::Panicked { row: 4 })));

    // The worker survived the panic and the pool still serves batches.
    let p_ok = p.run(codes(3), &mut NoProgress).unwrap();
    assert_eq!(indices(&p_ok), vec![0, 1, 2]);
}

#[test]
fn pool_is_reusable_after_failure() {
    let p = pipeline(
        2,
        Arc::new(FailsOn {
            row: 10,
            panic: false,
        }),
    );
    assert!(p.run(codes(12), &mut NoProgress).is_err());
    let images = p.run(codes(10), &mut NoProgress).unwrap();
    assert_eq!(indices(&images), (0..10).collect::<Vec<_>>());
}

#[test]
fn cancelled_before_start() {
    let p = pipeline(2, Arc::new(Gs1Code128::default()));
    let token = CancelToken::new();
    token.cancel();
    let err = p
        .run_with_cancel(codes(4), &mut NoProgress, &token)
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[test]
fn cancelled_mid_batch() {
    let token = CancelToken::new();
    let p = pipeline(
        1,
        Arc::new(CancelsFirst {
            token: token.clone(),
        }),
    );
    let err = p
        .run_with_cancel(codes(5), &mut NoProgress, &token)
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[test]
fn zero_workers_is_rejected() {
    let result = OrderedPipeline::new(
        PipelineConfig {
            num_workers: 0,
            ..PipelineConfig::default()
        },
        Arc::new(Gs1Code128::default()),
        LabelComposer::new(LabelFont::embedded().unwrap(), LabelLayout::default()),
    );
    assert!(matches!(result, Err(Error::WorkerUnavailable { .. })));
}

#[test]
fn shut_down_pipeline_refuses_work() {
    let p = pipeline(4, Arc::new(Gs1Code128::default()));
    p.shutdown().unwrap();
    p.shutdown().unwrap();
    let err = p.run(codes(2), &mut NoProgress).unwrap_err();
    assert!(matches!(err, Error::WorkerUnavailable { .. }));
}
