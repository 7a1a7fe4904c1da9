// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end tests for CapturePipeline through its public API.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use heftwerk_core::{
    ColorModel, MediaType, NormalizedImage, PipelineConfig, ProcessingPolicy,
    ProgressState, RawImageSource,
};
use heftwerk_core::config::ResizeFilter;
use heftwerk_document::pipeline::PooledExecutor;
use heftwerk_document::{
    CapturePipeline, Executor, Normalize, Normalizer, PdfReader, PipelineProgressCallback,
    ProgressCallback,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn encode(width: u32, height: u32, seed: u8, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([seed, 255 - seed, 60]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// Emits a distinct 8x8 JPEG per index, optionally stalling early items so
/// later ones finish first.
struct Stub {
    stagger: bool,
}

impl Stub {
    fn bytes_for(index: usize) -> Vec<u8> {
        encode(8, 8, (index * 41 % 256) as u8, ImageFormat::Jpeg)
    }
}

impl Normalize for Stub {
    fn normalize(&self, _: &RawImageSource, _: &ProcessingPolicy, index: usize) -> NormalizedImage {
        if self.stagger {
            std::thread::sleep(Duration::from_millis(30u64.saturating_sub(index as u64 % 3 * 15)));
        }
        let bytes = Self::bytes_for(index);
        NormalizedImage {
            index,
            byte_size: bytes.len(),
            bytes,
            width: 8,
            height: 8,
            media_type: MediaType::Jpeg,
            color_model: ColorModel::Rgb,
            degradation: None,
        }
    }
}

/// Panics on one index, behaves like `Stub` otherwise.
struct CrashAt(usize);

impl Normalize for CrashAt {
    fn normalize(&self, s: &RawImageSource, p: &ProcessingPolicy, index: usize) -> NormalizedImage {
        if index == self.0 {
            panic!("simulated worker crash");
        }
        Stub { stagger: false }.normalize(s, p, index)
    }
}

#[derive(Default)]
struct Recorder {
    states: Mutex<Vec<ProgressState>>,
    warnings: Mutex<Vec<(usize, String)>>,
    started: Mutex<Option<usize>>,
}

impl Recorder {
    fn percents(&self) -> Vec<f64> {
        self.states.lock().unwrap().iter().map(|s| s.percent).collect()
    }
}

impl PipelineProgressCallback for Recorder {
    fn on_progress(&self, state: &ProgressState) {
        self.states.lock().unwrap().push(state.clone());
    }

    fn on_run_start(&self, total_images: usize) {
        *self.started.lock().unwrap() = Some(total_images);
    }

    fn on_item_warning(&self, index: usize, message: &str) {
        self.warnings.lock().unwrap().push((index, message.to_string()));
    }
}

fn config(batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        batch_size,
        batch_pause_ms: 0,
        ..PipelineConfig::default()
    }
}

fn pooled(normalizer: Arc<dyn Normalize>) -> Executor {
    Executor::Pooled(PooledExecutor::new(3, Duration::from_secs(10), normalizer).unwrap())
}

fn placeholder_sources(n: usize) -> Vec<RawImageSource> {
    (0..n).map(|i| RawImageSource::new(vec![i as u8])).collect()
}

fn assert_monotonic_to_100(percents: &[f64]) {
    assert!(!percents.is_empty());
    for pair in percents.windows(2) {
        assert!(pair[0] <= pair[1], "progress went backwards: {percents:?}");
    }
    assert_eq!(*percents.last().unwrap(), 100.0);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_page_per_image() {
    let pipeline = CapturePipeline::with_executor(config(3), pooled(Arc::new(Stub { stagger: false })));
    for n in [1, 2, 3, 4, 7, 50] {
        let doc = pipeline.run(placeholder_sources(n), None).await.unwrap();
        assert_eq!(doc.page_count(), n);
        assert_eq!(PdfReader::from_bytes(doc.bytes()).unwrap().page_count(), n);
    }
}

#[tokio::test]
async fn pages_keep_capture_order_whatever_finishes_first() {
    let pipeline = CapturePipeline::with_executor(config(3), pooled(Arc::new(Stub { stagger: true })));
    let doc = pipeline.run(placeholder_sources(9), None).await.unwrap();

    let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
    for index in 0..9 {
        assert_eq!(
            reader.page_image_bytes(index as u32 + 1).unwrap(),
            Stub::bytes_for(index),
            "page {}",
            index + 1
        );
    }
}

#[tokio::test]
async fn undecodable_photo_still_gets_its_page() {
    let garbage = b"\xFF\xD8\xFF\xE0 this is not a photo".to_vec();
    let sources = vec![
        RawImageSource::new(encode(40, 30, 10, ImageFormat::Png)),
        RawImageSource::new(encode(30, 40, 90, ImageFormat::Jpeg)),
        RawImageSource::new(garbage.clone()),
        RawImageSource::new(encode(50, 50, 200, ImageFormat::Png)),
    ];
    let executor = Executor::inline(Arc::new(Normalizer::new(ResizeFilter::Triangle)));
    let pipeline = CapturePipeline::with_executor(config(3), executor);
    let recorder = Arc::new(Recorder::default());

    let doc = pipeline
        .run_with_policy(
            sources,
            ProcessingPolicy::new(0.8, 32),
            Some(recorder.clone() as ProgressCallback),
        )
        .await
        .unwrap();

    assert_eq!(doc.page_count(), 4);
    let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
    assert_eq!(reader.page_image_bytes(3).unwrap(), garbage);
    let first = reader.page_image_bytes(1).unwrap();
    assert_eq!(image::load_from_memory(&first).unwrap().width(), 32);

    let warnings = recorder.warnings.lock().unwrap().clone();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, 2);
    assert!(warnings[0].1.contains("decode"), "{}", warnings[0].1);
    assert_monotonic_to_100(&recorder.percents());
}

#[tokio::test]
async fn truncated_png_keeps_its_page_as_a_blank_frame() {
    let png = encode(64, 64, 120, ImageFormat::Png);
    let sources = vec![
        RawImageSource::new(encode(30, 40, 90, ImageFormat::Jpeg)),
        RawImageSource::new(png[..png.len() / 2].to_vec()),
    ];
    let executor = Executor::inline(Arc::new(Normalizer::new(ResizeFilter::Nearest)));
    let pipeline = CapturePipeline::with_executor(config(3), executor);
    let recorder = Arc::new(Recorder::default());

    let doc = pipeline
        .run_with_policy(
            sources,
            ProcessingPolicy::new(0.8, 32),
            Some(recorder.clone() as ProgressCallback),
        )
        .await
        .unwrap();

    assert_eq!(doc.page_count(), 2);
    let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
    assert_eq!(reader.page_count(), 2);
    assert!(reader.page_image_bytes(1).unwrap().starts_with(b"\xFF\xD8"));
    assert!(reader.page_image_bytes(2).is_err());

    let warnings = recorder.warnings.lock().unwrap().clone();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, 1);
    assert_monotonic_to_100(&recorder.percents());
}

#[tokio::test]
async fn crashed_worker_costs_no_page() {
    let executor = Executor::Pooled(
        PooledExecutor::new(2, Duration::from_secs(10), Arc::new(Stub { stagger: false }))
            .unwrap()
            .with_worker(Arc::new(CrashAt(4))),
    );
    let pipeline = CapturePipeline::with_executor(config(3), executor);
    let recorder = Arc::new(Recorder::default());

    let doc = pipeline
        .run(placeholder_sources(6), Some(recorder.clone() as ProgressCallback))
        .await
        .unwrap();

    let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
    assert_eq!(reader.page_count(), 6);
    assert_eq!(reader.page_image_bytes(5).unwrap(), Stub::bytes_for(4));
    let warned: Vec<usize> = recorder.warnings.lock().unwrap().iter().map(|w| w.0).collect();
    assert_eq!(warned, vec![4]);
}

#[tokio::test]
async fn progress_is_monotonic_and_reaches_100() {
    let pipeline = CapturePipeline::with_executor(config(3), pooled(Arc::new(Stub { stagger: true })));
    let recorder = Arc::new(Recorder::default());

    pipeline
        .run(placeholder_sources(10), Some(recorder.clone() as ProgressCallback))
        .await
        .unwrap();

    let percents = recorder.percents();
    assert_monotonic_to_100(&percents);
    // 4 batches, 10 pages, finalize, complete.
    assert_eq!(percents.len(), 4 + 10 + 2);
    assert_eq!(percents[3], 50.0);
    assert_eq!(percents[13], 75.0);
    assert_eq!(percents[14], 90.0);
    assert_eq!(*recorder.started.lock().unwrap(), Some(10));
}

#[tokio::test]
async fn three_images_without_a_pool() {
    let config = PipelineConfig {
        use_worker_pool: false,
        ..config(3)
    };
    let pipeline = CapturePipeline::with_executor(config, Executor::inline(Arc::new(Stub { stagger: false })));
    assert!(!pipeline.executor().is_pooled());
    let recorder = Arc::new(Recorder::default());

    pipeline
        .run(placeholder_sources(3), Some(recorder.clone() as ProgressCallback))
        .await
        .unwrap();

    let expected = [50.0, 58.333, 66.667, 75.0, 90.0, 100.0];
    let percents = recorder.percents();
    assert_eq!(percents.len(), expected.len());
    for (got, want) in percents.iter().zip(expected) {
        assert!((got - want).abs() < 0.001, "{percents:?}");
    }
}

#[tokio::test]
async fn no_images_is_an_error() {
    let pipeline = CapturePipeline::with_executor(config(3), pooled(Arc::new(Stub { stagger: false })));
    let recorder = Arc::new(Recorder::default());
    let result = pipeline
        .run(Vec::new(), Some(recorder.clone() as ProgressCallback))
        .await;
    assert!(result.is_err());
    assert!(!recorder.percents().contains(&100.0));
}

#[tokio::test]
async fn overlapping_runs_share_one_pool() {
    let executor = pooled(Arc::new(Stub { stagger: true }));
    let first = CapturePipeline::with_executor(config(2), executor.clone());
    let second = CapturePipeline::with_executor(config(4), executor);
    let (rec_a, rec_b) = (Arc::new(Recorder::default()), Arc::new(Recorder::default()));

    let (a, b) = tokio::join!(
        first.run(placeholder_sources(5), Some(rec_a.clone() as ProgressCallback)),
        second.run(placeholder_sources(8), Some(rec_b.clone() as ProgressCallback)),
    );

    assert_eq!(a.unwrap().page_count(), 5);
    assert_eq!(b.unwrap().page_count(), 8);
    assert_monotonic_to_100(&rec_a.percents());
    assert_monotonic_to_100(&rec_b.percents());
}

#[tokio::test]
async fn progress_as_a_stream() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressState>();
    let pipeline = CapturePipeline::with_executor(config(3), Executor::inline(Arc::new(Stub { stagger: false })));

    pipeline
        .run(placeholder_sources(2), Some(Arc::new(tx) as ProgressCallback))
        .await
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(state) = rx.try_recv() {
        seen.push(state.percent);
    }
    assert_monotonic_to_100(&seen);
}

#[test]
fn default_pipeline_builds_real_pages() {
    let pipeline = CapturePipeline::new(PipelineConfig {
        worker_threads: Some(2),
        resize_filter: ResizeFilter::Nearest,
        ..PipelineConfig::default()
    })
    .unwrap();
    assert!(pipeline.executor().is_pooled());

    let sources = vec![
        RawImageSource::new(encode(64, 48, 1, ImageFormat::Png)),
        RawImageSource::new(encode(48, 64, 2, ImageFormat::Jpeg)),
    ];
    let doc = pipeline.run_blocking(sources, None).unwrap();

    let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
    assert_eq!(reader.page_count(), 2);
    let page = image::load_from_memory(&reader.page_image_bytes(2).unwrap()).unwrap();
    let policy = pipeline.estimate(2).policy;
    assert_eq!((page.width(), page.height()), (policy.target_width, policy.target_height));
}
