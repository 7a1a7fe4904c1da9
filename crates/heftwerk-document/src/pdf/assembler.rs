// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page assembler — place normalized images one per A4 page and seal the
// result into a single PDF buffer using `lopdf`.
//
// Normalized JPEGs are embedded verbatim as DCTDecode image XObjects, so the
// page carries exactly the bytes the normalizer produced. Degraded non-JPEG
// originals are decoded to raw samples, or framed blank if that fails too.

use chrono::{DateTime, Utc};
use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::{A4_HEIGHT_MM, A4_WIDTH_MM, ColorModel, MediaType, NormalizedImage};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use super::layout::{PageLayout, mm_to_pt};
use crate::progress::ProgressReporter;

const PRODUCER: &str = "Heftwerk";

/// A sealed PDF and what is known about it.
#[derive(Clone)]
pub struct DocumentBuffer {
    bytes: Vec<u8>,
    page_count: usize,
    sha256: String,
    created_at: DateTime<Utc>,
}

impl DocumentBuffer {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Hex SHA-256 of the PDF bytes.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn megabytes(&self) -> f64 {
        self.bytes.len() as f64 / 1_048_576.0
    }
}

impl std::fmt::Debug for DocumentBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBuffer")
            .field("len", &self.bytes.len())
            .field("page_count", &self.page_count)
            .field("sha256", &self.sha256)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Incrementally builds a PDF, one page per image.
pub struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    title: String,
    created_at: DateTime<Utc>,
}

impl DocumentBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        let mut doc = Document::with_version("1.5");
        // Reserved now so every page can point at its parent.
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page showing `image`, consuming it.
    ///
    /// Degraded images are placed like any other. A degraded original that is
    /// neither JPEG nor decodable gets a framed blank page in its slot.
    #[instrument(skip_all, fields(index = image.index, degraded = image.is_degraded()))]
    pub fn add_page(&mut self, image: NormalizedImage) -> Result<PageLayout> {
        let layout = PageLayout::for_image(&image);
        let placement = layout.to_points();

        let (content, resources) = match image_xobject(image) {
            Some(stream) => {
                let image_id = self.doc.add_object(Object::Stream(stream));
                let content = format!(
                    "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im0 Do\nQ\n",
                    placement.width, placement.height, placement.x, placement.y
                );
                let resources = dictionary! {
                    "XObject" => dictionary! {
                        "Im0" => Object::Reference(image_id),
                    },
                };
                (content, resources)
            }
            None => {
                let content = format!(
                    "q\n0.92 g 0.5 G 1 w\n{:.4} {:.4} {:.4} {:.4} re\nB\nQ\n",
                    placement.x, placement.y, placement.width, placement.height
                );
                (content, dictionary! {})
            }
        };
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content.into_bytes())));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(mm_to_pt(A4_WIDTH_MM) as f32),
                Object::Real(mm_to_pt(A4_HEIGHT_MM) as f32),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        });
        self.kids.push(Object::Reference(page_id));

        debug!(
            page = self.kids.len(),
            x_mm = layout.x,
            y_mm = layout.y,
            width_mm = layout.width,
            height_mm = layout.height,
            "page placed"
        );
        Ok(layout)
    }

    /// Write the page tree, catalog and info dictionary and serialise.
    #[instrument(skip(self), fields(pages = self.kids.len()))]
    pub fn finish(mut self) -> Result<DocumentBuffer> {
        let page_count = self.kids.len();
        if page_count == 0 {
            return Err(HeftwerkError::NoImages);
        }

        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => Object::Name(b"Pages".to_vec()),
                "Kids" => self.kids,
                "Count" => Object::Integer(page_count as i64),
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => Object::Name(b"Catalog".to_vec()),
            "Pages" => Object::Reference(self.pages_id),
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(self.title.as_str()),
            "Producer" => Object::string_literal(PRODUCER),
            "CreationDate" => Object::string_literal(pdf_date(self.created_at)),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.trailer.set("Info", Object::Reference(info_id));

        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes).map_err(|err| {
            HeftwerkError::PdfError(format!("failed to serialise document: {}", err))
        })?;

        let sha256 = hex::encode(Sha256::digest(&bytes));
        info!(pages = page_count, bytes = bytes.len(), %sha256, "document sealed");

        Ok(DocumentBuffer {
            bytes,
            page_count,
            sha256,
            created_at: self.created_at,
        })
    }
}

/// Image XObject for one page, or `None` when the bytes cannot be shown.
///
/// JPEG bytes are embedded verbatim under DCTDecode. Anything else only gets
/// here as a degraded original; it is decoded to raw RGB samples, which the
/// final `compress` pass deflates.
fn image_xobject(image: NormalizedImage) -> Option<Stream> {
    if image.media_type == MediaType::Jpeg {
        let color_space: &[u8] = match image.color_model {
            ColorModel::Rgb => b"DeviceRGB",
            ColorModel::Gray => b"DeviceGray",
        };
        let mut stream = Stream::new(
            dictionary! {
                "Type" => Object::Name(b"XObject".to_vec()),
                "Subtype" => Object::Name(b"Image".to_vec()),
                "Width" => Object::Integer(image.width.max(1) as i64),
                "Height" => Object::Integer(image.height.max(1) as i64),
                "ColorSpace" => Object::Name(color_space.to_vec()),
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => Object::Name(b"DCTDecode".to_vec()),
            },
            image.bytes,
        );
        // Already JPEG; deflating it again only costs time.
        stream.allows_compression = false;
        return Some(stream);
    }

    match image::load_from_memory(&image.bytes) {
        Ok(decoded) => {
            let rgb = decoded.to_rgb8();
            let (width, height) = rgb.dimensions();
            Some(Stream::new(
                dictionary! {
                    "Type" => Object::Name(b"XObject".to_vec()),
                    "Subtype" => Object::Name(b"Image".to_vec()),
                    "Width" => Object::Integer(width as i64),
                    "Height" => Object::Integer(height as i64),
                    "ColorSpace" => Object::Name(b"DeviceRGB".to_vec()),
                    "BitsPerComponent" => Object::Integer(8),
                },
                rgb.into_raw(),
            ))
        }
        Err(err) => {
            warn!(
                index = image.index,
                media_type = %image.media_type,
                %err,
                "original cannot be embedded, leaving a blank frame"
            );
            None
        }
    }
}

/// PDF date string, e.g. `D:20260314093000Z`.
fn pdf_date(at: DateTime<Utc>) -> String {
    at.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Place every image on its own page, in index order, and seal the document.
///
/// Reports `50 + placed / total * 25` after each page and 90 before sealing.
/// Yields to the runtime between pages.
#[instrument(skip_all, fields(images = images.len()))]
pub async fn assemble(
    mut images: Vec<NormalizedImage>,
    title: &str,
    progress: &ProgressReporter,
) -> Result<DocumentBuffer> {
    if images.is_empty() {
        return Err(HeftwerkError::NoImages);
    }

    images.sort_by_key(|image| image.index);
    let total = images.len();
    let mut builder = DocumentBuilder::new(title);

    for (done, image) in images.into_iter().enumerate() {
        builder.add_page(image)?;
        let placed = done + 1;
        progress.report(
            50.0 + placed as f64 / total as f64 * 25.0,
            format!("Placed page {placed} of {total}"),
        );
        tokio::task::yield_now().await;
    }

    progress.report(90.0, "Finalizing document");
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Normalize;
    use crate::pdf::PdfReader;
    use crate::progress::ProgressCallback;
    use crate::progress::tests::RecordingCallback;
    use crate::testing::StubNormalizer;
    use heftwerk_core::config::ResizeFilter;
    use heftwerk_core::{Degradation, ProcessingPolicy, RawImageSource};
    use std::sync::Arc;

    fn stub(index: usize) -> NormalizedImage {
        StubNormalizer.normalize(
            &RawImageSource::new(Vec::new()),
            &ProcessingPolicy::new(0.8, 8),
            index,
        )
    }

    #[tokio::test]
    async fn pages_follow_index_not_arrival() {
        let images = vec![stub(2), stub(0), stub(1)];
        let expected: Vec<Vec<u8>> = (0..3).map(|i| stub(i).bytes).collect();

        let doc = assemble(images, "Order", &ProgressReporter::silent())
            .await
            .unwrap();
        assert_eq!(doc.page_count(), 3);

        let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
        assert_eq!(reader.page_count(), 3);
        for (i, bytes) in expected.iter().enumerate() {
            assert_eq!(&reader.page_image_bytes(i as u32 + 1).unwrap(), bytes);
        }
    }

    #[tokio::test]
    async fn reports_page_progress_then_finalize() {
        let recorder = Arc::new(RecordingCallback::default());
        let reporter = ProgressReporter::new(Some(recorder.clone() as ProgressCallback));
        reporter.report(50.0, "Processed batch 1 of 1");

        assemble(vec![stub(0), stub(1)], "P", &reporter).await.unwrap();

        assert_eq!(recorder.percents(), vec![50.0, 62.5, 75.0, 90.0]);
        let steps: Vec<String> = recorder
            .states
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.step.clone())
            .collect();
        assert_eq!(steps[1], "Placed page 1 of 2");
        assert_eq!(steps[3], "Finalizing document");
    }

    #[tokio::test]
    async fn degraded_page_is_still_placed() {
        let original = b"\xFF\xD8\xFFbroken".to_vec();
        let degraded = NormalizedImage {
            index: 1,
            byte_size: original.len(),
            bytes: original.clone(),
            width: 0,
            height: 0,
            media_type: MediaType::Jpeg,
            color_model: ColorModel::Rgb,
            degradation: Some(Degradation::DecodeFailed {
                reason: "truncated".into(),
            }),
        };

        let doc = assemble(vec![stub(0), degraded, stub(2)], "D", &ProgressReporter::silent())
            .await
            .unwrap();

        let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
        assert_eq!(reader.page_count(), 3);
        assert_eq!(reader.page_image_bytes(2).unwrap(), original);
    }

    #[tokio::test]
    async fn truncated_png_gets_a_blank_frame_not_a_bogus_jpeg() {
        let png = crate::testing::tiny_png(64, 64);
        let truncated = RawImageSource::new(png[..48].to_vec());
        assert_eq!(truncated.media_type(), MediaType::Png);
        let degraded = crate::image::Normalizer::new(ResizeFilter::Nearest).normalize(
            &truncated,
            &ProcessingPolicy::new(0.8, 16),
            1,
        );
        assert!(matches!(degraded.degradation, Some(Degradation::DecodeFailed { .. })));
        assert_eq!(degraded.media_type, MediaType::Png);

        let doc = assemble(vec![stub(0), degraded, stub(2)], "T", &ProgressReporter::silent())
            .await
            .unwrap();
        assert_eq!(doc.page_count(), 3);

        let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
        assert_eq!(reader.page_count(), 3);
        assert!(reader.page_image_bytes(2).is_err());
        assert_eq!(reader.page_image_bytes(3).unwrap(), stub(2).bytes);

        // Every DCT stream in the file really is a JPEG.
        let parsed = Document::load_mem(doc.bytes()).unwrap();
        for object in parsed.objects.values() {
            if let Object::Stream(stream) = object {
                let dct = stream
                    .dict
                    .get(b"Filter")
                    .and_then(Object::as_name)
                    .map(|name| name == b"DCTDecode")
                    .unwrap_or(false);
                if dct {
                    assert!(stream.content.starts_with(b"\xFF\xD8"));
                }
            }
        }
    }

    #[tokio::test]
    async fn readable_png_original_is_embedded_as_pixels() {
        let png = crate::testing::tiny_png(6, 4);
        let expected = image::load_from_memory(&png).unwrap().to_rgb8().into_raw();
        let degraded = NormalizedImage {
            index: 0,
            byte_size: png.len(),
            bytes: png,
            width: 6,
            height: 4,
            media_type: MediaType::Png,
            color_model: ColorModel::Rgb,
            degradation: Some(Degradation::EncodeFailed {
                reason: "encoder unavailable".into(),
            }),
        };

        let doc = assemble(vec![degraded], "P", &ProgressReporter::silent())
            .await
            .unwrap();
        let reader = PdfReader::from_bytes(doc.bytes()).unwrap();
        let pixels = reader.page_image_bytes(1).unwrap();
        assert_eq!(pixels.len(), 6 * 4 * 3);
        assert_eq!(pixels, expected);
    }

    #[tokio::test]
    async fn empty_input_is_an_error() {
        let err = assemble(Vec::new(), "E", &ProgressReporter::silent())
            .await
            .unwrap_err();
        assert!(matches!(err, HeftwerkError::NoImages));
    }

    #[test]
    fn buffer_metadata() {
        let mut builder = DocumentBuilder::new("Meta");
        let layout = builder.add_page(stub(0)).unwrap();
        assert_eq!(layout, PageLayout::fit(8, 8));
        assert_eq!(builder.page_count(), 1);

        let doc = builder.finish().unwrap();
        assert!(doc.bytes().starts_with(b"%PDF-1.5"));
        assert_eq!(doc.sha256().len(), 64);
        assert_eq!(doc.sha256(), hex::encode(Sha256::digest(doc.bytes())));
        assert!(doc.megabytes() > 0.0);
    }

    #[test]
    fn pdf_date_format() {
        let at = DateTime::parse_from_rfc3339("2026-03-14T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(pdf_date(at), "D:20260314093000Z");
    }
}
