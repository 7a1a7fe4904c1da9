// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect existing PDF documents (assembled output or
// uploaded files) and re-save them compactly using the `lopdf` crate.

use std::path::Path;

use heftwerk_core::error::HeftwerkError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument};

/// Reads existing PDF files.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HeftwerkError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            HeftwerkError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, HeftwerkError> {
        let document = Document::load_mem(data).map_err(|err| {
            HeftwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// `/Title` from the document info dictionary, if present.
    pub fn title(&self) -> Option<String> {
        let info = self.document.trailer.get(b"Info").ok()?;
        let info = resolve(&self.document, info).ok()?.as_dict().ok()?;
        match info.get(b"Title").ok()? {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// `/MediaBox` of a page (1-indexed) as `[x0, y0, x1, y1]` in points.
    pub fn page_media_box(&self, page_number: u32) -> Result<[f32; 4], HeftwerkError> {
        let page = self.page_dict(page_number)?;
        let media_box = page
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .map_err(|err| {
                HeftwerkError::PdfError(format!("page {} has no MediaBox: {}", page_number, err))
            })?;

        let mut corners = [0.0f32; 4];
        if media_box.len() != 4 {
            return Err(HeftwerkError::PdfError(format!(
                "page {} MediaBox has {} entries",
                page_number,
                media_box.len()
            )));
        }
        for (slot, value) in corners.iter_mut().zip(media_box) {
            *slot = match value {
                Object::Integer(n) => *n as f32,
                Object::Real(n) => *n,
                other => {
                    return Err(HeftwerkError::PdfError(format!(
                        "unexpected MediaBox entry {:?}",
                        other
                    )));
                }
            };
        }
        Ok(corners)
    }

    // -- Extraction -----------------------------------------------------------

    /// Bytes of the first image XObject on a page (1-indexed).
    ///
    /// DCT images come back exactly as embedded (for assembled documents, the
    /// page's JPEG). Flate-compressed pixel data is inflated first.
    #[instrument(skip(self), fields(page_number))]
    pub fn page_image_bytes(&self, page_number: u32) -> Result<Vec<u8>, HeftwerkError> {
        let page = self.page_dict(page_number)?;

        let resources = page
            .get(b"Resources")
            .map_err(|err| {
                HeftwerkError::PdfError(format!("page {} has no resources: {}", page_number, err))
            })
            .and_then(|obj| resolve_dict(&self.document, obj))?;
        let xobjects = resources
            .get(b"XObject")
            .map_err(|err| {
                HeftwerkError::PdfError(format!("page {} has no XObjects: {}", page_number, err))
            })
            .and_then(|obj| resolve_dict(&self.document, obj))?;

        for (_, value) in xobjects.iter() {
            if let Ok(Object::Stream(stream)) = resolve(&self.document, value) {
                let is_image = stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .map(|name| name == b"Image")
                    .unwrap_or(false);
                if !is_image {
                    continue;
                }
                let flate = stream
                    .dict
                    .get(b"Filter")
                    .and_then(Object::as_name)
                    .map(|name| name == b"FlateDecode")
                    .unwrap_or(false);
                if flate {
                    return stream.decompressed_content().map_err(|err| {
                        HeftwerkError::PdfError(format!(
                            "page {} image cannot be inflated: {}",
                            page_number, err
                        ))
                    });
                }
                return Ok(stream.content.clone());
            }
        }

        Err(HeftwerkError::PdfError(format!(
            "page {} has no image",
            page_number
        )))
    }

    // -- Output ---------------------------------------------------------------

    /// Drop unreferenced objects and re-save with compressed streams.
    ///
    /// Streams that refuse compression (JPEG images) are kept byte for byte.
    #[instrument(skip(self))]
    pub fn recompress(&self) -> Result<Vec<u8>, HeftwerkError> {
        let mut doc = self.document.clone();
        let pruned = doc.prune_objects();
        doc.compress();

        let mut output = Vec::new();
        doc.save_to(&mut output).map_err(|err| {
            HeftwerkError::PdfError(format!("failed to serialise recompressed PDF: {}", err))
        })?;

        debug!(pruned = pruned.len(), output_bytes = output.len(), "PDF recompressed");
        Ok(output)
    }

    // -- Helpers --------------------------------------------------------------

    fn page_dict(&self, page_number: u32) -> Result<&Dictionary, HeftwerkError> {
        let pages = self.document.get_pages();
        // lopdf pages are keyed by 1-indexed page number.
        let page_id: ObjectId = *pages.get(&page_number).ok_or_else(|| {
            HeftwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        self.document
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|err| {
                HeftwerkError::PdfError(format!("cannot read page {}: {}", page_number, err))
            })
    }
}

/// Follow a reference to the object it points at.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, HeftwerkError> {
    match object {
        Object::Reference(id) => doc.get_object(*id).map_err(|err| {
            HeftwerkError::PdfError(format!("cannot resolve reference {:?}: {}", id, err))
        }),
        other => Ok(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Dictionary, HeftwerkError> {
    resolve(doc, object)?
        .as_dict()
        .map_err(|err| HeftwerkError::PdfError(format!("expected a dictionary: {}", err)))
}
