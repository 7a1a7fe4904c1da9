// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Draft compression for standalone uploads.
//
// Images are shrunk to fit the draft box and re-encoded as JPEG; PDFs are
// re-saved with unused objects pruned and streams deflated. Whatever goes
// wrong, the caller gets the original file back.

use heftwerk_core::config::DraftCompression;
use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::{ColorModel, MediaType};
use tracing::{debug, info, instrument, warn};

use super::UploadFile;
use crate::image::ImageProcessor;
use crate::pdf::PdfReader;

/// Best-effort compression. Returns `file` unchanged when its type is not
/// handled, compression fails, or the result would not be smaller.
#[instrument(skip_all, fields(file = %file.name, media_type = %file.media_type, len = file.len()))]
pub fn compress(file: UploadFile, settings: &DraftCompression) -> UploadFile {
    let attempt = match file.media_type {
        MediaType::Pdf => compress_pdf(&file),
        t if t.is_image() => compress_image(&file, settings),
        _ => {
            debug!("no compressor for this type");
            return file;
        }
    };

    match attempt {
        Ok(smaller) if smaller.len() < file.len() => {
            info!(before = file.len(), after = smaller.len(), "upload compressed");
            smaller
        }
        Ok(larger) => {
            debug!(after = larger.len(), "compression did not help, keeping original");
            file
        }
        Err(err) => {
            warn!(%err, "compression failed, keeping original");
            file
        }
    }
}

fn compress_image(file: &UploadFile, settings: &DraftCompression) -> Result<UploadFile> {
    let quality = (settings.quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let data = ImageProcessor::from_bytes(&file.data)?
        .resize(settings.max_dimension, settings.max_dimension)
        .to_jpeg_bytes(quality, ColorModel::Rgb)?;
    Ok(UploadFile {
        name: with_extension(&file.name, MediaType::Jpeg.extension()),
        media_type: MediaType::Jpeg,
        data,
    })
}

fn compress_pdf(file: &UploadFile) -> Result<UploadFile> {
    let reader = PdfReader::from_bytes(&file.data)?;
    if reader.page_count() == 0 {
        return Err(HeftwerkError::UnsupportedDocument(
            "PDF has no pages".into(),
        ));
    }
    Ok(UploadFile {
        name: file.name.clone(),
        media_type: MediaType::Pdf,
        data: reader.recompress()?,
    })
}

/// Swap the extension of a file name, adding one if there is none.
fn with_extension(name: &str, ext: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.{ext}"),
        _ => format!("{name}.{ext}"),
    }
}
