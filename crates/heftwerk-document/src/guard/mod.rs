// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload guard — size/type validation and best-effort compression of single
// files that are uploaded on their own rather than assembled into a PDF.

pub mod compress;
pub mod validate;

use std::path::Path;

use heftwerk_core::MediaType;
use heftwerk_core::error::Result;

pub use compress::compress;
pub use validate::{ValidationReport, validate};

/// One file as handed over by the upload collaborator.
#[derive(Clone)]
pub struct UploadFile {
    pub name: String,
    /// Declared type: from the extension when known, else sniffed.
    pub media_type: MediaType,
    pub data: Vec<u8>,
}

impl UploadFile {
    /// Wrap in-memory bytes, sniffing the type from the content.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let media_type = MediaType::sniff(&data);
        Self {
            name: name.into(),
            media_type,
            data,
        }
    }

    /// Read a file from disk. The extension decides the declared type.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let media_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(MediaType::from_extension)
            .unwrap_or_else(|| MediaType::sniff(&data));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            media_type,
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}
