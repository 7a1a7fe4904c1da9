// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page layout, assembly of captured pages, and reading PDFs back.

pub mod assembler;
pub mod layout;
pub mod reader;

pub use assembler::{DocumentBuffer, DocumentBuilder, assemble};
pub use layout::PageLayout;
pub use reader::PdfReader;
