// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output file handling.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Write `bytes` to `path` so readers never see a half-written file.
///
/// The data goes to a temporary file in the same directory first and is
/// renamed over `path` once it is fully flushed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("cannot create a temporary file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .context("failed to write output data")?;
    tmp.as_file()
        .sync_all()
        .context("failed to flush output data")?;
    tmp.persist(path)
        .with_context(|| format!("cannot move output into place at {}", path.display()))?;
    Ok(())
}
