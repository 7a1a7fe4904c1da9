// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload validation — size and type checks that report, never fail.

use heftwerk_core::config::UploadRules;
use serde::Serialize;
use tracing::debug;

use super::UploadFile;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Outcome of [`validate`]. `errors` holds one readable reason per problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check `file` against `rules` without touching it.
pub fn validate(file: &UploadFile, rules: &UploadRules) -> ValidationReport {
    let mut errors = Vec::new();

    if file.is_empty() {
        errors.push(format!("{} is empty", file.name));
    }

    if file.len() as u64 > rules.max_size_bytes {
        errors.push(format!(
            "{} is {:.1} MB; the limit is {:.1} MB",
            file.name,
            file.len() as f64 / BYTES_PER_MB,
            rules.max_size_bytes as f64 / BYTES_PER_MB
        ));
    }

    if !rules.allowed_types.contains(&file.media_type) {
        let allowed: Vec<&str> = rules.allowed_types.iter().map(|t| t.mime_type()).collect();
        errors.push(format!(
            "{} has type {}; allowed types are {}",
            file.name,
            file.media_type,
            allowed.join(", ")
        ));
    }

    debug!(file = %file.name, errors = errors.len(), "upload validated");
    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}
