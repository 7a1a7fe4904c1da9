// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people capturing documents on a phone.
//
// Every pipeline error is mapped to plain English with a clear suggestion so
// the progress UI can always land on a terminal error state.

use crate::error::HeftwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Resource hiccup; trying again may work.
    Transient,
    /// User must do something (pick photos, fix a setting).
    ActionRequired,
    /// Retrying will not help (damaged file, unsupported format).
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same action can help.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `HeftwerkError` into a `HumanError`.
pub fn humanize_error(err: &HeftwerkError) -> HumanError {
    match err {
        HeftwerkError::NoImages => HumanError {
            message: "There are no pages to put in the document.".into(),
            suggestion: "Take or choose at least one photo, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        HeftwerkError::WorkerPool(_) | HeftwerkError::Internal(_) => HumanError {
            message: "Something went wrong while preparing your document.".into(),
            suggestion: "Close other apps to free up memory, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        HeftwerkError::UnsupportedDocument(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Try saving it as a JPEG, PNG or PDF first. (File type: {detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        HeftwerkError::PdfError(_) => HumanError {
            message: "The PDF could not be created.".into(),
            suggestion: "Try again with fewer pages. If it keeps failing, retake the photos.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        HeftwerkError::ImageError(_) => HumanError {
            message: "There's a problem with one of the photos.".into(),
            suggestion: "The photo may be damaged or in an unusual format. Try taking it again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        HeftwerkError::InvalidConfig(detail) => HumanError {
            message: "The settings are not valid.".into(),
            suggestion: format!("Check your settings file. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        HeftwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file could not be found.".into(),
                suggestion: "Check that the file still exists and try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "We don't have permission to use that file.".into(),
                suggestion: "Allow access to the file or choose a different location.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Reading or saving a file failed.".into(),
                suggestion: "Make sure there is enough free storage, then try again.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        HeftwerkError::Serialization(_) => HumanError {
            message: "A settings file could not be read.".into(),
            suggestion: "The file may be damaged. Delete it to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
