// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout — where an image goes on an A4 page.

use heftwerk_core::{A4_HEIGHT_MM, A4_WIDTH_MM, NormalizedImage, PAGE_MARGIN_MM};

pub const PRINTABLE_WIDTH_MM: f64 = A4_WIDTH_MM - 2.0 * PAGE_MARGIN_MM;
pub const PRINTABLE_HEIGHT_MM: f64 = A4_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM;

const POINTS_PER_INCH: f64 = 72.0;
const MM_PER_INCH: f64 = 25.4;

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * POINTS_PER_INCH / MM_PER_INCH
}

/// Placement of one image in millimetres, origin at the page's top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The same placement in PDF user space: points, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageLayout {
    /// Largest box of the image's aspect ratio inside the printable area,
    /// centred along the axis that has room to spare.
    ///
    /// Unknown or zero dimensions are laid out with the A4 ratio.
    pub fn fit(width_px: u32, height_px: u32) -> Self {
        let ratio = if width_px == 0 || height_px == 0 {
            A4_WIDTH_MM / A4_HEIGHT_MM
        } else {
            width_px as f64 / height_px as f64
        };
        Self::fit_ratio(ratio)
    }

    pub fn for_image(image: &NormalizedImage) -> Self {
        Self::fit(image.width, image.height)
    }

    pub fn fit_ratio(ratio: f64) -> Self {
        let ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            A4_WIDTH_MM / A4_HEIGHT_MM
        };

        if ratio > PRINTABLE_WIDTH_MM / PRINTABLE_HEIGHT_MM {
            let height = PRINTABLE_WIDTH_MM / ratio;
            Self {
                x: PAGE_MARGIN_MM,
                y: PAGE_MARGIN_MM + (PRINTABLE_HEIGHT_MM - height) / 2.0,
                width: PRINTABLE_WIDTH_MM,
                height,
            }
        } else {
            let width = PRINTABLE_HEIGHT_MM * ratio;
            Self {
                x: PAGE_MARGIN_MM + (PRINTABLE_WIDTH_MM - width) / 2.0,
                y: PAGE_MARGIN_MM,
                width,
                height: PRINTABLE_HEIGHT_MM,
            }
        }
    }

    pub fn to_points(&self) -> PdfPlacement {
        PdfPlacement {
            x: mm_to_pt(self.x),
            y: mm_to_pt(A4_HEIGHT_MM - self.y - self.height),
            width: mm_to_pt(self.width),
            height: mm_to_pt(self.height),
        }
    }
}
