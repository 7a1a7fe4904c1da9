// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal progress bar fed by pipeline progress events.

use std::sync::Arc;
use std::time::Duration;

use heftwerk_core::ProgressState;
use heftwerk_document::PipelineProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

/// Renders the 0-100 pipeline budget as a single bar on stderr.
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    pub fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgress {
    fn on_run_start(&self, total_images: usize) {
        self.bar.set_prefix("Building");
        self.bar.set_message(format!("{total_images} images"));
    }

    fn on_progress(&self, state: &ProgressState) {
        self.bar.set_position(state.percent.round() as u64);
        self.bar.set_message(state.step.clone());
    }

    fn on_item_warning(&self, index: usize, message: &str) {
        self.bar
            .println(format!("  ! image {}: {}", index + 1, message));
    }
}
