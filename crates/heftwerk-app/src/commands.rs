// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result, bail};
use heftwerk_core::human_errors::humanize_error;
use heftwerk_core::{HeftwerkError, PipelineConfig, RawImageSource};
use heftwerk_document::guard::{self, UploadFile};
use heftwerk_document::{CapturePipeline, ProgressCallback, SizeEstimate};
use tracing::{debug, info};

use crate::cli::{BuildArgs, CheckArgs, EstimateArgs};
use crate::output::write_atomic;
use crate::progress_bar::CliProgress;

/// Attach the user-facing explanation of a library error.
fn humanized(err: HeftwerkError) -> anyhow::Error {
    let human = humanize_error(&err);
    anyhow::Error::new(err).context(format!("{} {}", human.message, human.suggestion))
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .map_err(humanized)
            .with_context(|| format!("cannot use configuration {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Read and validate every input image, reporting all problems at once.
fn collect_sources(paths: &[impl AsRef<Path>], config: &PipelineConfig) -> Result<Vec<RawImageSource>> {
    let mut sources = Vec::with_capacity(paths.len());
    let mut problems = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let upload = UploadFile::from_path(path)
            .map_err(humanized)
            .with_context(|| format!("cannot read {}", path.display()))?;

        let report = guard::validate(&upload, &config.upload);
        problems.extend(report.errors);
        if !upload.media_type.is_image() {
            problems.push(format!("{} is not an image ({})", upload.name, upload.media_type));
        }
        debug!(file = %upload.name, media_type = %upload.media_type, bytes = upload.len(), "input read");
        sources.push(RawImageSource::with_media_type(upload.data, upload.media_type));
    }

    if !problems.is_empty() {
        bail!("some inputs were rejected:\n  - {}", problems.join("\n  - "));
    }
    Ok(sources)
}

pub async fn build(args: BuildArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.no_pool {
        config.use_worker_pool = false;
    }
    if let Some(title) = args.title {
        config.document_title = title;
    }

    let sources = collect_sources(&args.images, &config)?;
    let pipeline = CapturePipeline::new(config).map_err(humanized)?;

    let guidance = pipeline.estimate(sources.len());
    info!(
        images = sources.len(),
        quality = guidance.policy.quality,
        width = guidance.policy.target_width,
        predicted_mb = guidance.megabytes,
        "building document"
    );

    let bar = (show_progress && !args.no_progress).then(CliProgress::new);
    let callback = bar.clone().map(|bar| bar as ProgressCallback);
    let result = pipeline.run(sources, callback).await;
    if let Some(bar) = &bar {
        bar.finish();
    }
    let document = result.map_err(humanized)?;

    write_atomic(&args.output, document.bytes())?;

    if !quiet {
        println!(
            "{}: {} pages, {:.2} MB, sha256 {}",
            args.output.display(),
            document.page_count(),
            document.megabytes(),
            document.sha256()
        );
    }
    Ok(())
}

pub fn estimate(args: EstimateArgs) -> Result<()> {
    let guidance = SizeEstimate::for_count(args.count);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&guidance).context("failed to serialise estimate")?
        );
        return Ok(());
    }

    println!("Images:       {}", guidance.image_count);
    println!("Quality:      {:.2}", guidance.policy.quality);
    println!(
        "Page canvas:  {} x {} px",
        guidance.policy.target_width, guidance.policy.target_height
    );
    println!("Per image:    {:.2} MB", guidance.per_image_megabytes);
    println!("Document:     {:.1} MB (estimate)", guidance.megabytes);
    Ok(())
}

pub fn check(args: CheckArgs, quiet: bool) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let upload = UploadFile::from_path(&args.file)
        .map_err(humanized)
        .with_context(|| format!("cannot read {}", args.file.display()))?;

    let report = guard::validate(&upload, &config.upload);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialise report")?
        );
    } else if !quiet {
        if report.is_valid {
            println!("{}: ok ({}, {} bytes)", upload.name, upload.media_type, upload.len());
        }
        for error in &report.errors {
            println!("{error}");
        }
    }
    if !report.is_valid {
        bail!("{} failed validation", upload.name);
    }

    if args.compress {
        let Some(output) = args.output else {
            bail!("--compress needs --output");
        };
        let before = upload.len();
        let compressed = guard::compress(upload, &config.draft);
        write_atomic(&output, &compressed.data)?;
        if !quiet && !args.json {
            println!(
                "{}: {} -> {} bytes ({})",
                output.display(),
                before,
                compressed.len(),
                compressed.media_type
            );
        }
    }
    Ok(())
}
