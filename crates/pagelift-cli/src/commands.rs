// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand execution.

use std::path::Path;

use image::DynamicImage;
use pagelift_core::error::Result;
use pagelift_core::{Corner, EngineConfig, EnhancementOptions, ImageFormat};
use pagelift_document::image::encoded::bytes_from_input;
use pagelift_document::{EncodedImage, ImageEngine};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{Cli, Command};

/// JSON printed by `borders`.
#[derive(Debug, Serialize)]
struct BordersReport {
    width: u32,
    height: u32,
    corners: [Corner; 4],
    content_found: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Enhance { input, flags, out } => {
            let engine = ImageEngine::new(config)?;
            let enhanced = engine.enhance_async(read_input(&input).await?, flags.into()).await?;
            emit(&enhanced, out.output.as_deref()).await
        }
        Command::Borders { input } => {
            let engine = ImageEngine::new(config)?;
            let detection = engine.detect_borders_async(read_input(&input).await?).await?;
            let report = BordersReport {
                width: detection.image.width(),
                height: detection.image.height(),
                corners: detection.corners,
                content_found: detection.content_found,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Crop {
            input,
            corners,
            out,
        } => {
            let engine = ImageEngine::new(config)?;
            let raster = engine.decode_async(read_input(&input).await?).await?;
            let cropped = engine.crop_async(raster, corners).await?;
            emit(&cropped, out.output.as_deref()).await
        }
        Command::AutoCrop { input, out } => {
            let engine = ImageEngine::new(config)?;
            let cropped = engine.auto_crop_async(read_input(&input).await?).await?;
            emit(&cropped, out.output.as_deref()).await
        }
        Command::Filter {
            input,
            brightness,
            contrast,
            black_and_white,
            out,
        } => {
            let engine = ImageEngine::new(config)?;
            let options = Command::filter_options(brightness, contrast, black_and_white);
            let filtered = engine
                .apply_filters_async(read_input(&input).await?, options)
                .await?;
            emit(&filtered, out.output.as_deref()).await
        }
        Command::Thumbnail {
            input,
            max_width,
            out,
        } => {
            let engine = ImageEngine::new(config)?;
            let thumb = engine
                .thumbnail_async(read_input(&input).await?, max_width)
                .await?;
            emit(&thumb, out.output.as_deref()).await
        }
        Command::OcrPrep { input, out } => {
            let engine = ImageEngine::new(config)?;
            let prepared = engine.prepare_for_ocr_async(read_input(&input).await?).await?;
            emit(&prepared, out.output.as_deref()).await
        }
        Command::Pdf {
            inputs,
            output,
            max_width,
            title,
            paper,
        } => {
            let config = EngineConfig {
                paper_size: paper.unwrap_or(config.paper_size),
                ..config
            };
            let engine = ImageEngine::new(config)?;
            let mut pages = Vec::with_capacity(inputs.len());
            for input in &inputs {
                pages.push(
                    engine
                        .prepare_for_pdf_async(read_input(input).await?, max_width)
                        .await?,
                );
            }
            let pdf = engine.assemble_pdf(&pages, title.as_deref())?;
            tokio::fs::write(&output, &pdf).await?;
            info!(pages = pages.len(), bytes = pdf.len(), path = %output.display(), "PDF written");
            Ok(())
        }
        Command::Scan {
            inputs,
            flags,
            output,
            title,
        } => {
            let engine = ImageEngine::new(config)?;
            let options: EnhancementOptions = flags.into();
            let mut pages = Vec::with_capacity(inputs.len());
            let mut fallbacks = 0usize;
            for input in &inputs {
                let raster = engine.decode_async(read_input(input).await?).await?;
                let (page, fell_back) = scan_page(&engine, raster, options).await;
                if fell_back {
                    fallbacks += 1;
                }
                pages.push(engine.prepare_raster_for_pdf_async(page, None).await?);
            }
            let pdf = engine.assemble_pdf(&pages, title.as_deref())?;
            tokio::fs::write(&output, &pdf).await?;
            if fallbacks > 0 {
                warn!(fallbacks, "Some pages could not be enhanced and were kept as captured");
            }
            info!(pages = pages.len(), bytes = pdf.len(), path = %output.display(), "Scan PDF written");
            Ok(())
        }
    }
}

/// Detect, crop, and enhance one decoded page.
///
/// The page stays a raster throughout so it is encoded only once, when it is
/// prepared for the PDF. Each step that fails leaves the page as it was
/// before that step; the flag reports whether any step fell back.
async fn scan_page(
    engine: &ImageEngine,
    original: DynamicImage,
    options: EnhancementOptions,
) -> (DynamicImage, bool) {
    let mut fell_back = false;

    let cropped = match engine.detect_borders_raster_async(original.clone()).await {
        Ok(detection) => match engine
            .crop_raster_async(detection.image, detection.corners.to_vec())
            .await
        {
            Ok(cropped) => cropped,
            Err(err) => {
                warn!(%err, "Crop failed; keeping original page");
                fell_back = true;
                original
            }
        },
        Err(err) => {
            warn!(%err, "Border detection failed; keeping original page");
            fell_back = true;
            original
        }
    };

    if options.is_noop() {
        return (cropped, fell_back);
    }

    match engine.enhance_raster_async(cropped.clone(), options).await {
        Ok(enhanced) => (enhanced, fell_back),
        Err(err) => {
            warn!(%err, "Enhancement failed; keeping unenhanced page");
            (cropped, true)
        }
    }
}

/// Read a file holding either encoded image bytes or a data URL.
async fn read_input(path: &Path) -> Result<Vec<u8>> {
    let raw = tokio::fs::read(path).await?;
    bytes_from_input(&raw)
}

/// Write to `output`, or print a data URL when no path was given.
async fn emit(image: &EncodedImage, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let named = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension);
            if named.is_some_and(|format| format != image.format()) {
                warn!(
                    path = %path.display(),
                    format = image.format().mime_type(),
                    "Output extension does not match the encoded format"
                );
            }
            tokio::fs::write(path, image.bytes()).await?;
            info!(bytes = image.len(), path = %path.display(), "Image written");
        }
        None => println!("{}", image.to_data_url()),
    }
    Ok(())
}
