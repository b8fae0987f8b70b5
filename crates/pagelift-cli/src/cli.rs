// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pagelift_core::{Corner, EnhancementOptions, FilterOptions, PaperSize};

#[derive(Debug, Parser)]
#[command(
    name = "pagelift",
    version,
    about = "Clean up document photos: detect borders, crop, enhance, and build PDFs"
)]
pub struct Cli {
    /// JSON engine configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Automatic correction flags shared by `enhance` and `scan`.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct EnhanceFlags {
    /// Push bright background pixels towards white.
    #[arg(long)]
    pub white_background: bool,
    /// Lift shadows by a flat offset.
    #[arg(long)]
    pub remove_shadows: bool,
    /// Apply a mild contrast boost.
    #[arg(long)]
    pub boost_clarity: bool,
}

impl From<EnhanceFlags> for EnhancementOptions {
    fn from(flags: EnhanceFlags) -> Self {
        Self {
            white_background: flags.white_background,
            remove_shadows: flags.remove_shadows,
            boost_clarity: flags.boost_clarity,
        }
    }
}

/// Where to put an encoded image. Without `--output` a data URL is printed.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply automatic background, shadow, and clarity corrections.
    Enhance {
        input: PathBuf,
        #[command(flatten)]
        flags: EnhanceFlags,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Print the detected document rectangle as JSON.
    Borders { input: PathBuf },
    /// Crop to the bounding box of the given corners.
    Crop {
        input: PathBuf,
        /// Corner as `x,y`; repeat for each corner.
        #[arg(long = "corner", value_parser = parse_corner, allow_hyphen_values = true, required = true)]
        corners: Vec<Corner>,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Detect borders and crop in one step.
    AutoCrop {
        input: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Manual brightness, contrast, and black-and-white adjustment.
    Filter {
        input: PathBuf,
        /// -100..=100
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        brightness: i32,
        /// -100..=100
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        contrast: i32,
        #[arg(long)]
        black_and_white: bool,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Small low-quality preview.
    Thumbnail {
        input: PathBuf,
        #[arg(long)]
        max_width: Option<u32>,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Downscaled black-and-white PNG for text recognition.
    OcrPrep {
        input: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Combine images into a PDF, one page each.
    Pdf {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        title: Option<String>,
        /// a4, a3, a5, letter, or legal
        #[arg(long, value_parser = parse_paper)]
        paper: Option<PaperSize>,
    },
    /// Detect, crop, and enhance each photo, then combine into a PDF.
    ///
    /// A page whose crop or enhancement fails is kept as captured.
    Scan {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        flags: EnhanceFlags,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        #[arg(long)]
        title: Option<String>,
    },
}

impl Command {
    /// Filter options from the `filter` subcommand's flags.
    pub fn filter_options(brightness: i32, contrast: i32, black_and_white: bool) -> FilterOptions {
        FilterOptions {
            brightness,
            contrast,
            black_and_white,
        }
    }
}

fn parse_corner(value: &str) -> Result<Corner, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {value:?}"))?;
    let x = x.trim().parse::<i32>().map_err(|err| format!("bad x in {value:?}: {err}"))?;
    let y = y.trim().parse::<i32>().map_err(|err| format!("bad y in {value:?}: {err}"))?;
    Ok(Corner::new(x, y))
}

fn parse_paper(value: &str) -> Result<PaperSize, String> {
    PaperSize::from_name(value).ok_or_else(|| format!("unknown paper size {value:?}"))
}
