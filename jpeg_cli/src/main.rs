// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use jpeg::{JpegDecoderLimits, JpegDecoderOptions, decode_with_options};
use jpeg_cli::enc::png::to_png;
use jpeg_cli::enc::pnm::{pnm_extension, to_pnm};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(version, about = "Decodes JPEG files to PNG or PNM")]
struct Opt {
    /// Input JPEG files
    #[clap(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory to write outputs to; defaults to the input's directory
    #[clap(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Number of output channels (1-4); 0 picks gray or RGB from the source
    #[clap(long, default_value_t = 0)]
    channels: u8,

    /// Write PGM/PPM instead of PNG
    #[clap(long)]
    pnm: bool,

    /// Disable the default decoder resource limits
    #[clap(long)]
    no_limits: bool,

    /// Print timing information for each file
    #[clap(long, short)]
    verbose: bool,
}

fn output_path(opt: &Opt, input: &Path, extension: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| eyre!("No file name in {}", input.display()))?;
    let dir = match &opt.output_dir {
        Some(dir) => dir.clone(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(stem).with_extension(extension))
}

fn convert(opt: &Opt, options: &JpegDecoderOptions, input: &Path) -> Result<PathBuf> {
    let data =
        std::fs::read(input).wrap_err_with(|| format!("Cannot read {}", input.display()))?;
    let start = Instant::now();
    let image = decode_with_options(&data, options)
        .wrap_err_with(|| format!("Failed to decode {}", input.display()))?;
    let elapsed = start.elapsed();
    if opt.verbose {
        let pixels = (image.width * image.height) as f64;
        println!(
            "{}: {}x{} {} in {:.2} ms ({:.1} MP/s)",
            input.display(),
            image.width,
            image.height,
            image.color_space,
            elapsed.as_secs_f64() * 1e3,
            pixels / elapsed.as_secs_f64().max(1e-9) / 1e6,
        );
    }

    let (encoded, extension) = if opt.pnm {
        (to_pnm(&image)?, pnm_extension(image.channels)?)
    } else {
        (to_png(&image)?, "png")
    };
    let path = output_path(opt, input, extension)?;
    std::fs::write(&path, encoded)
        .wrap_err_with(|| format!("Cannot write {}", path.display()))?;
    Ok(path)
}

#[cfg(feature = "parallel")]
fn convert_all(opt: &Opt, options: &JpegDecoderOptions) -> Vec<Result<PathBuf>> {
    use rayon::prelude::*;
    opt.inputs
        .par_iter()
        .map(|input| convert(opt, options, input))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn convert_all(opt: &Opt, options: &JpegDecoderOptions) -> Vec<Result<PathBuf>> {
    opt.inputs
        .iter()
        .map(|input| convert(opt, options, input))
        .collect()
}

fn main() -> Result<()> {
    color_eyre::install()?;

    #[cfg(feature = "tracing-subscriber")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let opt = Opt::parse();

    let limits = if opt.no_limits {
        JpegDecoderLimits::unlimited()
    } else {
        JpegDecoderLimits::default_safe()
    };
    let options = JpegDecoderOptions::default()
        .with_output_channels(opt.channels)
        .with_limits(limits);

    let mut failures = 0;
    for result in convert_all(&opt, &options) {
        match result {
            Ok(path) => println!("Wrote {}", path.display()),
            Err(err) => {
                eprintln!("{err:?}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(eyre!("{} of {} files failed", failures, opt.inputs.len()));
    }
    Ok(())
}
