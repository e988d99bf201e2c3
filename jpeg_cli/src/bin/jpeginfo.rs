// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use clap::{Arg, Command};
use color_eyre::eyre::{Result, WrapErr, eyre};
use jpeg::{JpegInfo, read_info};
use std::fs;

fn print_info(info: &JpegInfo, verbose: bool) {
    if verbose {
        println!("{info:#?}");
        return;
    }
    println!(
        "{}x{}, {} components, {}, {}",
        info.width,
        info.height,
        info.num_components(),
        if info.is_progressive() {
            "progressive"
        } else {
            "baseline"
        },
        info.color_space,
    );
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let matches = Command::new("jpeginfo")
        .about("Provides info about a JPEG file")
        .arg(
            Arg::new("filename")
                .help("The JPEG file to analyze")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Dumps all parsed header fields")
                .num_args(0),
        )
        .get_matches();

    let filename = matches
        .get_one::<String>("filename")
        .ok_or_else(|| eyre!("No input file"))?;
    let verbose = matches.get_flag("verbose");

    if verbose {
        println!("Processing file: {filename}");
    }

    let data = fs::read(filename).wrap_err_with(|| format!("Cannot open {filename}"))?;
    let info = read_info(&data).wrap_err("Error parsing JPEG headers")?;
    print_info(&info, verbose);
    Ok(())
}
