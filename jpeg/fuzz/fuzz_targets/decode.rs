// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
#![no_main]

use jpeg::{JpegDecoderLimits, JpegDecoderOptions, decode_with_options};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&channels, data)) = data.split_first() else {
        return;
    };
    let limits = JpegDecoderLimits {
        max_pixels: Some(1 << 24),
        max_scans: Some(256),
    };
    let options = JpegDecoderOptions::default()
        .with_output_channels(channels % 5)
        .with_limits(limits);
    if let Ok(image) = decode_with_options(data, &options) {
        assert_eq!(
            image.pixels.len(),
            image.width * image.height * image.channels
        );
    }
});
