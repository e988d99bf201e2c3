// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![deny(unsafe_code)]
pub mod api;
pub mod bit_reader;
pub mod decode;
pub mod entropy_coding;
pub mod error;
pub mod headers;
pub mod image;
pub mod render;
pub mod source;
pub mod util;

pub use api::{
    DecodedImage, JpegDecoder, JpegDecoderLimits, JpegDecoderOptions, JpegInfo, check_signature,
    decode, decode_with_options, read_info,
};

use jpeg_transforms::{BLOCK_DIM, BLOCK_SIZE};

/// Maps a position in zigzag (entropy stream) order to the row-major index
/// inside an 8x8 block.
#[rustfmt::skip]
pub(crate) const DEZIGZAG: [usize; BLOCK_SIZE] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Maximum number of components in a frame.
pub(crate) const MAX_COMPONENTS: usize = 4;
/// Number of table slots for each of DC Huffman, AC Huffman and quantization tables.
pub(crate) const NUM_TABLE_SLOTS: usize = 4;
