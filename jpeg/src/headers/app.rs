// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Application and comment segments. Only the JFIF and Adobe signatures
//! are interpreted; everything else is skipped.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::Result;
use crate::headers::JpegSegment;
use crate::headers::markers::{APP0, APP14};
use crate::source::ByteSource;
use crate::util::tracing_wrappers::*;

const JFIF_SIGNATURE: &[u8; 5] = b"JFIF\0";
const ADOBE_SIGNATURE: &[u8; 6] = b"Adobe\0";

/// Color transform tag of an Adobe APP14 segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum AdobeTransform {
    /// Components are stored as-is (RGB or CMYK).
    Untransformed = 0,
    YCbCr = 1,
    Ycck = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSegment {
    Jfif,
    Adobe(AdobeTransform),
    Other,
}

/// Compares the next bytes against `signature`. All bytes are consumed
/// even after a mismatch.
fn matches_signature<S: ByteSource + ?Sized>(src: &mut S, signature: &[u8]) -> Result<bool> {
    let mut matches = true;
    for &expected in signature {
        matches &= src.read_byte()? == expected;
    }
    Ok(matches)
}

impl JpegSegment for AppSegment {
    fn read<S: ByteSource + ?Sized>(src: &mut S, marker: u8, length: u16) -> Result<Self> {
        let mut remaining = length as usize - 2;
        let mut segment = AppSegment::Other;
        if marker == APP0 && remaining >= JFIF_SIGNATURE.len() {
            remaining -= JFIF_SIGNATURE.len();
            if matches_signature(src, JFIF_SIGNATURE)? {
                segment = AppSegment::Jfif;
            }
        } else if marker == APP14 && remaining >= ADOBE_SIGNATURE.len() + 6 {
            remaining -= ADOBE_SIGNATURE.len();
            if matches_signature(src, ADOBE_SIGNATURE)? {
                let _version = src.read_byte()?;
                let _flags0 = src.read_u16_be()?;
                let _flags1 = src.read_u16_be()?;
                let tag = src.read_byte()?;
                remaining -= 6;
                let transform = AdobeTransform::from_u8(tag).unwrap_or_else(|| {
                    warn!(tag, "unknown Adobe color transform, assuming YCbCr");
                    AdobeTransform::YCbCr
                });
                segment = AppSegment::Adobe(transform);
            }
        }
        src.skip(remaining)?;
        Ok(segment)
    }
}
