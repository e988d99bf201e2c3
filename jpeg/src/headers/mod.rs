// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub mod app;
pub mod frame;
pub mod markers;
pub mod scan;
pub mod tables;

use crate::error::{Error, Result};
use crate::source::ByteSource;

pub use app::{AdobeTransform, AppSegment};
pub use frame::{CodingProcess, ComponentInfo, FrameHeader};
pub use markers::Marker;
pub use scan::{ScanComponent, ScanHeader, ScanKind};
pub use tables::{HuffmanTableDefinition, HuffmanTableSegment, QuantTable, QuantTableSegment};

/// A marker segment with a length field.
pub trait JpegSegment: Sized {
    /// Parses the segment body. `length` is the value of the length field,
    /// which counts itself; the source is positioned right after it.
    fn read<S: ByteSource + ?Sized>(src: &mut S, marker: u8, length: u16) -> Result<Self>;
}

/// Reads the length field that starts every segment.
pub fn read_segment_length<S: ByteSource + ?Sized>(src: &mut S, marker: u8) -> Result<u16> {
    let length = src.read_u16_be()?;
    if length < 2 {
        return Err(Error::BadSegmentLength(marker, length));
    }
    Ok(length)
}

/// Reads the length field and then the segment.
pub fn read_segment<T: JpegSegment, S: ByteSource + ?Sized>(src: &mut S, marker: u8) -> Result<T> {
    let length = read_segment_length(src, marker)?;
    T::read(src, marker, length)
}

/// Skips over a segment whose contents are not needed.
pub fn skip_segment<S: ByteSource + ?Sized>(src: &mut S, marker: u8) -> Result<()> {
    let length = read_segment_length(src, marker)?;
    src.skip(length as usize - 2)
}
