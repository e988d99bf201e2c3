// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::TryReserveError;

use thiserror::Error;

/// Broad classes of decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The marker structure of the stream is wrong.
    MalformedContainer,
    /// The stream is valid JPEG but uses something this decoder does not implement.
    UnsupportedFeature,
    /// A DHT segment describes an impossible code.
    CorruptHuffmanTable,
    /// Scan headers or entropy-coded data are inconsistent.
    CorruptEntropyStream,
    /// The stream ends before the image is complete.
    TruncatedStream,
    /// A configured limit was hit, or memory could not be allocated.
    LimitExceeded,
}

#[derive(Error, Debug)]
pub enum Error {
    // Container structure.
    #[error("Missing SOI marker, stream starts with {0:02x}{1:02x}")]
    NoSoiMarker(u8, u8),
    #[error("Unknown marker {0:#04x} before frame header")]
    UnknownMarker(u8),
    #[error("Marker {0:#04x} is not allowed here")]
    UnexpectedMarker(u8),
    #[error("Bad length {1} for marker {0:#04x}")]
    BadSegmentLength(u8, u16),
    #[error("Scan before frame header")]
    ScanBeforeFrame,
    #[error("Second frame header")]
    DuplicateFrame,
    #[error("End of image before any scan")]
    NoScans,
    #[error("Bad DQT table: precision {0}, slot {1}")]
    BadQuantTable(u8, u8),
    #[error("Bad DHT header: class {0}, slot {1}")]
    BadHuffmanHeader(u8, u8),
    #[error("Bad DNL segment: length {0}, lines {1}")]
    BadDnl(u16, u16),
    #[error("Invalid image size: {0}x{1}")]
    InvalidImageSize(u32, u32),
    #[error("Bad sampling factors {0}x{1} for component {2}")]
    BadSamplingFactors(u8, u8, u8),
    #[error("Bad quantization table index {0}")]
    BadQuantTableIndex(u8),
    #[error("Duplicate component id {0}")]
    DuplicateComponentId(u8),
    // Unsupported features.
    #[error("Unsupported sample precision: {0} bits")]
    UnsupportedPrecision(u8),
    #[error("Unsupported component count: {0}")]
    UnsupportedComponentCount(u8),
    #[error("Unsupported coding process (marker {0:#04x})")]
    UnsupportedProcess(u8),
    #[error("Invalid requested channel count: {0}")]
    InvalidChannelCount(u8),
    #[error("Sampling factor {1} does not divide maximum factor {0}")]
    UnsupportedSamplingRatio(u8, u8),
    // Huffman tables.
    #[error("Bad Huffman code lengths")]
    BadHuffmanLengths,
    #[error("Too many Huffman symbols: {0}")]
    TooManyHuffmanSymbols(usize),
    // Entropy-coded data and scan headers.
    #[error("Bad Huffman code")]
    BadHuffmanCode,
    #[error("Bad DC coefficient category {0}")]
    BadDcCategory(u8),
    #[error("DC coefficient out of range")]
    DcOutOfRange,
    #[error("AC coefficient index {0} past end of block")]
    BadAcIndex(usize),
    #[error("Bad SOS component count {0}")]
    BadScanComponentCount(u8),
    #[error("SOS references unknown component id {0}")]
    BadSosComponent(u8),
    #[error("Huffman table slot {1} for {0} is not defined")]
    MissingHuffmanTable(&'static str, u8),
    #[error("Quantization table slot {0} is not defined")]
    MissingQuantTable(u8),
    #[error("Bad spectral selection {0}..={1} or successive approximation {2}/{3}")]
    BadProgression(u8, u8, u8, u8),
    #[error("Non-progressive scan with spectral selection {0}..={1}, approximation {2}/{3}")]
    BadBaselineScan(u8, u8, u8, u8),
    // Truncation.
    #[error("Stream truncated")]
    TruncatedStream,
    // Limits.
    #[error("Image too large: {0}x{1} exceeds the pixel limit")]
    ImageTooLarge(u32, u32),
    #[error("Too many scans: limit is {0}")]
    TooManyScans(usize),
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            NoSoiMarker(..)
            | UnknownMarker(_)
            | UnexpectedMarker(_)
            | BadSegmentLength(..)
            | ScanBeforeFrame
            | DuplicateFrame
            | NoScans
            | BadQuantTable(..)
            | BadHuffmanHeader(..)
            | BadDnl(..)
            | InvalidImageSize(..)
            | BadSamplingFactors(..)
            | BadQuantTableIndex(_)
            | DuplicateComponentId(_) => ErrorKind::MalformedContainer,
            UnsupportedPrecision(_)
            | UnsupportedComponentCount(_)
            | UnsupportedProcess(_)
            | InvalidChannelCount(_)
            | UnsupportedSamplingRatio(..) => ErrorKind::UnsupportedFeature,
            BadHuffmanLengths | TooManyHuffmanSymbols(_) => ErrorKind::CorruptHuffmanTable,
            BadHuffmanCode
            | BadDcCategory(_)
            | DcOutOfRange
            | BadAcIndex(_)
            | BadScanComponentCount(_)
            | BadSosComponent(_)
            | MissingHuffmanTable(..)
            | MissingQuantTable(_)
            | BadProgression(..)
            | BadBaselineScan(..) => ErrorKind::CorruptEntropyStream,
            TruncatedStream | Io(_) => ErrorKind::TruncatedStream,
            ImageTooLarge(..) | TooManyScans(_) | ArithmeticOverflow | OutOfMemory(_) => {
                ErrorKind::LimitExceeded
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
