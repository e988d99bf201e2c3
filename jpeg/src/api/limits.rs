// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Resource limits for JPEG decoding.

/// Configurable limits for the JPEG decoder.
///
/// These protect against streams that declare huge frames or that repeat
/// progressive scans to burn CPU time. By default nothing is limited; use
/// [`JpegDecoderLimits::default_safe()`] for general use or
/// [`JpegDecoderLimits::restrictive()`] for untrusted content.
///
/// # Example
///
/// ```
/// use jpeg::api::JpegDecoderLimits;
///
/// let limits = JpegDecoderLimits::default();
/// assert!(limits.max_pixels.is_none());
///
/// let limits = JpegDecoderLimits::restrictive();
/// assert_eq!(limits.max_scans, Some(100));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JpegDecoderLimits {
    /// Maximum total pixels allowed (width * height).
    /// Default: `None` (unlimited).
    pub max_pixels: Option<usize>,

    /// Maximum number of scans in one image.
    /// Default: `None` (unlimited).
    pub max_scans: Option<usize>,
}

impl JpegDecoderLimits {
    /// Limits suitable for general use.
    pub fn default_safe() -> Self {
        Self {
            max_pixels: Some(1 << 30), // ~1 billion pixels
            max_scans: Some(1000),
        }
    }

    /// Limits for content from untrusted sources.
    pub fn restrictive() -> Self {
        Self {
            max_pixels: Some(100_000_000), // 100 megapixels
            max_scans: Some(100),
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }
}
