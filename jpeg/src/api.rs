// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

mod decoder;
mod info;
mod limits;
mod options;

pub use crate::render::color::ColorSpace;
pub use decoder::*;
pub use info::*;
pub use limits::*;
pub use options::*;

/// Every JPEG stream starts with SOI followed by the first marker prefix.
pub const JPEG_SIGNATURE: [u8; 3] = [0xff, 0xd8, 0xff];

/// Returns true if `file_prefix` starts like a JPEG stream.
pub fn check_signature(file_prefix: &[u8]) -> bool {
    file_prefix.starts_with(&JPEG_SIGNATURE)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn signature() {
        assert!(check_signature(&[0xff, 0xd8, 0xff, 0xe0]));
        assert!(check_signature(&JPEG_SIGNATURE));
        assert!(!check_signature(&[0xff, 0xd8]));
        assert!(!check_signature(&[0xff, 0x0a, 0xff]));
        assert!(!check_signature(&[]));
    }
}
