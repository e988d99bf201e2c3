// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub const SOF0: u8 = 0xc0;
pub const SOF1: u8 = 0xc1;
pub const SOF2: u8 = 0xc2;
pub const DHT: u8 = 0xc4;
pub const JPG: u8 = 0xc8;
pub const DAC: u8 = 0xcc;
pub const RST0: u8 = 0xd0;
pub const RST7: u8 = 0xd7;
pub const SOI: u8 = 0xd8;
pub const EOI: u8 = 0xd9;
pub const SOS: u8 = 0xda;
pub const DQT: u8 = 0xdb;
pub const DNL: u8 = 0xdc;
pub const DRI: u8 = 0xdd;
pub const APP0: u8 = 0xe0;
pub const APP14: u8 = 0xee;
pub const APP15: u8 = 0xef;
pub const COM: u8 = 0xfe;
pub const TEM: u8 = 0x01;

/// The second byte of an `FF xx` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Start of frame; the payload is the low nibble of the code (0-15).
    Sof(u8),
    Dht,
    Dac,
    Soi,
    Eoi,
    Sos,
    Dqt,
    Dnl,
    Dri,
    /// Restart marker with its modulo-8 counter.
    Rst(u8),
    /// Application segment `APPn`.
    App(u8),
    Com,
    Tem,
    /// Any other code, including `JPG`, `JPGn` and reserved values.
    Reserved(u8),
}

impl From<u8> for Marker {
    fn from(code: u8) -> Marker {
        match code {
            DHT => Marker::Dht,
            DAC => Marker::Dac,
            JPG => Marker::Reserved(code),
            SOF0..=0xcf => Marker::Sof(code - SOF0),
            RST0..=RST7 => Marker::Rst(code - RST0),
            SOI => Marker::Soi,
            EOI => Marker::Eoi,
            SOS => Marker::Sos,
            DQT => Marker::Dqt,
            DNL => Marker::Dnl,
            DRI => Marker::Dri,
            APP0..=APP15 => Marker::App(code - APP0),
            COM => Marker::Com,
            TEM => Marker::Tem,
            _ => Marker::Reserved(code),
        }
    }
}
