// src/color.rs

//! Defines the `Rgb` colour value and the packed palette-word encoding.
//!
//! Palette entries carry no alpha. The packed 32-bit form uses the
//! `0xBBGGRR00` byte layout of the sprite file format, preserved exactly
//! so that exported surfaces remain readable by existing viewers.

use serde::{Deserialize, Serialize};

/// An RGB colour with 8-bit channels and no alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts engine-supplied components in [0, 1] to 8-bit channels.
    ///
    /// Quantization truncates after scaling by 0xff, matching the
    /// engine's expectation of exact round trips for colours it chose
    /// from an 8-bit gamut.
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: (r * 255.0) as u8,
            g: (g * 255.0) as u8,
            b: (b * 255.0) as u8,
        }
    }

    /// Packs the colour into the sprite palette word layout `0xBBGGRR00`.
    pub const fn pack(self) -> u32 {
        ((self.r as u32) << 8) | ((self.g as u32) << 16) | ((self.b as u32) << 24)
    }

    /// Unpacks a sprite palette word.
    pub const fn unpack(word: u32) -> Self {
        Self {
            r: ((word >> 8) & 0xff) as u8,
            g: ((word >> 16) & 0xff) as u8,
            b: ((word >> 24) & 0xff) as u8,
        }
    }

    /// Tests whether `other` lies within `error_percent` of this colour
    /// on every channel.
    ///
    /// Used by gradient synthesis to skip near-duplicate palette entries.
    /// The comparison is relative for channels of 20 or more and absolute
    /// below that, where a relative measure against a near-zero channel
    /// would be meaningless.
    pub fn close_to(self, other: Rgb, error_percent: u32) -> bool {
        channel_close(self.r, other.r, error_percent)
            && channel_close(self.g, other.g, error_percent)
            && channel_close(self.b, other.b, error_percent)
    }
}

/// Smallest channel value compared relatively; darker channels switch to
/// an absolute tolerance equal to what the relative rule grants here.
const RELATIVE_FLOOR: u32 = 20;

fn channel_close(candidate: u8, existing: u8, error_percent: u32) -> bool {
    let diff = candidate.abs_diff(existing) as u32;
    let candidate = candidate as u32;

    if candidate >= RELATIVE_FLOOR {
        100 * diff / candidate < error_percent
    } else {
        diff <= error_percent * RELATIVE_FLOOR / 100
    }
}
