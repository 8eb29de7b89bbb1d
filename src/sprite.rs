// src/sprite.rs

//! The indexed-colour pixel surface and its on-disk sprite layout.
//!
//! A [`SpriteArea`] is one 8-bit-per-pixel image with an optional
//! embedded 256-entry palette. Rows are padded to a word boundary with a
//! little headroom so blitter copies never read past a row end. The
//! on-disk serialization reproduces the platform sprite-file byte layout
//! (area header, 44-byte sprite header, double-word palette block,
//! word-padded pixel rows) so existing sprite viewers can open exports.

use crate::error::RenderError;
use crate::palette::{Palette, PALETTE_ENTRIES};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Size of the in-memory sprite area header, in bytes. The leading size
/// word is omitted when an area is written to a file.
pub const AREA_HEADER_SIZE: u32 = 16;

/// Size of a sprite header block, in bytes.
pub const SPRITE_HEADER_SIZE: u32 = 44;

/// Size of the palette block: 256 entries of two colour words each
/// (flash phase 1 and 2).
pub const PALETTE_BLOCK_SIZE: u32 = (PALETTE_ENTRIES as u32) * 8;

/// The sprite name recorded in exported files.
const SPRITE_NAME: &[u8] = b"Canvas";

/// The 256-colour screen mode recorded in exported files.
const SPRITE_MODE: u32 = 21;

/// An owned 8bpp pixel surface, row 0 at the top.
#[derive(Debug, Clone)]
pub struct SpriteArea {
    width: i32,
    height: i32,
    /// In-memory row stride: the width rounded up to a word boundary
    /// plus headroom for unaligned blitter copies.
    row_bytes: usize,
    pixels: Vec<u8>,
    palette: Option<Palette>,
}

impl SpriteArea {
    /// Allocates a surface of the given dimensions, optionally with an
    /// embedded (initially empty) palette.
    pub fn new(width: i32, height: i32, with_palette: bool) -> Result<Self, RenderError> {
        if width <= 0 || height <= 0 {
            return Err(RenderError::BadDimensions(width, height));
        }

        let row_bytes = ((width as usize) + 6) & !3;
        let pixels = vec![0u8; row_bytes * height as usize];

        Ok(Self {
            width,
            height,
            row_bytes,
            pixels,
            palette: with_palette.then(Palette::new),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The in-memory row stride in bytes.
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn palette_mut(&mut self) -> Option<&mut Palette> {
        self.palette.as_mut()
    }

    /// Reads the pixel at `(x, y)`; out-of-range reads return zero.
    pub fn pixel(&self, x: i32, y: i32) -> u8 {
        if !self.contains(x, y) {
            return 0;
        }
        self.pixels[y as usize * self.row_bytes + x as usize]
    }

    /// Writes the pixel at `(x, y)`; out-of-range writes are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, colour: u8) {
        if self.contains(x, y) {
            self.pixels[y as usize * self.row_bytes + x as usize] = colour;
        }
    }

    /// Fills the inclusive column span `x0..=x1` on row `y`, clipped to
    /// the surface.
    pub fn fill_span(&mut self, y: i32, x0: i32, x1: i32, colour: u8) {
        if y < 0 || y >= self.height {
            return;
        }

        let x0 = x0.max(0);
        let x1 = x1.min(self.width - 1);
        if x0 > x1 {
            return;
        }

        let row = y as usize * self.row_bytes;
        self.pixels[row + x0 as usize..=row + x1 as usize].fill(colour);
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Captures this surface's rectangle worth of pixels from `src`,
    /// with `(src_x, src_y)` naming the top-left corner of the region.
    /// Parts of the region outside `src` are left untouched.
    pub fn copy_rect_from(&mut self, src: &SpriteArea, src_x: i32, src_y: i32) {
        for row in 0..self.height {
            let sy = src_y + row;
            if sy < 0 || sy >= src.height {
                continue;
            }

            for col in 0..self.width {
                let sx = src_x + col;
                if sx < 0 || sx >= src.width {
                    continue;
                }
                let value = src.pixels[sy as usize * src.row_bytes + sx as usize];
                self.pixels[row as usize * self.row_bytes + col as usize] = value;
            }
        }
    }

    /// Paints this surface's full content into `dst` with its top-left
    /// corner at `(dst_x, dst_y)`, clipped to `dst`.
    pub fn copy_rect_to(&self, dst: &mut SpriteArea, dst_x: i32, dst_y: i32) {
        for row in 0..self.height {
            let dy = dst_y + row;
            if dy < 0 || dy >= dst.height {
                continue;
            }

            for col in 0..self.width {
                let dx = dst_x + col;
                if dx < 0 || dx >= dst.width {
                    continue;
                }
                let value = self.pixels[row as usize * self.row_bytes + col as usize];
                dst.pixels[dy as usize * dst.row_bytes + dx as usize] = value;
            }
        }
    }

    /// Serializes the surface in the sprite-file byte layout.
    ///
    /// File rows use the tight word-padded stride rather than the
    /// in-memory headroom stride, matching what the platform writes.
    pub fn to_file_bytes(&self) -> Vec<u8> {
        let file_stride = ((self.width as u32) + 3) & !3;
        let pixel_bytes = file_stride * self.height as u32;
        let palette_bytes = if self.palette.is_some() {
            PALETTE_BLOCK_SIZE
        } else {
            0
        };
        let sprite_size = SPRITE_HEADER_SIZE + palette_bytes + pixel_bytes;

        let mut out = Vec::with_capacity((12 + sprite_size) as usize);
        let word = |out: &mut Vec<u8>, value: u32| out.extend_from_slice(&value.to_le_bytes());

        // Area header, minus the leading size word which is never
        // written to a file. Offsets remain relative to that word.
        word(&mut out, 1); // sprite count
        word(&mut out, AREA_HEADER_SIZE); // offset of first sprite
        word(&mut out, AREA_HEADER_SIZE + sprite_size); // used size

        // Sprite header.
        word(&mut out, sprite_size);
        let mut name = [0u8; 12];
        name[..SPRITE_NAME.len()].copy_from_slice(SPRITE_NAME);
        out.extend_from_slice(&name);
        word(&mut out, file_stride / 4 - 1); // width in words, minus one
        word(&mut out, self.height as u32 - 1);
        word(&mut out, 0); // first bit used
        word(&mut out, ((self.width as u32 - 1) % 4) * 8 + 7); // last bit used
        word(&mut out, SPRITE_HEADER_SIZE + palette_bytes); // image offset
        word(&mut out, SPRITE_HEADER_SIZE + palette_bytes); // mask offset (no mask)
        word(&mut out, SPRITE_MODE);

        // Palette block: each entry twice, flash 1 and flash 2.
        if let Some(palette) = &self.palette {
            for entry in 0..PALETTE_ENTRIES {
                let packed = palette.entry(entry as i32).pack();
                word(&mut out, packed);
                word(&mut out, packed);
            }
        }

        // Pixel rows, repacked to the file stride.
        for row in 0..self.height as usize {
            let start = row * self.row_bytes;
            out.extend_from_slice(&self.pixels[start..start + self.width as usize]);
            for _ in self.width as u32..file_stride {
                out.push(0);
            }
        }

        out
    }

    /// Best-effort export of the surface to a sprite file. Failures are
    /// logged, never propagated; this is a debugging aid.
    pub fn write_to_file(&self, path: &Path) {
        match fs::write(path, self.to_file_bytes()) {
            Ok(()) => debug!("Saved sprite area to {}", path.display()),
            Err(err) => warn!("Failed to save sprite area to {}: {}", path.display(), err),
        }
    }
}
