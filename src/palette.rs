// src/palette.rs

//! The 256-entry indexed colour table embedded in a canvas surface.
//!
//! A palette starts with the colours the puzzle engine requests, then
//! grows antialiasing gradients: black to white first, then between every
//! unordered pair of engine colours. Candidates too close to an existing
//! entry are skipped so that many similar requests cannot exhaust the
//! table. Whatever space remains is padded with white, and a configured
//! palette always has exactly [`PALETTE_ENTRIES`] defined entries.

use crate::color::Rgb;
use crate::config::PaletteConfig;
use log::{debug, warn};

/// Number of entries in an indexed palette.
pub const PALETTE_ENTRIES: usize = 256;

/// A 256-entry indexed colour table.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: [Rgb; PALETTE_ENTRIES],
    defined: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    /// Creates an empty palette. Undefined entries read as black.
    pub fn new() -> Self {
        Self {
            entries: [Rgb::BLACK; PALETTE_ENTRIES],
            defined: 0,
        }
    }

    /// Number of defined entries.
    pub fn defined(&self) -> usize {
        self.defined
    }

    /// Returns the entry at `index`, or black for any out-of-range
    /// request. A safe default rather than an error.
    pub fn entry(&self, index: i32) -> Rgb {
        if index < 0 || index as usize >= PALETTE_ENTRIES {
            return Rgb::BLACK;
        }
        self.entries[index as usize]
    }

    /// Copies the engine's colour triples (components in [0, 1]) into
    /// sequential entries starting at the current count.
    ///
    /// Fails if the request would not leave at least one free slot for
    /// the gradient synthesis that follows; the caller must size its
    /// colour table conservatively.
    pub fn apply_game_colours(&mut self, colours: &[[f32; 3]]) -> bool {
        if self.defined >= PALETTE_ENTRIES {
            return false;
        }

        if colours.len() >= PALETTE_ENTRIES - self.defined {
            warn!(
                "Palette: {} game colours will not fit with {} entries already defined",
                colours.len(),
                self.defined
            );
            return false;
        }

        for triple in colours {
            self.push(Rgb::from_unit(triple[0], triple[1], triple[2]));
        }

        true
    }

    /// Adds a gradient of up to `steps` colours running from `start` to
    /// `end`, excluding both endpoints (they are assumed to be present
    /// already). Each candidate is skipped when an existing entry is
    /// within `max_error_percent` of it on every channel.
    pub fn build_gradient(&mut self, start: Rgb, end: Rgb, steps: usize, max_error_percent: u32) {
        if self.defined >= PALETTE_ENTRIES {
            return;
        }

        if steps < 1 || steps >= PALETTE_ENTRIES - self.defined {
            return;
        }

        for step in 1..=steps {
            let candidate = interpolate(start, end, step, steps);

            let duplicate = self.entries[..self.defined]
                .iter()
                .any(|&existing| candidate.close_to(existing, max_error_percent));

            if !duplicate {
                self.push(candidate);
            }
        }
    }

    /// Pads every remaining entry with white so the full table is defined.
    pub fn fill_unused(&mut self) {
        while self.defined < PALETTE_ENTRIES {
            self.push(Rgb::WHITE);
        }
    }

    /// Builds the complete palette for a game: the engine colours, a
    /// black-to-white ramp, a gradient between every unordered pair of
    /// engine colours, then white padding.
    ///
    /// Succeeds iff the table ends up with exactly [`PALETTE_ENTRIES`]
    /// defined entries; anything else means capacity was exceeded or
    /// left short and the palette should not be trusted.
    pub fn configure(&mut self, colours: &[[f32; 3]], config: &PaletteConfig) -> bool {
        self.entries = [Rgb::BLACK; PALETTE_ENTRIES];
        self.defined = 0;

        if !self.apply_game_colours(colours) {
            return false;
        }

        self.build_gradient(
            Rgb::BLACK,
            Rgb::WHITE,
            config.mono_gradient_steps,
            config.max_error_percent,
        );

        for start in 0..colours.len().saturating_sub(1) {
            for end in (start + 1)..colours.len() {
                self.build_gradient(
                    self.entries[start],
                    self.entries[end],
                    config.pair_gradient_steps,
                    config.max_error_percent,
                );
            }
        }

        self.fill_unused();

        debug!(
            "Palette configured: {} game colours, {} entries defined",
            colours.len(),
            self.defined
        );

        self.defined == PALETTE_ENTRIES
    }

    fn push(&mut self, colour: Rgb) {
        if self.defined < PALETTE_ENTRIES {
            self.entries[self.defined] = colour;
            self.defined += 1;
        }
    }
}

/// Linear per-channel interpolation at `step` of `steps`, matching the
/// integer arithmetic the palette has always used.
fn interpolate(start: Rgb, end: Rgb, step: usize, steps: usize) -> Rgb {
    let channel = |s: u8, e: u8| -> u8 {
        let s = s as i32;
        let e = e as i32;
        (((e - s) * step as i32 / steps as i32) + s) as u8
    };

    Rgb::new(
        channel(start.r, end.r),
        channel(start.g, end.g),
        channel(start.b, end.b),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(colours: &[[f32; 3]]) -> Palette {
        let mut palette = Palette::new();
        assert!(palette.configure(colours, &PaletteConfig::default()));
        palette
    }

    #[test]
    fn test_configure_defines_all_entries() {
        // Contract: a configured palette always has exactly 256 entries.
        for count in [0usize, 1, 4, 16] {
            let colours: Vec<[f32; 3]> = (0..count)
                .map(|i| {
                    let v = i as f32 / 16.0;
                    [v, 1.0 - v, 0.5]
                })
                .collect();
            let palette = configured(&colours);
            assert_eq!(palette.defined(), PALETTE_ENTRIES);
        }
    }

    #[test]
    fn test_game_colours_round_trip() {
        // Contract: entries 0..N-1 reproduce the engine triples exactly
        // after 8-bit quantization.
        let colours = [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.5, 0.25, 0.75]];
        let palette = configured(&colours);

        assert_eq!(palette.entry(0), Rgb::new(0, 0, 0));
        assert_eq!(palette.entry(1), Rgb::new(255, 255, 255));
        assert_eq!(palette.entry(2), Rgb::from_unit(0.5, 0.25, 0.75));
    }

    #[test]
    fn test_identical_endpoints_add_nothing() {
        // Contract: a gradient between two identical colours is entirely
        // deduplicated against the endpoint already present.
        let mut palette = Palette::new();
        assert!(palette.apply_game_colours(&[[0.5, 0.5, 0.5]]));
        let before = palette.defined();

        let grey = palette.entry(0);
        palette.build_gradient(grey, grey, 5, 5);

        assert_eq!(palette.defined(), before);
    }

    #[test]
    fn test_gradient_excludes_endpoints() {
        let mut palette = Palette::new();
        palette.build_gradient(Rgb::BLACK, Rgb::WHITE, 4, 5);

        for i in 0..palette.defined() {
            let entry = palette.entry(i as i32);
            assert_ne!(entry, Rgb::BLACK);
            assert_ne!(entry, Rgb::WHITE);
        }
    }

    #[test]
    fn test_out_of_range_entry_is_black() {
        let palette = configured(&[[1.0, 0.0, 0.0]]);
        assert_eq!(palette.entry(-1), Rgb::BLACK);
        assert_eq!(palette.entry(256), Rgb::BLACK);
    }

    #[test]
    fn test_too_many_colours_rejected() {
        // Contract: the request must leave room for at least one slot.
        let colours = vec![[0.5f32, 0.5, 0.5]; PALETTE_ENTRIES];
        let mut palette = Palette::new();
        assert!(!palette.configure(&colours, &PaletteConfig::default()));
    }

    #[test]
    fn test_fill_pads_with_white() {
        let mut palette = Palette::new();
        assert!(palette.apply_game_colours(&[[0.0, 0.0, 0.0]]));
        palette.fill_unused();

        assert_eq!(palette.defined(), PALETTE_ENTRIES);
        assert_eq!(palette.entry(255), Rgb::WHITE);
    }
}
