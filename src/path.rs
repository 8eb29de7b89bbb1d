// src/path.rs

//! A bounded path builder for outline and filled-shape drawing.
//!
//! Paths accumulate move/line/close elements against a fixed word
//! budget, mirroring the fixed draw buffer the rendering protocol
//! allots. Overflow latches the path invalid until the next
//! `start_path`; an invalid path refuses to stroke or fill.

use log::warn;

use crate::config::PathConfig;
use crate::raster::{self, PixelClip};
use crate::sprite::SpriteArea;

/// One element of a path, with its cost in buffer words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathElement {
    MoveTo(i32, i32),
    LineTo(i32, i32),
    Close,
    End,
}

impl PathElement {
    fn words(self) -> usize {
        match self {
            PathElement::MoveTo(..) | PathElement::LineTo(..) => 3,
            PathElement::Close => 1,
            PathElement::End => 2,
        }
    }
}

/// Accumulates path elements in OS-unit coordinates up to a fixed
/// word budget.
#[derive(Debug)]
pub struct PathBuilder {
    elements: Vec<PathElement>,
    words: usize,
    capacity_words: usize,
    valid: bool,
    terminated: bool,
}

impl PathBuilder {
    pub fn new(config: &PathConfig) -> Self {
        PathBuilder {
            elements: Vec::new(),
            words: 0,
            capacity_words: config.buffer_words,
            valid: true,
            terminated: false,
        }
    }

    /// Discards any previous path and begins a new one at the given
    /// unit point. This is the only way to clear the invalid state.
    pub fn start_path(&mut self, ux: i32, uy: i32) {
        self.elements.clear();
        self.words = 0;
        self.valid = true;
        self.terminated = false;
        self.push(PathElement::MoveTo(ux, uy));
    }

    /// Starts a new subpath at the given unit point without discarding
    /// what came before. Returns false once the path has overflowed.
    pub fn add_move(&mut self, ux: i32, uy: i32) -> bool {
        self.push(PathElement::MoveTo(ux, uy))
    }

    /// Appends a straight segment. Returns false once the path has
    /// overflowed its buffer.
    pub fn add_line(&mut self, ux: i32, uy: i32) -> bool {
        self.push(PathElement::LineTo(ux, uy))
    }

    /// Closes the current subpath back to its starting point.
    pub fn close_subpath(&mut self) -> bool {
        self.push(PathElement::Close)
    }

    /// Terminates the path, making it eligible for stroking and
    /// filling. Returns false on overflow.
    pub fn end_path(&mut self) -> bool {
        if self.push(PathElement::End) {
            self.terminated = true;
            true
        } else {
            false
        }
    }

    fn push(&mut self, element: PathElement) -> bool {
        if !self.valid {
            return false;
        }
        if self.terminated {
            warn!("path element added after end of path; discarding path");
            self.valid = false;
            return false;
        }
        let words = element.words();
        if self.words + words > self.capacity_words {
            warn!(
                "path overflowed its {}-word buffer; discarding path",
                self.capacity_words
            );
            self.valid = false;
            return false;
        }
        self.words += words;
        self.elements.push(element);
        true
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Strokes the path outline at the given width in OS units.
    pub fn stroke(
        &self,
        surface: &mut SpriteArea,
        clip: Option<PixelClip>,
        width_units: i32,
        colour: u8,
    ) {
        let Some(contours) = self.contours() else {
            return;
        };
        for (points, closed) in &contours {
            raster::stroke_polyline(surface, clip, points, *closed, width_units, colour);
        }
    }

    /// Fills the path interior under the non-zero winding rule. Open
    /// subpaths are treated as closed for filling.
    pub fn fill(&self, surface: &mut SpriteArea, clip: Option<PixelClip>, colour: u8) {
        let Some(contours) = self.contours() else {
            return;
        };
        let loops: Vec<Vec<(i32, i32)>> =
            contours.into_iter().map(|(points, _)| points).collect();
        raster::fill_contours(surface, clip, &loops, colour);
    }

    /// Builds and strokes an axis-aligned box outline with opposite
    /// corners at the two unit points.
    pub fn draw_box(
        &mut self,
        surface: &mut SpriteArea,
        clip: Option<PixelClip>,
        a: (i32, i32),
        b: (i32, i32),
        width_units: i32,
        colour: u8,
    ) {
        self.start_path(a.0, a.1);
        self.add_line(b.0, a.1);
        self.add_line(b.0, b.1);
        self.add_line(a.0, b.1);
        self.close_subpath();
        if self.end_path() {
            self.stroke(surface, clip, width_units, colour);
        }
    }

    /// Builds and strokes a single straight segment.
    pub fn draw_line_segment(
        &mut self,
        surface: &mut SpriteArea,
        clip: Option<PixelClip>,
        from: (i32, i32),
        to: (i32, i32),
        width_units: i32,
        colour: u8,
    ) {
        self.start_path(from.0, from.1);
        self.add_line(to.0, to.1);
        if self.end_path() {
            self.stroke(surface, clip, width_units, colour);
        }
    }

    /// Splits the path into subpaths, each a point list plus whether
    /// it was explicitly closed. None if the path cannot be drawn.
    fn contours(&self) -> Option<Vec<(Vec<(i32, i32)>, bool)>> {
        if !self.valid {
            warn!("ignoring draw of an overflowed path");
            return None;
        }
        if !self.terminated {
            warn!("ignoring draw of an unterminated path");
            return None;
        }

        let mut contours = Vec::new();
        let mut current: Vec<(i32, i32)> = Vec::new();

        for &element in &self.elements {
            match element {
                PathElement::MoveTo(x, y) => {
                    if current.len() > 1 {
                        contours.push((std::mem::take(&mut current), false));
                    } else {
                        current.clear();
                    }
                    current.push((x, y));
                }
                PathElement::LineTo(x, y) => current.push((x, y)),
                PathElement::Close => {
                    if current.len() > 1 {
                        contours.push((std::mem::take(&mut current), true));
                    } else {
                        current.clear();
                    }
                }
                PathElement::End => break,
            }
        }
        if current.len() > 1 {
            contours.push((current, false));
        }

        Some(contours)
    }
}
