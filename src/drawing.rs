// src/drawing.rs

//! The drawing interface a puzzle backend renders through.
//!
//! Every method is best-effort: a target logs and swallows internal
//! failures rather than surfacing them mid-frame, so a backend never
//! has to unwind halfway through a redraw. Coordinates are game
//! pixels with the origin at the top-left.

use crate::blitter::BlitterHandle;

/// Which of the two built-in text styles to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// Fixed-pitch, for grids of digits that must line up.
    Fixed,
    /// Proportional, for labels.
    Variable,
}

impl FontKind {
    pub fn is_monospaced(self) -> bool {
        matches!(self, FontKind::Fixed)
    }
}

/// A render target for one frame of puzzle drawing.
///
/// Alignment arguments are signed: negative aligns the text's left or
/// top edge to the anchor point, zero centres it, positive aligns the
/// right or bottom edge.
pub trait DrawingTarget {
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        font: FontKind,
        size: i32,
        h_align: i32,
        v_align: i32,
        colour: i32,
        text: &str,
    );

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, colour: i32);

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: i32);

    /// Draws a polygon, filled with `fill` unless it is -1, then
    /// outlined with `outline`.
    fn draw_polygon(&mut self, points: &[(i32, i32)], fill: i32, outline: i32);

    /// Draws a circle by centre and radius, filled with `fill` unless
    /// it is -1, then outlined with `outline`.
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, fill: i32, outline: i32);

    /// Marks a rectangle of the frame as needing repainting.
    fn draw_update(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Restricts subsequent drawing to the given rectangle.
    fn clip(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Removes any clip set by `clip`.
    fn unclip(&mut self);

    /// Begins a frame. Drawing calls are only valid between
    /// `start_draw` and `end_draw`.
    fn start_draw(&mut self);

    /// Ends a frame, dropping any leftover clip.
    fn end_draw(&mut self);

    /// Replaces the status bar text.
    fn status_bar(&mut self, text: &str);

    /// Allocates a blitter of the given size, or None on failure.
    fn blitter_new(&mut self, width: i32, height: i32) -> Option<BlitterHandle>;

    fn blitter_free(&mut self, handle: BlitterHandle);

    /// Captures the screen rectangle under the blitter at (x, y).
    fn blitter_save(&mut self, handle: BlitterHandle, x: i32, y: i32);

    /// Restores a captured rectangle; -1 on an axis reuses the saved
    /// coordinate.
    fn blitter_load(&mut self, handle: BlitterHandle, x: i32, y: i32);

    /// Optional anti-aliased thick line. The default accepts and
    /// ignores it; the midend falls back to polygons itself.
    #[allow(clippy::too_many_arguments)]
    fn draw_thick_line(
        &mut self,
        _thickness: f32,
        _x1: f32,
        _y1: f32,
        _x2: f32,
        _y2: f32,
        _colour: i32,
    ) {
    }
}
