// src/session.rs

//! The render session: one canvas, its blitters and path state, and
//! the host window it paints into, driven through a small plot
//! protocol in game-pixel coordinates.
//!
//! Game coordinates have the origin at the top-left with y growing
//! downward; the surface works in OS units, origin bottom-left, two
//! units per pixel. The session owns that transform so callers never
//! see unit coordinates.

use bitflags::bitflags;
use log::{debug, warn};

use crate::blitter::{self, BlitterHandle, BlitterSet};
use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::drawing::{DrawingTarget, FontKind};
use crate::error::RenderError;
use crate::font;
use crate::host::{GameRect, HostWindow};
use crate::path::PathBuilder;
use crate::raster::{self, PixelClip};

bitflags! {
    /// Plot operation codes: a drawing family in the high bits plus a
    /// move/draw action in the low three.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PlotCode: u32 {
        /// Straight solid line family.
        const SOLID = 0x00;
        /// Reposition the graphics cursor without drawing.
        const MOVE_TO = 0x04;
        /// Draw from the cursor to the given point.
        const PLOT_TO = 0x05;
        /// Axis-aligned filled rectangle family.
        const RECTANGLE = 0x60;
        /// Circle outline family; the point is on the circumference.
        const CIRCLE_OUTLINE = 0x90;
        /// Filled circle family; the point is on the circumference.
        const CIRCLE = 0x98;
    }
}

const ACTION_MASK: u32 = 0x07;
const ACTION_MOVE: u32 = 0x04;
const ACTION_DRAW: u32 = 0x05;

/// A complete rendering state for one puzzle window.
pub struct RenderSession<H: HostWindow> {
    canvas: Canvas,
    blitters: BlitterSet,
    path: PathBuilder,
    host: H,
    colour_count: usize,
    colour: u8,
    clip: Option<PixelClip>,
    /// Graphics cursor in game pixels, set by MOVE_TO plots.
    cursor: (i32, i32),
}

impl<H: HostWindow> RenderSession<H> {
    pub fn new(host: H, config: &RenderConfig) -> Self {
        RenderSession {
            canvas: Canvas::new(),
            blitters: BlitterSet::new(),
            path: PathBuilder::new(&config.path),
            host,
            colour_count: 0,
            colour: 0,
            clip: None,
            cursor: (0, 0),
        }
    }

    /// Builds the off-screen canvas for a game of the given pixel size
    /// and colour list. False leaves the session inert but usable.
    pub fn create_canvas(
        &mut self,
        width: i32,
        height: i32,
        colours: &[[f32; 3]],
        config: &RenderConfig,
    ) -> bool {
        self.colour_count = 0;
        self.clip = None;
        if !self.canvas.configure_area(width, height, true) {
            return false;
        }
        if !self.canvas.configure_save_area() {
            return false;
        }
        if !self.canvas.set_game_colours(colours, &config.palette) {
            warn!("palette synthesis failed for {} game colours", colours.len());
            return false;
        }
        self.colour_count = colours.len();
        debug!(
            "canvas ready: {}x{} pixels, {} game colours",
            width,
            height,
            colours.len()
        );
        true
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Begins a frame by redirecting drawing into the canvas.
    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.canvas.start_redirection()
    }

    /// Ends a frame. Any clip left set is dropped first, then
    /// redirection is restored.
    pub fn finish_frame(&mut self) -> Result<(), RenderError> {
        self.clip = None;
        self.canvas.stop_redirection()
    }

    /// Selects the drawing colour. Out-of-range indices are ignored.
    pub fn select_colour(&mut self, colour: i32) {
        if colour >= 0 && (colour as usize) < self.colour_count {
            self.colour = colour as u8;
        }
    }

    /// Restricts drawing to a game-pixel rectangle of the given size.
    pub fn set_clip(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), RenderError> {
        if !self.canvas.is_redirection_active() {
            return Err(RenderError::RedirectionInactive);
        }
        self.clip = Some(PixelClip {
            x0: x,
            y0: y,
            x1: x + width - 1,
            y1: y + height - 1,
        });
        Ok(())
    }

    pub fn clear_clip(&mut self) {
        self.clip = None;
    }

    /// Executes one plot operation at a game-pixel point. A move
    /// action repositions the cursor; a draw action renders from the
    /// cursor using the code's family, then moves the cursor.
    pub fn plot(&mut self, code: PlotCode, x: i32, y: i32) -> Result<(), RenderError> {
        if !self.canvas.is_redirection_active() {
            return Err(RenderError::RedirectionInactive);
        }

        let action = code.bits() & ACTION_MASK;
        if action == ACTION_MOVE {
            self.cursor = (x, y);
            return Ok(());
        }
        if action != ACTION_DRAW {
            warn!("unsupported plot action {:#04x}", action);
            return Ok(());
        }

        let height = self.canvas.size().1;
        let from = to_units(height, self.cursor.0, self.cursor.1);
        let to = to_units(height, x, y);
        let clip = self.clip;
        let colour = self.colour;
        let family = code.bits() & !ACTION_MASK;
        let surface = self.canvas.surface_mut()?;

        if family == PlotCode::SOLID.bits() {
            raster::draw_line(surface, clip, from, to, colour);
        } else if family == PlotCode::RECTANGLE.bits() {
            raster::fill_rect(surface, clip, from, to, colour);
        } else if family == PlotCode::CIRCLE.bits() {
            raster::fill_circle(surface, clip, from, to, colour);
        } else if family == PlotCode::CIRCLE_OUTLINE.bits() {
            raster::outline_circle(surface, clip, from, to, colour);
        } else {
            warn!("unsupported plot family {:#04x}", family);
        }

        self.cursor = (x, y);
        Ok(())
    }

    /// Begins a path at a game-pixel point, discarding any previous
    /// path state.
    pub fn start_path(&mut self, x: i32, y: i32) -> Result<(), RenderError> {
        if !self.canvas.is_redirection_active() {
            return Err(RenderError::RedirectionInactive);
        }
        let height = self.canvas.size().1;
        let (ux, uy) = to_units(height, x, y);
        self.path.start_path(ux, uy);
        Ok(())
    }

    /// Extends the path with a straight segment.
    pub fn add_path_segment(&mut self, x: i32, y: i32) -> Result<(), RenderError> {
        if !self.canvas.is_redirection_active() {
            return Err(RenderError::RedirectionInactive);
        }
        let height = self.canvas.size().1;
        let (ux, uy) = to_units(height, x, y);
        if !self.path.add_line(ux, uy) {
            return Err(RenderError::PathInvalid);
        }
        Ok(())
    }

    /// Terminates and renders the path: filled first (unless `fill` is
    /// -1), then stroked at `width_px` (unless `outline` is -1).
    pub fn end_path(
        &mut self,
        closed: bool,
        width_px: i32,
        outline: i32,
        fill: i32,
    ) -> Result<(), RenderError> {
        if !self.canvas.is_redirection_active() {
            return Err(RenderError::RedirectionInactive);
        }
        if closed {
            self.path.close_subpath();
        }
        if !self.path.end_path() {
            return Err(RenderError::PathInvalid);
        }

        let clip = self.clip;
        let colour_count = self.colour_count;
        let path = &self.path;
        let surface = self.canvas.surface_mut()?;

        if fill >= 0 && (fill as usize) < colour_count {
            path.fill(surface, clip, fill as u8);
        }
        if outline >= 0 && (outline as usize) < colour_count {
            path.stroke(surface, clip, 2 * width_px, outline as u8);
        }
        Ok(())
    }

    /// Draws text anchored at a game-pixel point. Negative alignment
    /// puts the anchor at the text's left or top edge, zero centres,
    /// positive puts it at the right or bottom edge.
    #[allow(clippy::too_many_arguments)]
    pub fn write_text(
        &mut self,
        x: i32,
        y: i32,
        font: FontKind,
        size: i32,
        h_align: i32,
        v_align: i32,
        colour: i32,
        text: &str,
    ) -> Result<(), RenderError> {
        if !self.canvas.is_redirection_active() {
            return Err(RenderError::RedirectionInactive);
        }
        if colour < 0 || colour as usize >= self.colour_count {
            return Ok(());
        }

        let width = font::measure(text, size, font.is_monospaced());
        let height = font::line_height(size);
        let x = match h_align.cmp(&0) {
            std::cmp::Ordering::Less => x,
            std::cmp::Ordering::Equal => x - width / 2,
            std::cmp::Ordering::Greater => x - width,
        };
        let y = match v_align.cmp(&0) {
            std::cmp::Ordering::Less => y,
            std::cmp::Ordering::Equal => y - height / 2,
            std::cmp::Ordering::Greater => y - height,
        };

        let clip = self.clip;
        let surface = self.canvas.surface_mut()?;
        font::draw_text(
            surface,
            clip,
            x,
            y,
            text,
            size,
            font.is_monospaced(),
            colour as u8,
        );
        Ok(())
    }

    /// Asks the host to repaint a game-pixel region. A closed window
    /// is not an error; the request is simply dropped.
    pub fn force_redraw(&mut self, region: GameRect) -> Result<(), RenderError> {
        if !self.host.is_open() {
            return Ok(());
        }
        if let Err(e) = self.host.queue_redraw(region) {
            warn!("redraw request failed: {:#}", e);
        }
        Ok(())
    }

    /// Asks the host to repaint the whole canvas.
    pub fn force_full_redraw(&mut self) -> Result<(), RenderError> {
        let region = GameRect::covering(&self.canvas);
        self.force_redraw(region)
    }

    /// Forwards status text to the host window.
    pub fn status_text(&mut self, text: &str) {
        self.host.set_status_text(text);
    }

    /// Captures the canvas rectangle under a blitter. Requires an
    /// active frame, like every other canvas access.
    pub fn save_blitter(
        &mut self,
        handle: BlitterHandle,
        x: i32,
        y: i32,
    ) -> Result<(), RenderError> {
        if !self.canvas.is_redirection_active() {
            return Err(RenderError::RedirectionInactive);
        }
        let surface = self.canvas.surface()?;
        self.blitters.store(handle, surface, x, y)
    }

    /// Restores a blitter's captured pixels onto the canvas. Requires
    /// an active frame.
    pub fn paint_blitter(
        &mut self,
        handle: BlitterHandle,
        x: i32,
        y: i32,
    ) -> Result<(), RenderError> {
        if !self.canvas.is_redirection_active() {
            return Err(RenderError::RedirectionInactive);
        }
        let surface = self.canvas.surface_mut()?;
        self.blitters.paint(handle, surface, x, y)
    }
}

/// Game pixels to OS units: double the resolution and flip y so the
/// origin moves from top-left to bottom-left.
fn to_units(canvas_height: i32, x: i32, y: i32) -> (i32, i32) {
    (2 * x, 2 * (canvas_height - y))
}

impl<H: HostWindow> DrawingTarget for RenderSession<H> {
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
    ) {
        if let Err(e) = self.write_text(x, y, font, size, h_align, v_align, colour, text) {
            warn!("draw_text failed: {}", e);
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, colour: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.select_colour(colour);
        let result = self
            .plot(PlotCode::MOVE_TO, x, y)
            .and_then(|_| {
                self.plot(
                    PlotCode::RECTANGLE | PlotCode::PLOT_TO,
                    x + width - 1,
                    y + height - 1,
                )
            });
        if let Err(e) = result {
            warn!("draw_rect failed: {}", e);
        }
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: i32) {
        self.select_colour(colour);
        let result = self
            .plot(PlotCode::MOVE_TO, x1, y1)
            .and_then(|_| self.plot(PlotCode::SOLID | PlotCode::PLOT_TO, x2, y2));
        if let Err(e) = result {
            warn!("draw_line failed: {}", e);
        }
    }

    fn draw_polygon(&mut self, points: &[(i32, i32)], fill: i32, outline: i32) {
        let Some(&(x0, y0)) = points.first() else {
            return;
        };
        let result = self.start_path(x0, y0).and_then(|_| {
            for &(x, y) in &points[1..] {
                self.add_path_segment(x, y)?;
            }
            self.end_path(true, 1, outline, fill)
        });
        if let Err(e) = result {
            warn!("draw_polygon failed: {}", e);
        }
    }

    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, fill: i32, outline: i32) {
        let mut result = self.plot(PlotCode::MOVE_TO, cx, cy);
        if result.is_ok() && fill != -1 {
            self.select_colour(fill);
            result = self.plot(PlotCode::CIRCLE | PlotCode::PLOT_TO, cx + radius, cy);
        }
        if result.is_ok() {
            self.select_colour(outline);
            result = self.plot(
                PlotCode::CIRCLE_OUTLINE | PlotCode::PLOT_TO,
                cx + radius,
                cy,
            );
        }
        if let Err(e) = result {
            warn!("draw_circle failed: {}", e);
        }
    }

    fn draw_update(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        let region = GameRect {
            x0: x,
            y0: y,
            x1: x + width - 1,
            y1: y + height - 1,
        };
        if let Err(e) = self.force_redraw(region) {
            warn!("draw_update failed: {}", e);
        }
    }

    fn clip(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if let Err(e) = self.set_clip(x, y, width, height) {
            warn!("clip failed: {}", e);
        }
    }

    fn unclip(&mut self) {
        self.clear_clip();
    }

    fn start_draw(&mut self) {
        if let Err(e) = self.begin_frame() {
            warn!("start_draw failed: {}", e);
        }
    }

    fn end_draw(&mut self) {
        if let Err(e) = self.finish_frame() {
            warn!("end_draw failed: {}", e);
        }
    }

    fn status_bar(&mut self, text: &str) {
        self.status_text(text);
    }

    fn blitter_new(&mut self, width: i32, height: i32) -> Option<BlitterHandle> {
        blitter::create_logged(&mut self.blitters, width, height)
    }

    fn blitter_free(&mut self, handle: BlitterHandle) {
        if let Err(e) = self.blitters.delete(handle) {
            warn!("blitter_free failed: {}", e);
        }
    }

    fn blitter_save(&mut self, handle: BlitterHandle, x: i32, y: i32) {
        if let Err(e) = self.save_blitter(handle, x, y) {
            warn!("blitter_save failed: {}", e);
        }
    }

    fn blitter_load(&mut self, handle: BlitterHandle, x: i32, y: i32) {
        if let Err(e) = self.paint_blitter(handle, x, y) {
            warn!("blitter_load failed: {}", e);
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessHost;

    const COLOURS: [[f32; 3]; 4] = [
        [1.0, 1.0, 1.0],
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
    ];

    fn session() -> RenderSession<HeadlessHost> {
        let config = RenderConfig::default();
        let mut session = RenderSession::new(HeadlessHost::new(), &config);
        assert!(session.create_canvas(32, 32, &COLOURS, &config));
        session
    }

    #[test]
    fn test_plot_requires_active_frame() {
        // Contract: drawing outside begin_frame/finish_frame is the
        // caller's bug and is reported, not silently absorbed.
        let mut session = session();
        assert!(matches!(
            session.plot(PlotCode::MOVE_TO, 0, 0),
            Err(RenderError::RedirectionInactive)
        ));
    }

    #[test]
    fn test_move_then_draw_line() {
        let mut session = session();
        session.begin_frame().unwrap();
        session.select_colour(2);
        session.plot(PlotCode::MOVE_TO, 4, 10).unwrap();
        session
            .plot(PlotCode::SOLID | PlotCode::PLOT_TO, 20, 10)
            .unwrap();
        session.finish_frame().unwrap();

        let surface = session.canvas().surface().unwrap();
        assert_eq!(surface.pixel(4, 10), 2);
        assert_eq!(surface.pixel(20, 10), 2);
        assert_eq!(surface.pixel(21, 10), 0);
    }

    #[test]
    fn test_rectangle_plot_fills_inclusive_box() {
        let mut session = session();
        session.begin_frame().unwrap();
        session.select_colour(3);
        session.plot(PlotCode::MOVE_TO, 2, 2).unwrap();
        session
            .plot(PlotCode::RECTANGLE | PlotCode::PLOT_TO, 6, 5)
            .unwrap();
        session.finish_frame().unwrap();

        let surface = session.canvas().surface().unwrap();
        assert_eq!(surface.pixel(2, 2), 3);
        assert_eq!(surface.pixel(6, 5), 3);
        assert_eq!(surface.pixel(7, 5), 0);
    }

    #[test]
    fn test_out_of_range_colour_is_ignored() {
        let mut session = session();
        session.begin_frame().unwrap();
        session.select_colour(1);
        session.select_colour(99);
        session.select_colour(-1);
        session.plot(PlotCode::MOVE_TO, 0, 0).unwrap();
        session
            .plot(PlotCode::SOLID | PlotCode::PLOT_TO, 3, 0)
            .unwrap();
        session.finish_frame().unwrap();

        assert_eq!(session.canvas().surface().unwrap().pixel(1, 0), 1);
    }

    #[test]
    fn test_finish_frame_drops_clip() {
        let mut session = session();
        session.begin_frame().unwrap();
        session.set_clip(0, 0, 4, 4).unwrap();
        session.finish_frame().unwrap();

        session.begin_frame().unwrap();
        session.select_colour(2);
        session.plot(PlotCode::MOVE_TO, 10, 10).unwrap();
        session
            .plot(PlotCode::RECTANGLE | PlotCode::PLOT_TO, 12, 12)
            .unwrap();
        session.finish_frame().unwrap();

        assert_eq!(session.canvas().surface().unwrap().pixel(11, 11), 2);
    }

    #[test]
    fn test_clip_restricts_drawing() {
        let mut session = session();
        session.begin_frame().unwrap();
        session.set_clip(0, 0, 8, 8).unwrap();
        session.select_colour(2);
        session.plot(PlotCode::MOVE_TO, 0, 0).unwrap();
        session
            .plot(PlotCode::RECTANGLE | PlotCode::PLOT_TO, 31, 31)
            .unwrap();
        session.finish_frame().unwrap();

        let surface = session.canvas().surface().unwrap();
        assert_eq!(surface.pixel(7, 7), 2);
        assert_eq!(surface.pixel(8, 7), 0);
        assert_eq!(surface.pixel(7, 8), 0);
    }

    #[test]
    fn test_filled_circle_plot() {
        let mut session = session();
        session.begin_frame().unwrap();
        session.select_colour(3);
        session.plot(PlotCode::MOVE_TO, 16, 16).unwrap();
        session
            .plot(PlotCode::CIRCLE | PlotCode::PLOT_TO, 21, 16)
            .unwrap();
        session.finish_frame().unwrap();

        let surface = session.canvas().surface().unwrap();
        assert_eq!(surface.pixel(16, 16), 3);
        assert_eq!(surface.pixel(19, 16), 3);
        assert_eq!(surface.pixel(16, 26), 0);
    }

    #[test]
    fn test_path_fill_and_outline() {
        let mut session = session();
        session.begin_frame().unwrap();
        session.start_path(4, 4).unwrap();
        session.add_path_segment(20, 4).unwrap();
        session.add_path_segment(20, 20).unwrap();
        session.add_path_segment(4, 20).unwrap();
        session.end_path(true, 1, 1, 2).unwrap();
        session.finish_frame().unwrap();

        let surface = session.canvas().surface().unwrap();
        // Interior takes the fill colour, the edge the outline colour.
        assert_eq!(surface.pixel(12, 12), 2);
        assert_eq!(surface.pixel(4, 12), 1);
    }

    #[test]
    fn test_path_overflow_reported_and_recoverable() {
        let config = RenderConfig::from_json(r#"{"path": {"buffer_words": 8}}"#).unwrap();
        let mut session = RenderSession::new(HeadlessHost::new(), &config);
        assert!(session.create_canvas(32, 32, &COLOURS, &config));

        session.begin_frame().unwrap();
        session.start_path(0, 0).unwrap();
        session.add_path_segment(10, 0).unwrap();
        assert!(matches!(
            session.add_path_segment(10, 10), // overflow
            Err(RenderError::PathInvalid)
        ));
        assert!(matches!(
            session.end_path(false, 1, 1, -1),
            Err(RenderError::PathInvalid)
        ));

        // A fresh start_path recovers.
        session.start_path(0, 16).unwrap();
        session.add_path_segment(10, 16).unwrap();
        assert!(session.end_path(false, 1, 1, -1).is_ok());
        session.finish_frame().unwrap();
    }

    #[test]
    fn test_force_redraw_on_closed_window_is_ok() {
        let mut session = session();
        session.host_mut().set_open(false);
        assert!(session.force_full_redraw().is_ok());
        assert!(session.host().redraws().is_empty());

        session.host_mut().set_open(true);
        session.force_full_redraw().unwrap();
        assert_eq!(
            session.host().redraws(),
            &[GameRect { x0: 0, y0: 0, x1: 31, y1: 31 }]
        );
    }

    #[test]
    fn test_drawing_target_rect_and_update() {
        let mut session = session();
        session.start_draw();
        session.draw_rect(5, 5, 4, 3, 2);
        session.draw_update(5, 5, 4, 3);
        session.end_draw();

        let expected = GameRect { x0: 5, y0: 5, x1: 8, y1: 7 };
        assert_eq!(session.host().redraws(), &[expected]);
        let surface = session.canvas().surface().unwrap();
        assert_eq!(surface.pixel(5, 5), 2);
        assert_eq!(surface.pixel(8, 7), 2);
        assert_eq!(surface.pixel(9, 7), 0);
    }

    #[test]
    fn test_blitter_ops_require_active_frame() {
        // Contract: blitter store and paint touch the canvas, so like
        // every other canvas access they only run inside a frame.
        let mut session = session();
        session.start_draw();
        session.draw_rect(20, 20, 4, 4, 2);
        session.end_draw();
        let handle = session.blitter_new(4, 4).unwrap();

        assert!(matches!(
            session.save_blitter(handle, 20, 20),
            Err(RenderError::RedirectionInactive)
        ));

        session.start_draw();
        session.save_blitter(handle, 20, 20).unwrap();
        session.end_draw();

        assert!(matches!(
            session.paint_blitter(handle, 0, 0),
            Err(RenderError::RedirectionInactive)
        ));
        // The best-effort interface drops the calls the same way.
        session.blitter_save(handle, 0, 0);
        session.blitter_load(handle, 0, 0);

        let surface = session.canvas().surface().unwrap();
        assert_eq!(surface.pixel(0, 0), 0);
        assert_eq!(surface.pixel(21, 21), 2);
    }

    #[test]
    fn test_clip_and_path_require_active_frame() {
        let mut session = session();
        assert!(matches!(
            session.set_clip(0, 0, 4, 4),
            Err(RenderError::RedirectionInactive)
        ));
        assert!(matches!(
            session.start_path(0, 0),
            Err(RenderError::RedirectionInactive)
        ));
        assert!(matches!(
            session.add_path_segment(4, 4),
            Err(RenderError::RedirectionInactive)
        ));
    }

    #[test]
    fn test_blitter_round_trip_through_target() {
        let mut session = session();
        session.start_draw();
        session.draw_rect(0, 0, 8, 8, 2);
        let handle = session.blitter_new(4, 4).unwrap();
        session.blitter_save(handle, 2, 2);
        session.draw_rect(0, 0, 8, 8, 3);
        session.blitter_load(handle, -1, -1);
        session.end_draw();

        let surface = session.canvas().surface().unwrap();
        assert_eq!(surface.pixel(2, 2), 2);
        assert_eq!(surface.pixel(5, 5), 2);
        assert_eq!(surface.pixel(6, 6), 3);
        session.blitter_free(handle);
    }
}
