// src/host.rs

//! The seam between the renderer and whatever windowing system hosts
//! it. The session only ever needs to know whether a window exists,
//! to invalidate a region of it, and to update its status text.

use crate::canvas::Canvas;
use crate::raster;

/// A rectangle in game pixels, inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl GameRect {
    /// The whole canvas of the given size.
    pub fn covering(canvas: &Canvas) -> GameRect {
        let (width, height) = canvas.size();
        GameRect {
            x0: 0,
            y0: 0,
            x1: (width - 1).max(0),
            y1: (height - 1).max(0),
        }
    }

    /// The rectangle's corners in OS units, for redraw bounding boxes.
    pub fn to_units(self, canvas_height: i32) -> ((i32, i32), (i32, i32)) {
        (
            raster::pixel_to_unit(canvas_height, self.x0, self.y1),
            raster::pixel_to_unit(canvas_height, self.x1, self.y0),
        )
    }
}

/// What the renderer asks of the window that displays it.
pub trait HostWindow {
    /// False once the window has been closed; redraw requests are
    /// silently dropped at that point.
    fn is_open(&self) -> bool;

    /// Asks the host to repaint a region of the canvas.
    fn queue_redraw(&mut self, region: GameRect) -> anyhow::Result<()>;

    /// Replaces the status bar text.
    fn set_status_text(&mut self, text: &str);
}

/// An in-memory host for tests and headless rendering. Records every
/// redraw request and the latest status text.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    open: bool,
    redraws: Vec<GameRect>,
    status: String,
}

impl HeadlessHost {
    pub fn new() -> Self {
        HeadlessHost {
            open: true,
            redraws: Vec::new(),
            status: String::new(),
        }
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn redraws(&self) -> &[GameRect] {
        &self.redraws
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

impl HostWindow for HeadlessHost {
    fn is_open(&self) -> bool {
        self.open
    }

    fn queue_redraw(&mut self, region: GameRect) -> anyhow::Result<()> {
        if !self.open {
            anyhow::bail!("redraw queued on a closed window");
        }
        self.redraws.push(region);
        Ok(())
    }

    fn set_status_text(&mut self, text: &str) {
        self.status = text.to_owned();
    }
}
