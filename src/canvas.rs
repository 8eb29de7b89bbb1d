// src/canvas.rs

//! The off-screen canvas: an indexed-colour sprite surface plus the
//! palette and redirection state that drawing runs against.
//!
//! A canvas starts inert (zero-size, no surface). `configure_area`
//! allocates the surface; every later operation degrades safely when
//! configuration failed, so callers can treat setup as best-effort.

use std::path::Path;

use log::{debug, warn};

use crate::color::Rgb;
use crate::config::PaletteConfig;
use crate::error::RenderError;
use crate::palette::{Palette, PALETTE_ENTRIES};
use crate::sprite::SpriteArea;

/// Bytes reserved alongside the save row for the redirected output
/// context.
const SAVE_CONTEXT_BYTES: usize = 16;

/// Scale factors and colour translation needed to paint the canvas
/// into a true-colour frame.
pub struct RedrawContext {
    /// Pixel scale from canvas pixels to OS units, per axis.
    pub scale: (i32, i32),
    /// Palette index to RGBA bytes.
    pub table: [[u8; 4]; PALETTE_ENTRIES],
}

#[derive(Debug, Default)]
pub struct Canvas {
    size: (i32, i32),
    area: Option<SpriteArea>,
    save_area: Option<Vec<u8>>,
    redirection_active: bool,
}

impl Canvas {
    pub fn new() -> Self {
        Canvas::default()
    }

    /// The configured canvas size in pixels, (0, 0) while inert.
    pub fn size(&self) -> (i32, i32) {
        self.size
    }

    /// Allocates the sprite surface. On failure the canvas is left
    /// inert and false is returned.
    pub fn configure_area(&mut self, width: i32, height: i32, with_palette: bool) -> bool {
        self.size = (0, 0);
        self.area = None;
        self.save_area = None;
        self.redirection_active = false;

        match SpriteArea::new(width, height, with_palette) {
            Ok(area) => {
                debug!("canvas surface configured at {}x{}", width, height);
                self.size = (width, height);
                self.area = Some(area);
                true
            }
            Err(e) => {
                warn!("canvas surface configuration failed: {}", e);
                false
            }
        }
    }

    /// Allocates the save area used while output is redirected. The
    /// surface must already be configured.
    pub fn configure_save_area(&mut self) -> bool {
        let Some(area) = &self.area else {
            warn!("cannot configure a save area without a surface");
            return false;
        };
        // The zeroed head word marks the save area as unused.
        self.save_area = Some(vec![0u8; area.row_bytes() + SAVE_CONTEXT_BYTES]);
        true
    }

    /// Rebuilds the surface palette from the game's colour list.
    /// Returns false if the surface has no palette or synthesis did
    /// not define every entry.
    pub fn set_game_colours(&mut self, colours: &[[f32; 3]], config: &PaletteConfig) -> bool {
        let Some(area) = &mut self.area else {
            warn!("cannot set colours before the surface is configured");
            return false;
        };
        let Some(palette) = area.palette_mut() else {
            warn!("cannot set colours on a surface without a palette");
            return false;
        };
        palette.configure(colours, config)
    }

    /// Looks up a palette entry; black when the canvas has no palette.
    pub fn palette_entry(&self, index: i32) -> Rgb {
        self.area
            .as_ref()
            .and_then(SpriteArea::palette)
            .map(|palette| palette.entry(index))
            .unwrap_or(Rgb::BLACK)
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.area.as_ref().and_then(SpriteArea::palette)
    }

    /// Whether drawing is currently redirected into the surface. True
    /// only with a surface, a save area, and an active redirection.
    pub fn is_redirection_active(&self) -> bool {
        self.area.is_some() && self.save_area.is_some() && self.redirection_active
    }

    /// Switches drawing output into the sprite surface. Redirection
    /// does not nest.
    pub fn start_redirection(&mut self) -> Result<(), RenderError> {
        if self.redirection_active {
            return Err(RenderError::RedirectionActive);
        }
        if self.area.is_none() {
            return Err(RenderError::NoSurface);
        }
        if self.save_area.is_none() {
            return Err(RenderError::NoSaveArea);
        }
        self.redirection_active = true;
        Ok(())
    }

    /// Restores normal output after `start_redirection`.
    pub fn stop_redirection(&mut self) -> Result<(), RenderError> {
        if !self.redirection_active {
            return Err(RenderError::RedirectionInactive);
        }
        self.redirection_active = false;
        Ok(())
    }

    pub fn surface(&self) -> Result<&SpriteArea, RenderError> {
        self.area.as_ref().ok_or(RenderError::NoSurface)
    }

    pub fn surface_mut(&mut self) -> Result<&mut SpriteArea, RenderError> {
        self.area.as_mut().ok_or(RenderError::NoSurface)
    }

    /// Builds the scale factors and colour table needed to paint the
    /// canvas into a true-colour frame. None while unconfigured.
    pub fn prepare_redraw(&self) -> Option<RedrawContext> {
        let area = self.area.as_ref()?;
        let mut table = [[0u8, 0, 0, 0xFF]; PALETTE_ENTRIES];
        if let Some(palette) = area.palette() {
            for (index, rgba) in table.iter_mut().enumerate() {
                let entry = palette.entry(index as i32);
                *rgba = [entry.r, entry.g, entry.b, 0xFF];
            }
        }
        // One canvas pixel covers two OS units on each axis.
        Some(RedrawContext { scale: (2, 2), table })
    }

    /// Paints the canvas into an RGBA frame at the given pixel origin.
    /// Out-of-frame regions are clipped; an unconfigured canvas paints
    /// nothing.
    pub fn redraw_into(&self, frame: &mut [u8], frame_width: usize, origin: (i32, i32)) {
        let Some(area) = &self.area else {
            return;
        };
        let Some(context) = self.prepare_redraw() else {
            return;
        };
        if frame_width == 0 {
            return;
        }
        let frame_height = frame.len() / (frame_width * 4);

        for row in 0..area.height() {
            let fy = origin.1 + row;
            if fy < 0 || fy as usize >= frame_height {
                continue;
            }
            for col in 0..area.width() {
                let fx = origin.0 + col;
                if fx < 0 || fx as usize >= frame_width {
                    continue;
                }
                let rgba = context.table[area.pixel(col, row) as usize];
                let offset = (fy as usize * frame_width + fx as usize) * 4;
                frame[offset..offset + 4].copy_from_slice(&rgba);
            }
        }
    }

    /// Copies pixels from another surface into this canvas, placing
    /// this canvas's top-left at (x, y) of the source.
    pub fn capture_from_surface(&mut self, source: &SpriteArea, x: i32, y: i32) -> bool {
        let Some(area) = &mut self.area else {
            return false;
        };
        area.copy_rect_from(source, x, y);
        true
    }

    /// Copies this canvas's pixels onto another surface at (x, y).
    pub fn paint_to_surface(&self, target: &mut SpriteArea, x: i32, y: i32) -> bool {
        let Some(area) = &self.area else {
            return false;
        };
        area.copy_rect_to(target, x, y);
        true
    }

    /// Writes the canvas out as a sprite file. Failures are logged,
    /// never fatal.
    pub fn save_to_file(&self, path: &Path) {
        match &self.area {
            Some(area) => area.write_to_file(path),
            None => warn!("nothing to save: canvas has no surface"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaletteConfig;

    fn configured_canvas() -> Canvas {
        let mut canvas = Canvas::new();
        assert!(canvas.configure_area(8, 8, true));
        assert!(canvas.configure_save_area());
        canvas
    }

    #[test]
    fn test_inert_canvas_degrades_safely() {
        // Contract: every operation on an unconfigured canvas is a
        // safe no-op, not a panic.
        let mut canvas = Canvas::new();
        assert_eq!(canvas.size(), (0, 0));
        assert!(!canvas.is_redirection_active());
        assert_eq!(canvas.palette_entry(0), Rgb::BLACK);
        assert!(canvas.prepare_redraw().is_none());
        assert!(!canvas.set_game_colours(&[[1.0, 0.0, 0.0]], &PaletteConfig::default()));
        assert!(matches!(
            canvas.start_redirection(),
            Err(RenderError::NoSurface)
        ));
        assert!(canvas.surface().is_err());
    }

    #[test]
    fn test_bad_dimensions_leave_canvas_inert() {
        let mut canvas = Canvas::new();
        assert!(!canvas.configure_area(0, 8, true));
        assert_eq!(canvas.size(), (0, 0));
        assert!(canvas.surface().is_err());
    }

    #[test]
    fn test_redirection_requires_save_area() {
        let mut canvas = Canvas::new();
        assert!(canvas.configure_area(8, 8, true));
        assert!(matches!(
            canvas.start_redirection(),
            Err(RenderError::NoSaveArea)
        ));
    }

    #[test]
    fn test_redirection_does_not_nest() {
        let mut canvas = configured_canvas();
        assert!(canvas.start_redirection().is_ok());
        assert!(canvas.is_redirection_active());
        assert!(matches!(
            canvas.start_redirection(),
            Err(RenderError::RedirectionActive)
        ));
        assert!(canvas.stop_redirection().is_ok());
        assert!(!canvas.is_redirection_active());
        assert!(matches!(
            canvas.stop_redirection(),
            Err(RenderError::RedirectionInactive)
        ));
    }

    #[test]
    fn test_reconfigure_resets_redirection() {
        let mut canvas = configured_canvas();
        canvas.start_redirection().unwrap();
        assert!(canvas.configure_area(4, 4, true));
        assert!(!canvas.is_redirection_active());
        // The save area does not survive reconfiguration.
        assert!(matches!(
            canvas.start_redirection(),
            Err(RenderError::NoSaveArea)
        ));
    }

    #[test]
    fn test_game_colours_define_full_palette() {
        let mut canvas = configured_canvas();
        let colours = [[1.0, 1.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(canvas.set_game_colours(&colours, &PaletteConfig::default()));
        assert_eq!(canvas.palette_entry(1), Rgb { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn test_redraw_paints_frame() {
        let mut canvas = configured_canvas();
        let colours = [[1.0, 1.0, 1.0], [1.0, 0.0, 0.0]];
        assert!(canvas.set_game_colours(&colours, &PaletteConfig::default()));
        canvas.surface_mut().unwrap().set_pixel(2, 3, 1);

        let mut frame = vec![0u8; 8 * 8 * 4];
        canvas.redraw_into(&mut frame, 8, (0, 0));

        let offset = (3 * 8 + 2) * 4;
        assert_eq!(&frame[offset..offset + 4], &[255, 0, 0, 0xFF]);
        // An untouched canvas pixel paints palette entry 0.
        let entry0 = canvas.palette_entry(0);
        assert_eq!(&frame[..4], &[entry0.r, entry0.g, entry0.b, 0xFF]);
    }

    #[test]
    fn test_redraw_clips_to_frame() {
        let mut canvas = configured_canvas();
        let mut frame = vec![0u8; 4 * 4 * 4];
        // Must not panic or write out of bounds.
        canvas.redraw_into(&mut frame, 4, (-2, -2));
        canvas.redraw_into(&mut frame, 4, (3, 3));
    }
}
