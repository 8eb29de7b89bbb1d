// src/blitter.rs

//! Blitters: small off-screen rectangles a game captures from the
//! canvas and pastes back later, typically to animate a drag.
//!
//! Blitters live in an arena keyed by opaque handles, so a stale
//! handle after deletion is an error rather than a dangling pointer.

use anyhow::Context;
use log::{trace, warn};

use crate::canvas::Canvas;
use crate::error::RenderError;
use crate::sprite::SpriteArea;

/// Opaque handle to a blitter in a [`BlitterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlitterHandle(usize);

/// Passing this as a paint coordinate reuses the coordinate recorded
/// by the matching save, per axis.
pub const BLITTER_FROM_SAVED: i32 = -1;

#[derive(Debug)]
struct Blitter {
    canvas: Canvas,
    position: (i32, i32),
    populated: bool,
}

/// The arena of live blitters.
#[derive(Debug, Default)]
pub struct BlitterSet {
    slots: Vec<Option<Blitter>>,
}

impl BlitterSet {
    pub fn new() -> Self {
        BlitterSet::default()
    }

    /// Allocates a blitter of the given pixel size. Slots freed by
    /// `delete` are reused before the arena grows.
    pub fn create(&mut self, width: i32, height: i32) -> anyhow::Result<BlitterHandle> {
        let mut canvas = Canvas::new();
        if !canvas.configure_area(width, height, false) {
            anyhow::bail!("blitter surface allocation failed at {}x{}", width, height);
        }
        if !canvas.configure_save_area() {
            anyhow::bail!("blitter save area allocation failed");
        }

        let blitter = Blitter {
            canvas,
            position: (0, 0),
            populated: false,
        };

        let slot = match self.slots.iter().position(Option::is_none) {
            Some(free) => {
                self.slots[free] = Some(blitter);
                free
            }
            None => {
                self.slots.push(Some(blitter));
                self.slots.len() - 1
            }
        };
        trace!("blitter {} created at {}x{}", slot, width, height);
        Ok(BlitterHandle(slot))
    }

    /// Releases a blitter. The handle must be live.
    pub fn delete(&mut self, handle: BlitterHandle) -> Result<(), RenderError> {
        match self.slots.get_mut(handle.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                trace!("blitter {} deleted", handle.0);
                Ok(())
            }
            _ => Err(RenderError::UnknownBlitter),
        }
    }

    /// Captures the blitter-sized rectangle of `source` whose top-left
    /// is (x, y), recording the position for a later sentinel paint.
    pub fn store(
        &mut self,
        handle: BlitterHandle,
        source: &SpriteArea,
        x: i32,
        y: i32,
    ) -> Result<(), RenderError> {
        let blitter = self.get_mut(handle)?;
        blitter.position = (x, y);
        blitter.canvas.capture_from_surface(source, x, y);
        blitter.populated = true;
        Ok(())
    }

    /// Paints the stored pixels back onto `target` at (x, y). Either
    /// coordinate may be [`BLITTER_FROM_SAVED`] to reuse the position
    /// recorded by `store`.
    pub fn paint(
        &self,
        handle: BlitterHandle,
        target: &mut SpriteArea,
        x: i32,
        y: i32,
    ) -> Result<(), RenderError> {
        let blitter = self.get(handle)?;
        if !blitter.populated {
            warn!("paint of a blitter that was never stored");
            return Err(RenderError::BlitterUnpopulated);
        }
        let x = if x == BLITTER_FROM_SAVED { blitter.position.0 } else { x };
        let y = if y == BLITTER_FROM_SAVED { blitter.position.1 } else { y };
        blitter.canvas.paint_to_surface(target, x, y);
        Ok(())
    }

    pub fn size_of(&self, handle: BlitterHandle) -> Result<(i32, i32), RenderError> {
        Ok(self.get(handle)?.canvas.size())
    }

    fn get(&self, handle: BlitterHandle) -> Result<&Blitter, RenderError> {
        self.slots
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or(RenderError::UnknownBlitter)
    }

    fn get_mut(&mut self, handle: BlitterHandle) -> Result<&mut Blitter, RenderError> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(RenderError::UnknownBlitter)
    }
}

/// Creates a blitter and logs the failure path, matching the
/// best-effort contract of the drawing interface.
pub fn create_logged(set: &mut BlitterSet, width: i32, height: i32) -> Option<BlitterHandle> {
    match set.create(width, height).context("blitter creation") {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("{:#}", e);
            None
        }
    }
}
