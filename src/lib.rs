// src/lib.rs

//! Off-screen indexed-colour rendering for puzzle frontends.
//!
//! The crate builds an 8-bit sprite canvas, synthesises a full
//! 256-entry palette around a game's colour list so antialiased
//! drawing has gradient entries to land on, and exposes a
//! [`DrawingTarget`] a puzzle backend can render through. The host
//! window behind the canvas is abstracted by [`HostWindow`], with
//! [`HeadlessHost`] available for tests and offline rendering.

pub mod blitter;
pub mod canvas;
pub mod color;
pub mod config;
pub mod drawing;
pub mod error;
pub mod font;
pub mod host;
pub mod palette;
pub mod path;
pub mod raster;
pub mod session;
pub mod sprite;

pub use blitter::{BlitterHandle, BlitterSet, BLITTER_FROM_SAVED};
pub use canvas::{Canvas, RedrawContext};
pub use color::Rgb;
pub use config::{PaletteConfig, PathConfig, RenderConfig};
pub use drawing::{DrawingTarget, FontKind};
pub use error::RenderError;
pub use host::{GameRect, HeadlessHost, HostWindow};
pub use palette::{Palette, PALETTE_ENTRIES};
pub use path::PathBuilder;
pub use raster::PixelClip;
pub use session::{PlotCode, RenderSession};
pub use sprite::SpriteArea;
