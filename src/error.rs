// src/error.rs

//! Typed errors for violations of the rendering protocol.

use thiserror::Error;

/// A misuse of the rendering protocol or an unusable resource. These
/// are caller bugs or unrecoverable states, not transient failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// `start_redirection` while output was already redirected.
    #[error("drawing output is already redirected")]
    RedirectionActive,

    /// A drawing or `stop_redirection` call outside an active frame.
    #[error("drawing output is not redirected")]
    RedirectionInactive,

    /// The canvas surface was never configured, or configuration
    /// failed.
    #[error("no sprite surface is configured")]
    NoSurface,

    /// Redirection was requested before the save area existed.
    #[error("no redirection save area is configured")]
    NoSaveArea,

    /// A palette operation on a surface created without one.
    #[error("the surface has no palette")]
    NoPalette,

    /// A surface was requested with a non-positive dimension.
    #[error("bad surface dimensions {0}x{1}")]
    BadDimensions(i32, i32),

    /// A blitter handle that was never issued or was already freed.
    #[error("unknown or freed blitter handle")]
    UnknownBlitter,

    /// A blitter paint before any store recorded its pixels.
    #[error("blitter painted before it was stored")]
    BlitterUnpopulated,

    /// A path draw after the path overflowed its buffer.
    #[error("path is invalid after overflowing its buffer")]
    PathInvalid,
}
