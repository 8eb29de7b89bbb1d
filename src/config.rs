// src/config.rs

//! Defines the configuration structures for the rendering core.
//!
//! The defaults reproduce the tuning the puzzle frontend has always
//! shipped with; a host may override them by deserializing a JSON
//! document into [`RenderConfig`].

use serde::{Deserialize, Serialize};

/// Complete configuration for a rendering session.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RenderConfig {
    /// Palette synthesis settings.
    pub palette: PaletteConfig,
    /// Vector path settings.
    pub path: PathConfig,
}

impl RenderConfig {
    /// Parses a configuration from a JSON document, applying defaults
    /// for any missing fields.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Settings controlling palette synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Maximum per-channel error, in percent, below which a gradient
    /// candidate is considered a duplicate of an existing entry.
    pub max_error_percent: u32,
    /// Number of intermediate points in the black-to-white gradient.
    pub mono_gradient_steps: usize,
    /// Number of intermediate points in each pairwise colour gradient.
    pub pair_gradient_steps: usize,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            max_error_percent: 5,
            mono_gradient_steps: 10,
            pair_gradient_steps: 5,
        }
    }
}

/// Settings controlling the vector path accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Capacity of the path buffer, in 32-bit words.
    pub buffer_words: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self { buffer_words: 256 }
    }
}
