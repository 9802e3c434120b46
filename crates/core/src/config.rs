use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::DEFAULT_PAGE_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Geometry and paging for a history view.
///
/// Units are whatever the renderer draws in: logical pixels for SVG/GUI,
/// terminal cells for the TUI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Commits fetched per request.
    pub page_size: usize,
    pub row_height: f64,
    /// Horizontal distance between lane columns.
    pub lane_width: f64,
    /// X offset of the row text. `0` places it right after the widest lane.
    pub text_offset: f64,
    /// Lane accent colors to cycle through.
    pub palette_size: u8,
    pub node_radius: f64,
    pub font_size: f64,
    /// Advance per character when laying out row text.
    pub char_width: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            row_height: 48.0,
            lane_width: 16.0,
            text_offset: 0.0,
            palette_size: lanegraph_protocol::LANE_PALETTE_SIZE,
            node_radius: 4.0,
            font_size: 12.0,
            char_width: 7.0,
        }
    }
}

impl GraphConfig {
    /// Layout for a character grid: one row per line, two cells per lane.
    pub fn terminal() -> Self {
        Self {
            row_height: 1.0,
            lane_width: 2.0,
            node_radius: 0.5,
            font_size: 1.0,
            char_width: 1.0,
            ..Self::default()
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1"));
        }
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(ConfigError::Invalid("row_height must be positive"));
        }
        if !(self.lane_width.is_finite() && self.lane_width > 0.0) {
            return Err(ConfigError::Invalid("lane_width must be positive"));
        }
        if self.palette_size == 0 || self.palette_size > lanegraph_protocol::LANE_PALETTE_SIZE {
            return Err(ConfigError::Invalid("palette_size out of range"));
        }
        Ok(())
    }
}
