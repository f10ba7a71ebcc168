use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::CanvasResult;

const MAX_LAYERS: usize = 64;
const MAX_HISTORY: usize = 256;
const CHECKER_LIGHT: Color = Color::rgb(204, 204, 204);
const CHECKER_DARK: Color = Color::rgb(153, 153, 153);

/// Per-canvas editor settings. Missing JSON fields fall back to defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub max_layers: usize,
    pub max_history: usize,
    /// RLE-compress layers when they are hidden or their opacity hits zero.
    pub compress_hidden_layers: bool,
    pub checker_light: Color,
    pub checker_dark: Color,
    pub default_threshold: u8,
    pub brush_size: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_layers: MAX_LAYERS,
            max_history: MAX_HISTORY,
            compress_hidden_layers: true,
            checker_light: CHECKER_LIGHT,
            checker_dark: CHECKER_DARK,
            default_threshold: 0,
            brush_size: 1,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let config: EditorConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> CanvasResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn sanitized(mut self) -> Self {
        if self.max_layers == 0 {
            log::warn!("max_layers of 0 is unusable, using 1");
            self.max_layers = 1;
        }
        if self.max_history == 0 {
            log::warn!("max_history of 0 is unusable, using 1");
            self.max_history = 1;
        }
        self.default_threshold = self.default_threshold.min(100);
        self
    }
}
