//! Layered tile canvas editing: painting, selection, history, compositing
//! and file I/O without any UI.

pub mod adjust;
pub mod brush;
pub mod canvas;
pub mod color;
pub mod composite;
pub mod compress;
pub mod config;
pub mod dither;
pub mod error;
pub mod history;
pub mod input;
pub mod io;
pub mod layer;
pub mod palette;
pub mod selection;
pub mod shapes;
pub mod transform;


pub use brush::Brush;
pub use canvas::Canvas;
pub use color::Color;
pub use config::EditorConfig;
pub use error::{CanvasError, CanvasResult};
pub use input::{Tool, ToolState};
pub use layer::{Layer, LayerStack};
pub use palette::Palette;
pub use selection::{SelectMode, Selection};
pub use transform::{CenterAxis, Transform};
