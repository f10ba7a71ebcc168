use crate::brush::Brush;
use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::CanvasResult;
use crate::selection::SelectMode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Fill,
    MagicWand,
    Picker,
}

/// Pointer-driven tool state. Owned by the caller and passed alongside the
/// canvas it edits.
pub struct ToolState {
    pub tool: Tool,
    pub drawing: bool,
    pub last_pos: Option<(f32, f32)>,
    pub brush: Brush,
    pub secondary: Color,
    pub threshold: u8,
    pub pressure: f32,
    pub select_mode: SelectMode,
}

impl ToolState {
    pub fn new(brush: Brush) -> Self {
        Self {
            tool: Tool::Brush,
            drawing: false,
            last_pos: None,
            brush,
            secondary: Color::WHITE,
            threshold: 0,
            pressure: 0.0,
            select_mode: SelectMode::Replace,
        }
    }

    /// Tool state seeded from a canvas's editor settings.
    pub fn for_canvas(canvas: &Canvas) -> Self {
        let mut state = Self::new(Brush::new(canvas.config().brush_size, Color::BLACK));
        state.threshold = canvas.config().default_threshold;
        state
    }

    /// Pointer down. `alt` is the alternate button: erase for strokes, the
    /// secondary color for fill and picker.
    pub fn press(&mut self, canvas: &mut Canvas, pos: (f32, f32), alt: bool) -> CanvasResult<()> {
        let tile = (pos.0.floor() as i32, pos.1.floor() as i32);
        match self.tool {
            Tool::Brush | Tool::Eraser => {
                self.drawing = true;
                self.last_pos = Some(pos);
                self.paint(canvas, pos, pos, alt)?;
            }
            Tool::Fill => {
                let color = if alt { self.secondary } else { self.brush.color };
                if canvas.fill(tile, color, self.threshold)? > 0 {
                    canvas.commit()?;
                }
            }
            Tool::MagicWand => {
                canvas.magic_wand(tile, self.threshold, self.select_mode)?;
            }
            Tool::Picker => {
                if let Some(color) = canvas.pick_color(tile.0, tile.1) {
                    if alt {
                        self.secondary = color;
                    } else {
                        self.set_brush_color(color);
                    }
                }
            }
        }
        Ok(())
    }

    /// Pointer motion. Strokes continue from the last position.
    pub fn move_to(&mut self, canvas: &mut Canvas, pos: (f32, f32), alt: bool) -> CanvasResult<()> {
        if !self.drawing {
            return Ok(());
        }
        let from = self.last_pos.unwrap_or(pos);
        self.paint(canvas, from, pos, alt)?;
        self.last_pos = Some(pos);
        Ok(())
    }

    /// Pointer up. A finished stroke becomes one history entry.
    pub fn release(&mut self, canvas: &mut Canvas) -> CanvasResult<()> {
        if self.drawing {
            self.stop_drawing();
            canvas.commit()?;
        }
        Ok(())
    }

    /// The alternate button erases with the brush tool.
    fn paint(&self, canvas: &mut Canvas, from: (f32, f32), to: (f32, f32), alt: bool) -> CanvasResult<()> {
        let erase = alt || self.tool == Tool::Eraser;
        self.brush.stroke(canvas, from, to, self.pressure, erase)
    }

    pub fn stop_drawing(&mut self) {
        self.drawing = false;
        self.last_pos = None;
    }

    pub fn set_brush_color(&mut self, color: Color) {
        self.brush.color = color;
    }

    pub fn swap_colors(&mut self) {
        std::mem::swap(&mut self.brush.color, &mut self.secondary);
    }

    pub fn adjust_brush_size(&mut self, delta: i32, min: u32, max: u32) {
        let size = (self.brush.size as i64 + delta as i64).clamp(min as i64, max as i64);
        self.brush.size = size as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;

    fn setup() -> (Canvas, ToolState) {
        let canvas = Canvas::new(8, 8, EditorConfig::default());
        let state = ToolState::for_canvas(&canvas);
        (canvas, state)
    }

    #[test]
    fn test_stroke_commits_once_on_release() {
        let (mut canvas, mut state) = setup();
        state.press(&mut canvas, (0.5, 0.5), false).unwrap();
        state.move_to(&mut canvas, (3.5, 0.5), false).unwrap();
        state.move_to(&mut canvas, (3.5, 3.5), false).unwrap();
        assert_eq!(canvas.history().len(), 1);
        state.release(&mut canvas).unwrap();
        assert_eq!(canvas.history().len(), 2);
        assert!(!state.drawing);
        assert_eq!(canvas.pick_color(2, 0), Some(Color::BLACK));
        assert_eq!(canvas.pick_color(3, 2), Some(Color::BLACK));

        canvas.undo().unwrap();
        assert_eq!(canvas.pick_color(2, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_move_without_press_does_nothing() {
        let (mut canvas, mut state) = setup();
        state.move_to(&mut canvas, (2.0, 2.0), false).unwrap();
        state.release(&mut canvas).unwrap();
        assert_eq!(canvas.pick_color(2, 2), Some(Color::TRANSPARENT));
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn test_alternate_button_erases() {
        let (mut canvas, mut state) = setup();
        state.press(&mut canvas, (1.0, 1.0), false).unwrap();
        state.release(&mut canvas).unwrap();
        assert_eq!(canvas.pick_color(1, 1), Some(Color::BLACK));

        state.press(&mut canvas, (1.0, 1.0), true).unwrap();
        state.release(&mut canvas).unwrap();
        assert_eq!(canvas.pick_color(1, 1), Some(Color::TRANSPARENT));

        state.tool = Tool::Fill;
        state.press(&mut canvas, (1.0, 1.0), true).unwrap();
        assert_eq!(canvas.pick_color(1, 1), Some(Color::WHITE));

        state.tool = Tool::Eraser;
        state.press(&mut canvas, (1.0, 1.0), false).unwrap();
        state.release(&mut canvas).unwrap();
        assert_eq!(canvas.pick_color(1, 1), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_fill_and_picker() {
        let (mut canvas, mut state) = setup();
        state.tool = Tool::Fill;
        state.set_brush_color(Color::rgb(10, 20, 30));
        state.press(&mut canvas, (4.0, 4.0), false).unwrap();
        assert_eq!(canvas.pick_color(0, 7), Some(Color::rgb(10, 20, 30)));
        assert_eq!(canvas.history().len(), 2);

        state.tool = Tool::Picker;
        state.set_brush_color(Color::BLACK);
        state.press(&mut canvas, (0.0, 0.0), false).unwrap();
        assert_eq!(state.brush.color, Color::rgb(10, 20, 30));
    }

    #[test]
    fn test_magic_wand_tool_selects() {
        let (mut canvas, mut state) = setup();
        state.tool = Tool::MagicWand;
        state.press(&mut canvas, (0.0, 0.0), false).unwrap();
        assert_eq!(canvas.selection().len(), 64);
    }

    #[test]
    fn test_adjust_brush_size_clamps() {
        let (_, mut state) = setup();
        state.adjust_brush_size(-5, 1, 16);
        assert_eq!(state.brush.size, 1);
        state.adjust_brush_size(100, 1, 16);
        assert_eq!(state.brush.size, 16);
        state.swap_colors();
        assert_eq!(state.brush.color, Color::WHITE);
    }
}
