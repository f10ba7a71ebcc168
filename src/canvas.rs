use crate::adjust::{band_aid, map_pixels, to_palette};
use crate::color::{adjust_contrast, adjust_saturation, xor_color, Color};
use crate::composite::{composite, flatten};
use crate::compress::pixels_to_bytes;
use crate::config::EditorConfig;
use crate::dither::dither;
use crate::error::{CanvasError, CanvasResult};
use crate::history::History;
use crate::layer::LayerStack;
use crate::palette::Palette;
use crate::selection::{flood_region, SelectMode, Selection};
use crate::shapes::{
    ellipse_points, line_points, rect_fill_points, rect_outline_points, square_points,
    stamp_half_width, Clip,
};
use crate::transform::{apply_transform, center_region, opaque_region, CenterAxis, Moved, Transform};

/// One editable document: layers, palette, selection and undo history.
pub struct Canvas {
    width: u16,
    height: u16,
    layers: LayerStack,
    palette: Palette,
    selection: Selection,
    history: History,
    config: EditorConfig,
    /// Set whenever pixels change; the renderer clears it with `take_dirty`.
    pub dirty: bool,
}

impl Canvas {
    pub fn new(width: u16, height: u16, config: EditorConfig) -> Self {
        let mut canvas = Self {
            width,
            height,
            layers: LayerStack::new(width, height, config.max_layers, config.compress_hidden_layers),
            palette: Palette::default(),
            selection: Selection::new(width, height),
            history: History::new(config.max_history),
            config,
            dirty: true,
        };
        canvas.record_baseline();
        canvas
    }

    /// Build a single-layer canvas from a tight top-left-origin RGBA buffer.
    pub fn from_rgba(width: u16, height: u16, rgba: &[u8], config: EditorConfig) -> CanvasResult<Self> {
        let expected = width as usize * height as usize;
        let pixels = rgba_to_pixels(rgba, expected)?;
        let mut canvas = Self::new(width, height, config);
        canvas.layers.set_pixels(0, pixels)?;
        canvas.history.clear();
        canvas.record_baseline();
        Ok(canvas)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    // ---- history ----------------------------------------------------------

    /// Record the active layer. Returns false if nothing changed since the
    /// current history entry.
    pub fn commit(&mut self) -> CanvasResult<bool> {
        let index = self.layers.active_index();
        let pixels = self.layers.active().pixels()?;
        self.history.push(index, &pixels)
    }

    pub fn undo(&mut self) -> CanvasResult<bool> {
        let changed = self.history.undo(&mut self.layers)?;
        self.dirty |= changed;
        Ok(changed)
    }

    pub fn redo(&mut self) -> CanvasResult<bool> {
        let changed = self.history.redo(&mut self.layers)?;
        self.dirty |= changed;
        Ok(changed)
    }

    fn record_baseline(&mut self) {
        if let Err(e) = self.commit() {
            log::error!("Could not record history baseline: {}", e);
        }
    }

    /// Layer indices shifted, so old snapshots no longer line up.
    fn restart_history(&mut self) {
        log::debug!("Layer order changed, restarting history");
        self.history.clear();
        self.record_baseline();
    }

    // ---- layers -----------------------------------------------------------

    pub fn add_layer(&mut self, name: &str) -> CanvasResult<usize> {
        let index = self.layers.add_layer(name.to_string())?;
        self.record_baseline();
        self.dirty = true;
        Ok(index)
    }

    pub fn remove_layer(&mut self, index: usize) -> CanvasResult<()> {
        self.layers.remove_layer(index)?;
        self.restart_history();
        self.dirty = true;
        Ok(())
    }

    pub fn move_layer(&mut self, from: usize, to: usize) -> CanvasResult<()> {
        self.layers.move_layer(from, to)?;
        self.restart_history();
        self.dirty = true;
        Ok(())
    }

    pub fn duplicate_layer(&mut self, index: usize) -> CanvasResult<usize> {
        let new_index = self.layers.duplicate_layer(index)?;
        self.restart_history();
        self.dirty = true;
        Ok(new_index)
    }

    /// Returns false when nothing was merged: `index` is the bottom layer
    /// or hidden.
    pub fn merge_down(&mut self, index: usize) -> CanvasResult<bool> {
        if !self.layers.merge_down(index)? {
            return Ok(false);
        }
        self.restart_history();
        self.dirty = true;
        Ok(true)
    }

    /// Switch the layer edits go to. A baseline is recorded only when the
    /// history has no up-to-date snapshot of that layer.
    pub fn set_active_layer(&mut self, index: usize) -> CanvasResult<()> {
        self.layers.set_active(index)?;
        let recorded = match self.history.latest_for(index) {
            Some(snapshot) => snapshot.matches(&self.layers.active().pixels()?)?,
            None => false,
        };
        if !recorded {
            self.record_baseline();
        }
        Ok(())
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> CanvasResult<()> {
        self.layers.set_visible(index, visible)?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: u8) -> CanvasResult<()> {
        self.layers.set_opacity(index, opacity)?;
        self.dirty = true;
        Ok(())
    }

    pub fn rename_layer(&mut self, index: usize, name: &str) -> CanvasResult<()> {
        self.layers.rename(index, name.to_string())
    }

    /// Shift the alpha of every pixel on the active layer by `delta`,
    /// saturating at 0 and 255.
    pub fn adjust_layer_alpha(&mut self, delta: i16) -> CanvasResult<()> {
        self.update_active(|pixels| {
            map_pixels(pixels, |_| true, |p| {
                p.with_alpha((p.a() as i16 + delta).clamp(0, 255) as u8)
            })
        })
    }

    // ---- painting ---------------------------------------------------------

    /// Active layer color at `(x, y)`.
    pub fn pick_color(&self, x: i32, y: i32) -> Option<Color> {
        self.layers.pixel(self.layers.active_index(), x, y)
    }

    /// Write `color` at each point on the active layer. Points off the canvas
    /// or outside a non-empty selection are skipped.
    pub fn plot_points(&mut self, points: &[(i32, i32)], color: Color) -> CanvasResult<()> {
        let targets: Vec<usize> = points
            .iter()
            .filter_map(|&(x, y)| self.layers.flat_index(x, y))
            .filter(|&i| self.selection.allows(i))
            .collect();
        if targets.is_empty() {
            return Ok(());
        }
        self.update_active(|pixels| {
            let mut out = pixels.to_vec();
            for &i in &targets {
                out[i] = color;
            }
            out
        })
    }

    /// Bresenham line stamped with a square of side `2 * (thickness / 2) + 1`.
    pub fn draw_line(&mut self, a: (i32, i32), b: (i32, i32), thickness: u32, color: Color) -> CanvasResult<()> {
        let Some(bounds) = self.bounds() else {
            return Ok(());
        };
        let half = stamp_half_width(thickness);
        let points: Vec<(i32, i32)> = line_points(a, b, bounds.grow(half))
            .into_iter()
            .flat_map(|p| square_points(p, half, bounds))
            .collect();
        self.plot_points(&points, color)
    }

    pub fn draw_rect(&mut self, a: (i32, i32), b: (i32, i32), color: Color) -> CanvasResult<()> {
        match self.bounds() {
            Some(bounds) => self.plot_points(&rect_outline_points(a, b, bounds), color),
            None => Ok(()),
        }
    }

    pub fn fill_rect(&mut self, a: (i32, i32), b: (i32, i32), color: Color) -> CanvasResult<()> {
        match self.bounds() {
            Some(bounds) => self.plot_points(&rect_fill_points(a, b, bounds), color),
            None => Ok(()),
        }
    }

    pub fn draw_ellipse(&mut self, a: (i32, i32), b: (i32, i32), color: Color) -> CanvasResult<()> {
        match self.bounds() {
            Some(bounds) => self.plot_points(&ellipse_points(a, b, bounds), color),
            None => Ok(()),
        }
    }

    fn bounds(&self) -> Option<Clip> {
        Clip::canvas(self.width, self.height)
    }

    /// Paint bucket. Returns the number of tiles repainted.
    pub fn fill(&mut self, seed: (i32, i32), color: Color, threshold: u8) -> CanvasResult<usize> {
        let region = {
            let pixels = self.layers.active().pixels()?;
            flood_region(&pixels, self.width, self.height, seed, threshold, Some(&self.selection))
        };
        if region.is_empty() {
            return Ok(0);
        }
        let count = region.len();
        self.update_active(|pixels| {
            let mut out = pixels.to_vec();
            for &i in &region {
                out[i] = color;
            }
            out
        })?;
        Ok(count)
    }

    // ---- selection --------------------------------------------------------

    /// Select the similar-colored region around `seed` without touching pixels.
    pub fn magic_wand(&mut self, seed: (i32, i32), threshold: u8, mode: SelectMode) -> CanvasResult<usize> {
        let region = {
            let pixels = self.layers.active().pixels()?;
            flood_region(&pixels, self.width, self.height, seed, threshold, None)
        };
        let count = region.len();
        self.selection.apply(region, mode);
        Ok(count)
    }

    pub fn select_rect(&mut self, a: (f32, f32), b: (f32, f32), mode: SelectMode) {
        self.selection.select_rect(a, b, mode);
    }

    pub fn select_polygon(&mut self, points: &[(f32, f32)], mode: SelectMode) {
        self.selection.select_polygon(points, mode);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn invert_selection(&mut self) {
        self.selection.invert();
    }

    // ---- filters ----------------------------------------------------------

    pub fn dither(&mut self) -> CanvasResult<()> {
        let out = {
            let selection = &self.selection;
            let pixels = self.layers.active().pixels()?;
            dither(&pixels, self.width, self.height, |i| selection.allows(i))
        };
        self.commit_active(out)
    }

    /// Smooth the selected tiles from their unselected neighbours.
    pub fn band_aid(&mut self) -> CanvasResult<()> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let out = {
            let pixels = self.layers.active().pixels()?;
            band_aid(&pixels, self.width, self.height, &self.selection)
        };
        self.commit_active(out)
    }

    /// Affected pixels come back fully opaque.
    pub fn adjust_saturation(&mut self, factor: f32) -> CanvasResult<()> {
        log::warn!("Saturation adjustment forces alpha to 255");
        self.map_selected(|p| adjust_saturation(p, factor))
    }

    /// Affected pixels come back fully opaque.
    pub fn adjust_contrast(&mut self, factor: f32) -> CanvasResult<()> {
        log::warn!("Contrast adjustment forces alpha to 255");
        self.map_selected(|p| adjust_contrast(p, factor))
    }

    /// Snap the active layer to the palette. Affected pixels become opaque.
    pub fn convert_to_palette(&mut self) -> CanvasResult<()> {
        log::warn!("Palette conversion forces alpha to 255");
        let palette = self.palette.colors().to_vec();
        self.map_selected(|p| to_palette(p, &palette))
    }

    /// Reversible XOR scramble of the active layer's color channels.
    pub fn scramble(&mut self, key: Color) -> CanvasResult<()> {
        self.map_selected(|p| xor_color(p, key))
    }

    // ---- transforms -------------------------------------------------------

    pub fn flip_horizontal(&mut self) -> CanvasResult<()> {
        self.transform(Transform::FlipHorizontal)
    }

    pub fn flip_vertical(&mut self) -> CanvasResult<()> {
        self.transform(Transform::FlipVertical)
    }

    pub fn rotate_90(&mut self) -> CanvasResult<()> {
        self.transform(Transform::Rotate90)
    }

    /// Flip or rotate the selection, or the whole layer without one.
    pub fn transform(&mut self, transform: Transform) -> CanvasResult<()> {
        let region: Vec<usize> = if self.selection.is_empty() {
            (0..self.layers.pixel_count()).collect()
        } else {
            self.selection.iter().collect()
        };
        let moved = {
            let pixels = self.layers.active().pixels()?;
            apply_transform(&pixels, self.width, self.height, &region, transform)
        };
        self.commit_moved(moved)
    }

    /// Center the selection, or the layer's visible content without one.
    pub fn center(&mut self, axis: CenterAxis) -> CanvasResult<()> {
        let moved = {
            let pixels = self.layers.active().pixels()?;
            let region: Vec<usize> = if self.selection.is_empty() {
                opaque_region(&pixels)
            } else {
                self.selection.iter().collect()
            };
            center_region(&pixels, self.width, self.height, &region, axis)
        };
        self.commit_moved(moved)
    }

    fn commit_moved(&mut self, moved: Option<Moved>) -> CanvasResult<()> {
        let Some(moved) = moved else {
            return Ok(());
        };
        self.commit_active(moved.pixels)?;
        if !self.selection.is_empty() {
            self.selection.apply(moved.region, SelectMode::Replace);
        }
        Ok(())
    }

    // ---- output -----------------------------------------------------------

    /// Display buffer with transparency shown as a checkerboard.
    pub fn composite(&self) -> CanvasResult<Vec<Color>> {
        composite(&self.layers, self.config.checker_light, self.config.checker_dark)
    }

    /// All shown layers over opaque white, as tight RGBA bytes.
    pub fn flatten_rgba(&self) -> CanvasResult<Vec<u8>> {
        Ok(pixels_to_bytes(&flatten(&self.layers, Color::WHITE)?))
    }

    /// Paste a top-left-origin RGBA buffer as a new layer, clipped to the canvas.
    pub fn paste_rgba(&mut self, width: u32, height: u32, rgba: &[u8]) -> CanvasResult<usize> {
        let src = rgba_to_pixels(rgba, width as usize * height as usize)?;
        let mut pixels = vec![Color::TRANSPARENT; self.layers.pixel_count()];
        let copy_w = (width as usize).min(self.width as usize);
        let copy_h = (height as usize).min(self.height as usize);
        for y in 0..copy_h {
            let src_row = y * width as usize;
            let dst_row = y * self.width as usize;
            pixels[dst_row..dst_row + copy_w].copy_from_slice(&src[src_row..src_row + copy_w]);
        }
        let index = self.layers.add_layer_with_pixels("Pasted".to_string(), pixels)?;
        self.record_baseline();
        self.dirty = true;
        Ok(index)
    }

    /// Copy the selection's bounding box (or the whole active layer) as
    /// `(width, height, rgba)`. Unselected tiles inside the box are transparent.
    pub fn copy_rgba(&self) -> CanvasResult<(u32, u32, Vec<u8>)> {
        let pixels = self.layers.active().pixels()?;
        let Some((x0, y0, x1, y1)) = self.selection.bounds() else {
            return Ok((self.width as u32, self.height as u32, pixels_to_bytes(&pixels)));
        };
        let (w, h) = ((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
        let mut out = Vec::with_capacity(w as usize * h as usize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let i = x as usize + y as usize * self.width as usize;
                out.push(if self.selection.contains(i) { pixels[i] } else { Color::TRANSPARENT });
            }
        }
        Ok((w, h, pixels_to_bytes(&out)))
    }

    // ---- helpers ----------------------------------------------------------

    fn map_selected(&mut self, f: impl Fn(Color) -> Color) -> CanvasResult<()> {
        let out = {
            let selection = &self.selection;
            let pixels = self.layers.active().pixels()?;
            map_pixels(&pixels, |i| selection.allows(i), f)
        };
        self.commit_active(out)
    }

    /// Build the new active-layer state from a copy, then swap it in.
    fn update_active(&mut self, f: impl FnOnce(&[Color]) -> Vec<Color>) -> CanvasResult<()> {
        let out = {
            let pixels = self.layers.active().pixels()?;
            f(&pixels)
        };
        self.commit_active(out)
    }

    fn commit_active(&mut self, pixels: Vec<Color>) -> CanvasResult<()> {
        if pixels.len() != self.layers.pixel_count() {
            log::error!(
                "Refusing to commit {} pixels to a {}x{} canvas",
                pixels.len(),
                self.width,
                self.height
            );
            return Err(CanvasError::DimensionMismatch {
                expected: self.layers.pixel_count(),
                actual: pixels.len(),
            });
        }
        let index = self.layers.active_index();
        self.layers.set_pixels(index, pixels)?;
        self.dirty = true;
        Ok(())
    }
}

fn rgba_to_pixels(rgba: &[u8], expected: usize) -> CanvasResult<Vec<Color>> {
    if rgba.len() != expected * 4 {
        return Err(CanvasError::DimensionMismatch {
            expected: expected * 4,
            actual: rgba.len(),
        });
    }
    Ok(rgba
        .chunks_exact(4)
        .map(|c| Color::from_array([c[0], c[1], c[2], c[3]]))
        .collect())
}
