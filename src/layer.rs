use std::borrow::Cow;

use crate::color::Color;
use crate::composite::blend_over;
use crate::compress::{rle_compress, rle_decompress};
use crate::error::{CanvasError, CanvasResult};

/// Backing store of a layer: either live pixels or an RLE stream.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerStorage {
    Materialized(Vec<Color>),
    Compressed { bytes: Vec<u8>, len: usize },
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    pub opacity: u8,
    storage: LayerStorage,
}

impl Layer {
    /// A fully transparent layer of `len` pixels.
    pub fn new(name: String, len: usize) -> Self {
        Self::from_pixels(name, vec![Color::TRANSPARENT; len])
    }

    pub fn from_pixels(name: String, pixels: Vec<Color>) -> Self {
        Self {
            name,
            visible: true,
            opacity: 255,
            storage: LayerStorage::Materialized(pixels),
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            LayerStorage::Materialized(pixels) => pixels.len(),
            LayerStorage::Compressed { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.storage, LayerStorage::Compressed { .. })
    }

    pub fn storage(&self) -> &LayerStorage {
        &self.storage
    }

    /// Read access that decompresses on the fly when needed.
    pub fn pixels(&self) -> CanvasResult<Cow<'_, [Color]>> {
        match &self.storage {
            LayerStorage::Materialized(pixels) => Ok(Cow::Borrowed(pixels)),
            LayerStorage::Compressed { bytes, len } => {
                Ok(Cow::Owned(rle_decompress(bytes, Some(*len))?))
            }
        }
    }

    /// Mutable access. A compressed layer is materialized first.
    pub fn pixels_mut(&mut self) -> CanvasResult<&mut Vec<Color>> {
        self.materialize()?;
        match &mut self.storage {
            LayerStorage::Materialized(pixels) => Ok(pixels),
            LayerStorage::Compressed { .. } => Err(CanvasError::Decompress(format!(
                "layer {:?} is still compressed",
                self.name
            ))),
        }
    }

    pub fn replace_pixels(&mut self, pixels: Vec<Color>) {
        self.storage = LayerStorage::Materialized(pixels);
    }

    pub fn materialize(&mut self) -> CanvasResult<()> {
        if let LayerStorage::Compressed { bytes, len } = &self.storage {
            let pixels = rle_decompress(bytes, Some(*len))?;
            log::debug!("Materialized layer {:?} ({} pixels)", self.name, pixels.len());
            self.storage = LayerStorage::Materialized(pixels);
        }
        Ok(())
    }

    pub fn compress(&mut self) {
        if let LayerStorage::Materialized(pixels) = &self.storage {
            let bytes = rle_compress(pixels);
            log::debug!(
                "Compressed layer {:?}: {} pixels into {} bytes",
                self.name,
                pixels.len(),
                bytes.len()
            );
            self.storage = LayerStorage::Compressed {
                len: pixels.len(),
                bytes,
            };
        }
    }

    /// Whether this layer contributes to a composite.
    pub fn is_shown(&self) -> bool {
        self.visible && self.opacity > 0
    }
}

/// Ordered layers of one canvas. Index 0 is the bottom of the stack.
#[derive(Clone, Debug)]
pub struct LayerStack {
    width: u16,
    height: u16,
    layers: Vec<Layer>,
    active: usize,
    max_layers: usize,
    compress_hidden: bool,
}

impl LayerStack {
    /// A stack holding one transparent layer.
    pub fn new(width: u16, height: u16, max_layers: usize, compress_hidden: bool) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            layers: vec![Layer::new("Layer 1".to_string(), len)],
            active: 0,
            max_layers: max_layers.max(1),
            compress_hidden,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Layer {
        &self.layers[self.active]
    }

    pub fn set_active(&mut self, index: usize) -> CanvasResult<()> {
        self.check_index(index)?;
        self.active = index;
        Ok(())
    }

    /// Append a transparent layer on top and make it active.
    pub fn add_layer(&mut self, name: String) -> CanvasResult<usize> {
        let len = self.pixel_count();
        self.push_layer(Layer::new(name, len))
    }

    /// Append a layer built from existing pixels and make it active.
    pub fn add_layer_with_pixels(&mut self, name: String, pixels: Vec<Color>) -> CanvasResult<usize> {
        if pixels.len() != self.pixel_count() {
            return Err(CanvasError::DimensionMismatch {
                expected: self.pixel_count(),
                actual: pixels.len(),
            });
        }
        self.push_layer(Layer::from_pixels(name, pixels))
    }

    fn push_layer(&mut self, layer: Layer) -> CanvasResult<usize> {
        self.check_capacity()?;
        log::debug!("Adding layer {:?} at index {}", layer.name, self.layers.len());
        self.layers.push(layer);
        self.active = self.layers.len() - 1;
        Ok(self.active)
    }

    /// Remove a layer. The active index is repaired to stay valid.
    pub fn remove_layer(&mut self, index: usize) -> CanvasResult<Layer> {
        self.check_index(index)?;
        if self.layers.len() == 1 {
            log::warn!("Refusing to remove the last layer");
            return Err(CanvasError::LastLayer);
        }
        let removed = self.layers.remove(index);
        if index < self.active || self.active >= self.layers.len() {
            self.active = self.active.saturating_sub(1);
        }
        log::debug!("Removed layer {:?}, active is now {}", removed.name, self.active);
        Ok(removed)
    }

    /// Move a layer to a new stacking position. The active layer keeps
    /// pointing at the same layer.
    pub fn move_layer(&mut self, from: usize, to: usize) -> CanvasResult<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.active = if self.active == from {
            to
        } else if from < self.active && self.active <= to {
            self.active - 1
        } else if to <= self.active && self.active < from {
            self.active + 1
        } else {
            self.active
        };
        Ok(())
    }

    pub fn duplicate_layer(&mut self, index: usize) -> CanvasResult<usize> {
        self.check_index(index)?;
        self.check_capacity()?;
        let mut copy = self.layers[index].clone();
        copy.name = format!("{} copy", copy.name);
        self.layers.insert(index + 1, copy);
        self.active = index + 1;
        Ok(self.active)
    }

    /// Blend layer `index` onto the layer beneath it using its opacity, then
    /// drop it. The merged layer becomes active. Returns false without
    /// touching the stack when there is no layer below or `index` is hidden.
    pub fn merge_down(&mut self, index: usize) -> CanvasResult<bool> {
        self.check_index(index)?;
        if index == 0 {
            log::warn!("Nothing below layer 0 to merge into");
            return Ok(false);
        }
        let upper = &self.layers[index];
        if !upper.visible {
            log::warn!("Refusing to merge hidden layer {:?}", upper.name);
            return Ok(false);
        }
        let opacity = upper.opacity;
        let mut merged = self.layers[index - 1].pixels()?.into_owned();
        {
            let top = upper.pixels()?;
            for (dst, src) in merged.iter_mut().zip(top.iter()) {
                *dst = blend_over(*dst, *src, opacity);
            }
        }
        self.set_pixels(index - 1, merged)?;
        let removed = self.layers.remove(index);
        self.active = index - 1;
        log::debug!("Merged layer {:?} into layer {}", removed.name, index - 1);
        Ok(true)
    }

    /// Replace the pixels of layer `index`, keeping its storage in line
    /// with its visibility.
    pub fn set_pixels(&mut self, index: usize, pixels: Vec<Color>) -> CanvasResult<()> {
        self.check_index(index)?;
        if pixels.len() != self.pixel_count() {
            return Err(CanvasError::DimensionMismatch {
                expected: self.pixel_count(),
                actual: pixels.len(),
            });
        }
        self.layers[index].replace_pixels(pixels);
        self.sync_storage(index)
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> CanvasResult<()> {
        self.check_index(index)?;
        self.layers[index].visible = visible;
        self.sync_storage(index)
    }

    pub fn set_opacity(&mut self, index: usize, opacity: u8) -> CanvasResult<()> {
        self.check_index(index)?;
        self.layers[index].opacity = opacity;
        self.sync_storage(index)
    }

    pub fn rename(&mut self, index: usize, name: String) -> CanvasResult<()> {
        self.check_index(index)?;
        self.layers[index].name = name;
        Ok(())
    }

    /// Pixel of layer `index` at `(x, y)`, or `None` when out of range.
    pub fn pixel(&self, index: usize, x: i32, y: i32) -> Option<Color> {
        let i = self.flat_index(x, y)?;
        let layer = self.layers.get(index)?;
        match layer.storage() {
            LayerStorage::Materialized(pixels) => pixels.get(i).copied(),
            LayerStorage::Compressed { .. } => layer.pixels().ok()?.get(i).copied(),
        }
    }

    pub fn flat_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(x as usize + y as usize * self.width as usize)
    }

    /// Compress hidden and zero-opacity layers, materialize shown ones.
    fn sync_storage(&mut self, index: usize) -> CanvasResult<()> {
        if !self.compress_hidden {
            return Ok(());
        }
        let layer = &mut self.layers[index];
        if layer.is_shown() {
            layer.materialize()
        } else {
            layer.compress();
            Ok(())
        }
    }

    fn check_index(&self, index: usize) -> CanvasResult<()> {
        if index >= self.layers.len() {
            return Err(CanvasError::LayerIndex {
                index,
                count: self.layers.len(),
            });
        }
        Ok(())
    }

    fn check_capacity(&self) -> CanvasResult<()> {
        if self.layers.len() >= self.max_layers {
            log::warn!("Layer limit of {} reached", self.max_layers);
            return Err(CanvasError::LayerLimit {
                max: self.max_layers,
            });
        }
        Ok(())
    }
}
