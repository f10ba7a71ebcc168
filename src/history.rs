use crate::color::Color;
use crate::compress::{zlib_compress, zlib_decompress, BYTES_PER_PIXEL};
use crate::error::CanvasResult;
use crate::layer::LayerStack;

/// One compressed copy of a layer's pixels.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub layer_index: usize,
    pub data: Vec<u8>,
    /// Uncompressed byte length, needed to size decompression.
    pub original_len: usize,
}

impl Snapshot {
    pub fn capture(layer_index: usize, pixels: &[Color]) -> CanvasResult<Self> {
        Ok(Self {
            layer_index,
            data: zlib_compress(pixels)?,
            original_len: pixels.len() * BYTES_PER_PIXEL,
        })
    }

    /// Whether this snapshot holds exactly `pixels`.
    pub fn matches(&self, pixels: &[Color]) -> CanvasResult<bool> {
        if self.original_len != pixels.len() * BYTES_PER_PIXEL {
            return Ok(false);
        }
        Ok(self.restore()? == pixels)
    }

    pub fn restore(&self) -> CanvasResult<Vec<Color>> {
        zlib_decompress(&self.data, self.original_len)
    }
}

enum Apply {
    Changed,
    Unchanged,
    Failed,
}

/// Linear undo timeline. `cursor` points at the snapshot currently shown.
pub struct History {
    states: Vec<Snapshot>,
    cursor: usize,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        History {
            states: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state of a layer. Returns false when it matches the
    /// snapshot under the cursor and nothing was recorded.
    pub fn push(&mut self, layer_index: usize, pixels: &[Color]) -> CanvasResult<bool> {
        if let Some(current) = self.states.get(self.cursor) {
            if current.layer_index == layer_index && current.matches(pixels)? {
                log::debug!("History push skipped, layer {} unchanged", layer_index);
                return Ok(false);
            }
        }

        // Remove any states after the cursor (new edit after undoing)
        if !self.states.is_empty() {
            self.states.truncate(self.cursor + 1);
        }

        if self.states.len() >= self.max_depth {
            log::debug!("History full ({} entries), dropping oldest", self.max_depth);
            self.states.remove(0);
        }

        self.states.push(Snapshot::capture(layer_index, pixels)?);
        self.cursor = self.states.len() - 1;
        log::debug!(
            "History push: layer {}, entry {} of {}",
            layer_index,
            self.cursor + 1,
            self.states.len()
        );
        Ok(true)
    }

    /// Step back to the previous state of the layer the current entry
    /// belongs to. Entries that would not change anything, such as the
    /// first snapshot of a layer, are stepped over.
    pub fn undo(&mut self, layers: &mut LayerStack) -> CanvasResult<bool> {
        let mut cursor = self.cursor;
        while cursor > 0 && cursor < self.states.len() {
            let layer_index = self.states[cursor].layer_index;
            let previous = self.states[..cursor]
                .iter()
                .rposition(|s| s.layer_index == layer_index);
            cursor -= 1;
            let Some(previous) = previous else {
                continue;
            };
            match self.apply(previous, layers)? {
                Apply::Changed => {
                    self.cursor = cursor;
                    return Ok(true);
                }
                Apply::Unchanged => continue,
                Apply::Failed => return Ok(false),
            }
        }
        Ok(false)
    }

    /// Step forward to the next entry that changes its layer.
    pub fn redo(&mut self, layers: &mut LayerStack) -> CanvasResult<bool> {
        let mut cursor = self.cursor;
        while cursor + 1 < self.states.len() {
            cursor += 1;
            match self.apply(cursor, layers)? {
                Apply::Changed => {
                    self.cursor = cursor;
                    return Ok(true);
                }
                Apply::Unchanged => continue,
                Apply::Failed => return Ok(false),
            }
        }
        Ok(false)
    }

    /// Latest snapshot of `layer_index` at or before the cursor.
    pub fn latest_for(&self, layer_index: usize) -> Option<&Snapshot> {
        self.states
            .iter()
            .take(self.cursor + 1)
            .rev()
            .find(|s| s.layer_index == layer_index)
    }

    /// Write snapshot `index` back into its layer.
    fn apply(&self, index: usize, layers: &mut LayerStack) -> CanvasResult<Apply> {
        let Some(state) = self.states.get(index) else {
            log::error!("History entry {} missing ({} entries)", index, self.states.len());
            return Ok(Apply::Failed);
        };
        let Some(layer) = layers.get(state.layer_index) else {
            log::error!(
                "History entry {} targets missing layer {}",
                index,
                state.layer_index
            );
            return Ok(Apply::Failed);
        };
        let pixels = state.restore()?;
        if pixels.len() != layers.pixel_count() {
            log::error!(
                "History entry {} holds {} pixels, canvas has {}",
                index,
                pixels.len(),
                layers.pixel_count()
            );
            return Ok(Apply::Failed);
        }
        if layer.pixels()?.as_ref() == pixels.as_slice() {
            return Ok(Apply::Unchanged);
        }
        layers.set_pixels(state.layer_index, pixels)?;
        Ok(Apply::Changed)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.cursor = 0;
    }
}
