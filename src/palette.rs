use std::fs;
use std::path::Path;

use crate::color::{nearest_color_index, Color};
use crate::error::{CanvasError, CanvasResult};

/// Entries every palette starts with and never loses.
pub const RESERVED: [Color; 2] = [Color::BLACK, Color::WHITE];

/// Ordered color list. The first two entries are always black and white.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: RESERVED.to_vec(),
        }
    }
}

impl Palette {
    /// Parse whitespace-separated RGB triples.
    pub fn parse(text: &str) -> CanvasResult<Self> {
        Self::parse_with(text, 3)
    }

    /// Parse groups of `channels` decimals (3 for RGB, 4 for RGBA). Any bad
    /// token fails the whole parse.
    pub fn parse_with(text: &str, channels: usize) -> CanvasResult<Self> {
        let channels = channels.clamp(3, 4);
        let mut values = Vec::new();
        for token in text.split_whitespace() {
            let value: u8 = token.parse().map_err(|_| CanvasError::Palette {
                token: token.to_string(),
                reason: "not a number between 0 and 255",
            })?;
            values.push(value);
        }
        if values.len() % channels != 0 {
            return Err(CanvasError::Palette {
                token: text.split_whitespace().last().unwrap_or_default().to_string(),
                reason: "incomplete color entry",
            });
        }

        let mut palette = Palette::default();
        for group in values.chunks_exact(channels) {
            let alpha = if channels == 4 { group[3] } else { 255 };
            palette.colors.push(Color::rgba(group[0], group[1], group[2], alpha));
        }
        Ok(palette)
    }

    /// Load a palette file of RGB triples. Files of RGBA quads need
    /// `load_with(path, 4)`: a quad file whose value count is also a multiple
    /// of 3 would otherwise be read as triples.
    pub fn load(path: impl AsRef<Path>) -> CanvasResult<Self> {
        Self::load_with(path, 3)
    }

    pub fn load_with(path: impl AsRef<Path>, channels: usize) -> CanvasResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let palette = Self::parse_with(&text, channels).inspect_err(|e| {
            log::warn!("Palette {} rejected: {}", path.display(), e);
        })?;
        log::info!("Loaded {} palette colors from {}", palette.len(), path.display());
        Ok(palette)
    }

    /// RGB triples of the non-reserved entries, one per line.
    pub fn to_text(&self) -> String {
        self.colors[RESERVED.len()..]
            .iter()
            .map(|c| format!("{} {} {}\n", c.r(), c.g(), c.b()))
            .collect()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> CanvasResult<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    pub fn add(&mut self, color: Color) -> usize {
        self.colors.push(color);
        self.colors.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> CanvasResult<Color> {
        if index < RESERVED.len() {
            return Err(CanvasError::ReservedPaletteEntry(index));
        }
        if index >= self.colors.len() {
            return Err(CanvasError::Palette {
                token: index.to_string(),
                reason: "no such palette entry",
            });
        }
        Ok(self.colors.remove(index))
    }

    pub fn nearest(&self, color: Color) -> Option<usize> {
        nearest_color_index(color, &self.colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_prepends_black_and_white() {
        let palette = Palette::parse("10 20 30 40 50 60").unwrap();
        assert_eq!(
            palette.colors(),
            &[
                Color::BLACK,
                Color::WHITE,
                Color::rgba(10, 20, 30, 255),
                Color::rgba(40, 50, 60, 255)
            ]
        );
    }

    #[test]
    fn test_rgba_entries() {
        let palette = Palette::parse_with("1 2 3 4\n5 6 7 8", 4).unwrap();
        assert_eq!(palette.get(3), Some(Color::rgba(5, 6, 7, 8)));
    }

    #[test]
    fn test_malformed_tokens_fail() {
        assert!(matches!(
            Palette::parse("10 20 x"),
            Err(CanvasError::Palette { .. })
        ));
        assert!(Palette::parse("10 20 256").is_err());
        assert!(Palette::parse("10 20 30 40").is_err());
        assert_eq!(Palette::parse("").unwrap(), Palette::default());
    }

    #[test]
    fn test_reserved_entries_protected() {
        let mut palette = Palette::default();
        assert!(matches!(palette.remove(0), Err(CanvasError::ReservedPaletteEntry(0))));
        assert!(palette.remove(1).is_err());
        let idx = palette.add(Color::rgb(1, 1, 1));
        assert_eq!(palette.remove(idx).unwrap(), Color::rgb(1, 1, 1));
        assert!(palette.remove(5).is_err());
    }

    #[test]
    fn test_text_round_trip() {
        let palette = Palette::parse("10 20 30\n40 50 60").unwrap();
        assert_eq!(palette.to_text(), "10 20 30\n40 50 60\n");
        assert_eq!(Palette::parse(&palette.to_text()).unwrap(), palette);
    }

    #[test]
    fn test_nearest() {
        let palette = Palette::parse("250 0 0").unwrap();
        assert_eq!(palette.nearest(Color::rgb(200, 10, 10)), Some(2));
    }
}
