use serde::{Deserialize, Serialize};

/// Packed RGBA color. R lives in bits 0-7, G in 8-15, B in 16-23 and A in
/// 24-31, so `to_le_bytes` gives `[r, g, b, a]` regardless of platform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color((r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24))
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::rgba(r, g, b, 255)
    }

    pub const fn r(self) -> u8 {
        self.0 as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Color((self.0 & 0x00FF_FFFF) | ((a as u32) << 24))
    }

    pub const fn to_array(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub const fn from_array(bytes: [u8; 4]) -> Self {
        Color(u32::from_le_bytes(bytes))
    }

    pub fn is_transparent(self) -> bool {
        self.a() == 0
    }

    /// Perceptual luma of the color channels.
    pub fn luma(self) -> f32 {
        0.299 * self.r() as f32 + 0.587 * self.g() as f32 + 0.114 * self.b() as f32
    }
}

impl From<[u8; 4]> for Color {
    fn from(bytes: [u8; 4]) -> Self {
        Color::from_array(bytes)
    }
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

/// Largest value `threshold_to_distance` can produce.
pub const MAX_THRESHOLD_DISTANCE: f32 = 765.0;

/// Sum of squared RGB differences. Alpha is ignored.
pub fn color_distance_squared(c1: Color, c2: Color) -> u32 {
    let dr = c1.r() as i32 - c2.r() as i32;
    let dg = c1.g() as i32 - c2.g() as i32;
    let db = c1.b() as i32 - c2.b() as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Euclidean distance over all four channels.
pub fn color_difference(c1: Color, c2: Color) -> f32 {
    let da = c1.a() as f32 - c2.a() as f32;
    (color_distance_squared(c1, c2) as f32 + da * da).sqrt()
}

/// Maps a 0-100 tolerance onto the 0-765 distance scale.
pub fn threshold_to_distance(threshold: u8) -> f32 {
    threshold.min(100) as f32 * MAX_THRESHOLD_DISTANCE / 100.0
}

/// XOR the color channels with `key`, leaving alpha untouched.
pub fn xor_color(color: Color, key: Color) -> Color {
    Color(((color.0 ^ key.0) & 0x00FF_FFFF) | (color.0 & 0xFF00_0000))
}

/// Scale the distance of each channel from the luma. Alpha comes back as 255.
pub fn adjust_saturation(color: Color, factor: f32) -> Color {
    let luma = color.luma();
    let ch = |v: u8| (luma + (v as f32 - luma) * factor).round().clamp(0.0, 255.0) as u8;
    Color::rgb(ch(color.r()), ch(color.g()), ch(color.b()))
}

/// Scale each channel around the 128 midpoint. Alpha comes back as 255.
pub fn adjust_contrast(color: Color, factor: f32) -> Color {
    let ch = |v: u8| ((v as f32 - 128.0) * factor + 128.0).round().clamp(0.0, 255.0) as u8;
    Color::rgb(ch(color.r()), ch(color.g()), ch(color.b()))
}

/// Index of the palette entry closest to `color`, if the palette is not empty.
pub fn nearest_color_index(color: Color, palette: &[Color]) -> Option<usize> {
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| color_distance_squared(color, **p))
        .map(|(i, _)| i)
}
