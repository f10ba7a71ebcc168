use crate::color::{nearest_color_index, Color};
use crate::selection::Selection;

/// Apply `f` to every pixel `allow` accepts, returning a new buffer.
pub fn map_pixels(pixels: &[Color], allow: impl Fn(usize) -> bool, f: impl Fn(Color) -> Color) -> Vec<Color> {
    pixels
        .iter()
        .enumerate()
        .map(|(i, &p)| if allow(i) { f(p) } else { p })
        .collect()
}

/// Snap a color to the closest palette entry. The result is always opaque.
pub fn to_palette(color: Color, palette: &[Color]) -> Color {
    match nearest_color_index(color, palette) {
        Some(i) => palette[i].with_alpha(255),
        None => color,
    }
}

/// Replace each selected tile with the average of its unselected
/// 8-neighbours. Tiles with no unselected neighbour keep their color.
pub fn band_aid(pixels: &[Color], width: u16, height: u16, selection: &Selection) -> Vec<Color> {
    let (w, h) = (width as i32, height as i32);
    let mut out = pixels.to_vec();
    if pixels.len() != w as usize * h as usize {
        return out;
    }

    for i in selection.iter() {
        if i >= pixels.len() {
            continue;
        }
        let (x, y) = ((i % w as usize) as i32, (i / w as usize) as i32);
        let mut sum = [0u32; 4];
        let mut count = 0u32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if (dx == 0 && dy == 0) || nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let n = nx as usize + ny as usize * w as usize;
                if selection.contains(n) {
                    continue;
                }
                let p = pixels[n];
                sum[0] += p.r() as u32;
                sum[1] += p.g() as u32;
                sum[2] += p.b() as u32;
                sum[3] += p.a() as u32;
                count += 1;
            }
        }
        if count > 0 {
            let avg = |s: u32| ((s + count / 2) / count) as u8;
            out[i] = Color::rgba(avg(sum[0]), avg(sum[1]), avg(sum[2]), avg(sum[3]));
        }
    }
    out
}
