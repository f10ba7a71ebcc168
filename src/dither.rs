use crate::color::Color;

/// Reduce an 8-bit channel to 5 significant bits, replicating the top bit
/// into the low three so full white stays 255.
pub fn quantize_channel(v: u8) -> u8 {
    let hi = v & 0xF8;
    if v & 0x80 != 0 { hi | 0x07 } else { hi }
}

/// Floyd-Steinberg error diffusion down to 5 bits per channel.
///
/// Only pixels accepted by `allow` and not fully transparent are quantized
/// or receive error. Quantized pixels come back opaque.
pub fn dither(pixels: &[Color], width: u16, height: u16, allow: impl Fn(usize) -> bool) -> Vec<Color> {
    let (w, h) = (width as usize, height as usize);
    let mut out = pixels.to_vec();
    if w == 0 || h == 0 || pixels.len() != w * h {
        return out;
    }

    let mut work: Vec<[f32; 3]> = pixels
        .iter()
        .map(|p| [p.r() as f32, p.g() as f32, p.b() as f32])
        .collect();
    let eligible = |i: usize| allow(i) && !pixels[i].is_transparent();

    for y in 0..h {
        for x in 0..w {
            let i = x + y * w;
            if !eligible(i) {
                continue;
            }
            let old = work[i];
            let mut new = [0u8; 3];
            let mut err = [0f32; 3];
            for c in 0..3 {
                let v = old[c].round().clamp(0.0, 255.0) as u8;
                new[c] = quantize_channel(v);
                err[c] = old[c] - new[c] as f32;
            }
            out[i] = Color::rgb(new[0], new[1], new[2]);

            let neighbors = [
                (x as isize + 1, y as isize, 7.0 / 16.0),
                (x as isize - 1, y as isize + 1, 3.0 / 16.0),
                (x as isize, y as isize + 1, 5.0 / 16.0),
                (x as isize + 1, y as isize + 1, 1.0 / 16.0),
            ];
            for (nx, ny, weight) in neighbors {
                if nx < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let n = nx as usize + ny as usize * w;
                if !eligible(n) {
                    continue;
                }
                for c in 0..3 {
                    work[n][c] += err[c] * weight;
                }
            }
        }
    }
    out
}
