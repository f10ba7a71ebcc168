use crate::color::Color;
use crate::selection::bounds_of;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transform {
    FlipHorizontal,
    FlipVertical,
    /// Quarter turn clockwise about the region's bounding box center.
    Rotate90,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CenterAxis {
    Horizontal,
    Vertical,
    Both,
}

/// Result of moving a region: the new buffer and where the region landed.
pub struct Moved {
    pub pixels: Vec<Color>,
    pub region: Vec<usize>,
}

/// Move every tile of `region` to `map(x, y)`. Works on a scratch copy: the
/// source tiles are cleared, then each destination is written from the
/// untouched original. Destinations off the canvas are dropped.
pub fn move_region(
    pixels: &[Color],
    width: u16,
    height: u16,
    region: &[usize],
    map: impl Fn(i32, i32) -> (i32, i32),
) -> Moved {
    let (w, h) = (width as i32, height as i32);
    let mut scratch = pixels.to_vec();
    let total = pixels.len();

    for &i in region.iter().filter(|&&i| i < total) {
        scratch[i] = Color::TRANSPARENT;
    }

    let mut landed = Vec::with_capacity(region.len());
    for &i in region.iter().filter(|&&i| i < total) {
        let (x, y) = ((i % width as usize) as i32, (i / width as usize) as i32);
        let (nx, ny) = map(x, y);
        if nx < 0 || ny < 0 || nx >= w || ny >= h {
            continue;
        }
        let dst = nx as usize + ny as usize * width as usize;
        scratch[dst] = pixels[i];
        landed.push(dst);
    }
    landed.sort_unstable();
    landed.dedup();

    Moved {
        pixels: scratch,
        region: landed,
    }
}

/// Flip or rotate `region` within its own bounding box.
pub fn apply_transform(
    pixels: &[Color],
    width: u16,
    height: u16,
    region: &[usize],
    transform: Transform,
) -> Option<Moved> {
    let (x0, y0, x1, y1) = bounds_of(region.iter().copied(), width)?;
    let moved = match transform {
        Transform::FlipHorizontal => {
            move_region(pixels, width, height, region, |x, y| (x0 + x1 - x, y))
        }
        Transform::FlipVertical => {
            move_region(pixels, width, height, region, |x, y| (x, y0 + y1 - y))
        }
        Transform::Rotate90 => {
            let (bw, bh) = (x1 - x0 + 1, y1 - y0 + 1);
            let nx0 = x0 + (bw - bh) / 2;
            let ny0 = y0 + (bh - bw) / 2;
            move_region(pixels, width, height, region, |x, y| {
                (nx0 + (bh - 1 - (y - y0)), ny0 + (x - x0))
            })
        }
    };
    Some(moved)
}

/// Translate `region` so its bounding box is centered on the canvas.
pub fn center_region(
    pixels: &[Color],
    width: u16,
    height: u16,
    region: &[usize],
    axis: CenterAxis,
) -> Option<Moved> {
    let (x0, y0, x1, y1) = bounds_of(region.iter().copied(), width)?;
    let target_x = (width as i32 - (x1 - x0 + 1)) / 2;
    let target_y = (height as i32 - (y1 - y0 + 1)) / 2;
    let dx = if axis == CenterAxis::Vertical { 0 } else { target_x - x0 };
    let dy = if axis == CenterAxis::Horizontal { 0 } else { target_y - y0 };
    Some(move_region(pixels, width, height, region, |x, y| (x + dx, y + dy)))
}

/// Indices of every pixel that is not fully transparent.
pub fn opaque_region(pixels: &[Color]) -> Vec<usize> {
    pixels
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_transparent())
        .map(|(i, _)| i)
        .collect()
}
