use std::borrow::Cow;

use rayon::prelude::*;

use crate::color::Color;
use crate::error::CanvasResult;
use crate::layer::LayerStack;

/// Premultiplied running total for one output pixel.
#[derive(Clone, Copy, Default)]
struct Accum {
    rgb: [f32; 3],
    alpha: f32,
}

/// Read-only view of the layers that contribute to a composite, taken once
/// so the per-pixel pass never touches layer storage.
struct CompositeView<'a> {
    layers: Vec<(Cow<'a, [Color]>, f32)>,
}

impl<'a> CompositeView<'a> {
    fn new(stack: &'a LayerStack) -> CanvasResult<Self> {
        let mut layers = Vec::new();
        for layer in stack.iter().filter(|l| l.is_shown()) {
            layers.push((layer.pixels()?, layer.opacity as f32 / 255.0));
        }
        Ok(Self { layers })
    }

    fn accumulate(&self, i: usize) -> Accum {
        let mut acc = Accum::default();
        for (pixels, opacity) in &self.layers {
            let Some(p) = pixels.get(i) else {
                continue;
            };
            let a = p.a() as f32 / 255.0 * opacity;
            if a <= 0.0 {
                continue;
            }
            let src = [p.r(), p.g(), p.b()];
            for c in 0..3 {
                acc.rgb[c] = src[c] as f32 / 255.0 * a + acc.rgb[c] * (1.0 - a);
            }
            acc.alpha = a + acc.alpha * (1.0 - a);
        }
        acc
    }

    /// Composite every pixel over a background chosen per `(x, y)`.
    fn render(&self, width: u16, height: u16, background: impl Fn(usize, usize) -> Color + Sync) -> Vec<Color> {
        let row_len = width as usize;
        let mut out = vec![Color::TRANSPARENT; row_len * height as usize];
        if out.is_empty() {
            return out;
        }
        out.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, dst) in row.iter_mut().enumerate() {
                    let acc = self.accumulate(x + y * row_len);
                    let bg = background(x, y);
                    let bg = [bg.r(), bg.g(), bg.b()];
                    let mut rgb = [0u8; 3];
                    for c in 0..3 {
                        let v = acc.rgb[c] * 255.0 + bg[c] as f32 * (1.0 - acc.alpha);
                        rgb[c] = v.round().clamp(0.0, 255.0) as u8;
                    }
                    *dst = Color::rgb(rgb[0], rgb[1], rgb[2]);
                }
            });
        out
    }
}

/// Display buffer: all shown layers bottom to top, over a checkerboard that
/// alternates on `(x + y) % 2`.
pub fn composite(stack: &LayerStack, light: Color, dark: Color) -> CanvasResult<Vec<Color>> {
    let view = CompositeView::new(stack)?;
    Ok(view.render(stack.width(), stack.height(), |x, y| {
        if (x + y) % 2 == 0 { light } else { dark }
    }))
}

/// Flattened image over a solid opaque background, used for export.
pub fn flatten(stack: &LayerStack, background: Color) -> CanvasResult<Vec<Color>> {
    let view = CompositeView::new(stack)?;
    Ok(view.render(stack.width(), stack.height(), |_, _| background))
}

/// Straight-alpha "over" of `top` at `opacity` onto `bottom`.
pub fn blend_over(bottom: Color, top: Color, opacity: u8) -> Color {
    let at = top.a() as f32 / 255.0 * opacity as f32 / 255.0;
    if at <= 0.0 {
        return bottom;
    }
    let ab = bottom.a() as f32 / 255.0;
    let out_a = at + ab * (1.0 - at);
    if out_a <= 0.0 {
        return Color::TRANSPARENT;
    }
    let ch = |t: u8, b: u8| {
        ((t as f32 * at + b as f32 * ab * (1.0 - at)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color::rgba(
        ch(top.r(), bottom.r()),
        ch(top.g(), bottom.g()),
        ch(top.b(), bottom.b()),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}
