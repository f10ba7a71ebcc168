use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::CanvasResult;
use crate::shapes::{square_points, Clip};

/// Upper bound on interpolation steps along one stroke segment.
const MAX_STROKE_STEPS: f64 = (1u64 << 40) as f64;

#[derive(Clone, Debug)]
pub struct Brush {
    pub size: u32,
    pub color: Color,
}

impl Brush {
    pub fn new(size: u32, color: Color) -> Self {
        Self { size, color }
    }

    /// Half-width of the stamped square; grows by 4 tiles at full pressure.
    pub fn radius(&self, pressure: f32) -> i32 {
        (self.size as f32 / 2.0 + pressure.clamp(0.0, 1.0) * 4.0) as i32
    }

    pub fn stamp(&self, canvas: &mut Canvas, pos: (f32, f32), pressure: f32, erase: bool) -> CanvasResult<()> {
        self.stroke(canvas, pos, pos, pressure, erase)
    }

    /// Stamp along the segment from `from` to `to`. With `erase` set the
    /// tiles are cleared to transparent instead of painted.
    pub fn stroke(
        &self,
        canvas: &mut Canvas,
        from: (f32, f32),
        to: (f32, f32),
        pressure: f32,
        erase: bool,
    ) -> CanvasResult<()> {
        let Some(bounds) = Clip::canvas(canvas.width(), canvas.height()) else {
            return Ok(());
        };
        let radius = self.radius(pressure);
        let color = if erase { Color::TRANSPARENT } else { self.color };
        let points: Vec<(i32, i32)> = stroke_points(from, to, bounds.grow(radius.saturating_add(1)))
            .into_iter()
            .flat_map(|(x, y)| square_points((x.floor() as i32, y.floor() as i32), radius, bounds))
            .collect();
        canvas.plot_points(&points, color)
    }
}

/// Evenly spaced points from `from` to `to`, `ceil(distance) + 1` of them
/// for an unclipped segment. Only the points that land in `clip` are listed.
pub fn stroke_points(from: (f32, f32), to: (f32, f32), clip: Clip) -> Vec<(f32, f32)> {
    let (fx, fy) = (from.0 as f64, from.1 as f64);
    let (dx, dy) = (to.0 as f64 - fx, to.1 as f64 - fy);
    let dist = (dx * dx + dy * dy).sqrt();
    if !dist.is_finite() || !fx.is_finite() || !fy.is_finite() {
        return Vec::new();
    }
    let steps = dist.ceil().min(MAX_STROKE_STEPS);
    if steps == 0.0 {
        let inside = clip.contains(fx.floor() as i64, fy.floor() as i64);
        return if inside { vec![from] } else { Vec::new() };
    }

    let Some((t0, t1)) = clip_segment((fx, fy), (dx, dy), clip) else {
        return Vec::new();
    };
    // One extra step each side absorbs rounding at the window edge.
    let first = ((t0 * steps).ceil() - 1.0).max(0.0) as u64;
    let last = ((t1 * steps).floor() + 1.0).min(steps) as u64;
    (first..=last)
        .map(|i| {
            let t = i as f64 / steps;
            ((fx + dx * t) as f32, (fy + dy * t) as f32)
        })
        .collect()
}

/// Liang-Barsky: the parameter range of `p + t * d`, `t` in `[0, 1]`, that
/// lies inside the tiles of `clip`.
fn clip_segment(p: (f64, f64), d: (f64, f64), clip: Clip) -> Option<(f64, f64)> {
    let (xmin, xmax) = (clip.x0 as f64, clip.x1 as f64 + 1.0);
    let (ymin, ymax) = (clip.y0 as f64, clip.y1 as f64 + 1.0);
    let edges = [
        (-d.0, p.0 - xmin),
        (d.0, xmax - p.0),
        (-d.1, p.1 - ymin),
        (d.1, ymax - p.1),
    ];
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (dir, room) in edges {
        if dir == 0.0 {
            if room < 0.0 {
                return None;
            }
            continue;
        }
        let r = room / dir;
        if dir < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::selection::SelectMode;

    fn canvas() -> Canvas {
        Canvas::new(16, 16, EditorConfig::default())
    }

    #[test]
    fn test_stroke_points_count() {
        assert_eq!(stroke_points((0.0, 0.0), (0.0, 0.0), Clip::UNBOUNDED).len(), 1);
        assert_eq!(stroke_points((0.0, 0.0), (3.0, 4.0), Clip::UNBOUNDED).len(), 6);
        let pts = stroke_points((0.0, 0.0), (2.5, 0.0), Clip::UNBOUNDED);
        assert_eq!(pts.len(), 4);
        assert_eq!(pts.last(), Some(&(2.5, 0.0)));
    }

    #[test]
    fn test_radius_grows_with_pressure() {
        let brush = Brush::new(4, Color::BLACK);
        assert_eq!(brush.radius(0.0), 2);
        assert_eq!(brush.radius(0.5), 4);
        assert_eq!(brush.radius(1.0), 6);
        assert_eq!(brush.radius(7.0), 6);
    }

    #[test]
    fn test_stroke_paints_and_erases() {
        let mut c = canvas();
        let brush = Brush::new(1, Color::BLACK);
        brush.stroke(&mut c, (1.0, 1.0), (6.0, 1.0), 0.0, false).unwrap();
        for x in 1..=6 {
            assert_eq!(c.pick_color(x, 1), Some(Color::BLACK));
        }
        assert_eq!(c.pick_color(7, 1), Some(Color::TRANSPARENT));
        brush.stamp(&mut c, (3.0, 1.0), 0.0, true).unwrap();
        assert_eq!(c.pick_color(3, 1), Some(Color::TRANSPARENT));
        assert_eq!(c.pick_color(4, 1), Some(Color::BLACK));
    }

    #[test]
    fn test_stroke_clipped_at_edges() {
        let mut c = canvas();
        let brush = Brush::new(4, Color::WHITE);
        brush.stamp(&mut c, (0.0, 0.0), 0.0, false).unwrap();
        assert_eq!(c.pick_color(0, 0), Some(Color::WHITE));
        assert_eq!(c.pick_color(2, 2), Some(Color::WHITE));
        assert_eq!(c.pick_color(3, 3), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_stroke_stays_inside_selection() {
        let mut c = canvas();
        c.select_rect((4.0, 4.0), (8.0, 8.0), SelectMode::Replace);
        let brush = Brush::new(8, Color::WHITE);
        brush.stamp(&mut c, (3.0, 3.0), 1.0, false).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                let inside = (4..8).contains(&x) && (4..8).contains(&y);
                let expected = if inside { Color::WHITE } else { Color::TRANSPARENT };
                assert_eq!(c.pick_color(x, y), Some(expected), "tile ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_stroke_points_skip_outside_window() {
        let clip = Clip::canvas(4, 4).unwrap();
        let pts = stroke_points((-1.0e9, 1.5), (1.0e9, 1.5), clip);
        assert!(!pts.is_empty());
        assert!(pts.len() <= 8);
        assert!(pts.iter().any(|p| p.0 >= 0.0 && p.0 < 1.0));
        assert!(pts.iter().any(|p| p.0 >= 3.0 && p.0 < 4.0));

        assert!(stroke_points((-50.0, -50.0), (-40.0, -1.0), clip).is_empty());
        assert!(stroke_points((f32::NAN, 0.0), (1.0, 1.0), clip).is_empty());
        assert!(stroke_points((f32::MIN, 0.0), (f32::MAX, 0.0), clip).len() <= 4);
    }

    #[test]
    fn test_extreme_stroke_paints_crossed_row() {
        let mut c = Canvas::new(4, 4, EditorConfig::default());
        let brush = Brush::new(1, Color::WHITE);
        brush.stroke(&mut c, (-2.0e9, 1.0), (2.0e9, 1.0), 0.0, false).unwrap();
        for x in 0..4 {
            assert_eq!(c.pick_color(x, 1), Some(Color::WHITE));
            assert_eq!(c.pick_color(x, 0), Some(Color::TRANSPARENT));
        }
        brush.stroke(&mut c, (f32::MIN, f32::MIN), (f32::MAX, f32::MAX), 1.0, true).unwrap();
    }
}
