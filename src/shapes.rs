//! Point generators for line, ellipse and rectangle tools. Callers stamp the
//! points onto a layer or draw them as a preview.

/// Inclusive tile window that generated points are clipped to. Generators
/// only walk the part of a shape that falls inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clip {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Clip {
    pub const UNBOUNDED: Clip = Clip {
        x0: i32::MIN,
        y0: i32::MIN,
        x1: i32::MAX,
        y1: i32::MAX,
    };

    /// The whole canvas, or `None` when it has no tiles.
    pub fn canvas(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Clip {
            x0: 0,
            y0: 0,
            x1: width as i32 - 1,
            y1: height as i32 - 1,
        })
    }

    pub fn grow(self, by: i32) -> Self {
        let by = by.max(0);
        Clip {
            x0: self.x0.saturating_sub(by),
            y0: self.y0.saturating_sub(by),
            x1: self.x1.saturating_add(by),
            y1: self.y1.saturating_add(by),
        }
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x0 as i64 && x <= self.x1 as i64 && y >= self.y0 as i64 && y <= self.y1 as i64
    }

    fn span(&self) -> i64 {
        (self.x1 as i64 - self.x0 as i64) + (self.y1 as i64 - self.y0 as i64)
    }
}

/// Bresenham line from `a` to `b`, both endpoints included. Each step moves
/// one tile along the major axis; the minor axis is the rounded exact
/// position, so only the steps inside `clip` are visited.
pub fn line_points(a: (i32, i32), b: (i32, i32), clip: Clip) -> Vec<(i32, i32)> {
    // i64 deltas: the span between two i32 endpoints overflows i32
    let (ax, ay) = (a.0 as i64, a.1 as i64);
    let (dx, dy) = (b.0 as i64 - ax, b.1 as i64 - ay);
    let steps = dx.abs().max(dy.abs());

    let (start, delta, lo, hi) = if dx.abs() >= dy.abs() {
        (ax, dx, clip.x0 as i64, clip.x1 as i64)
    } else {
        (ay, dy, clip.y0 as i64, clip.y1 as i64)
    };
    let (first, last) = if delta >= 0 {
        (lo - start, hi - start)
    } else {
        (start - hi, start - lo)
    };
    let (first, last) = (first.max(0), last.min(steps));
    if first > last {
        return Vec::new();
    }

    let mut points = Vec::with_capacity((last - first + 1).min(1 << 16) as usize);
    for k in first..=last {
        let x = ax + step_offset(k, dx, steps);
        let y = ay + step_offset(k, dy, steps);
        if clip.contains(x, y) {
            points.push((x as i32, y as i32));
        }
    }
    points
}

/// `k * delta / steps`, rounded half up.
fn step_offset(k: i64, delta: i64, steps: i64) -> i64 {
    if steps == 0 {
        return 0;
    }
    let n = k as i128 * delta as i128;
    let d = steps as i128;
    (2 * n + d).div_euclid(2 * d) as i64
}

/// Half-width of the square stamped at each point of a line of `thickness`.
/// The square's side is `2 * (thickness / 2) + 1`.
pub fn stamp_half_width(thickness: u32) -> i32 {
    (thickness / 2) as i32
}

/// Points of a `(2 * half + 1)` square centered on `center`, within `clip`.
pub fn square_points(center: (i32, i32), half: i32, clip: Clip) -> impl Iterator<Item = (i32, i32)> {
    let half = half.max(0);
    let x0 = center.0.saturating_sub(half).max(clip.x0);
    let x1 = center.0.saturating_add(half).min(clip.x1);
    let y0 = center.1.saturating_sub(half).max(clip.y0);
    let y1 = center.1.saturating_add(half).min(clip.y1);
    (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
}

/// Outline of the rectangle spanned by two corners.
pub fn rect_outline_points(a: (i32, i32), b: (i32, i32), clip: Clip) -> Vec<(i32, i32)> {
    let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
    let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
    let (cx0, cx1) = (x0.max(clip.x0), x1.min(clip.x1));
    let (cy0, cy1) = (y0.max(clip.y0), y1.min(clip.y1));

    let mut points = Vec::new();
    for y in cy0..=cy1 {
        if y == y0 || y == y1 {
            points.extend((cx0..=cx1).map(|x| (x, y)));
            continue;
        }
        if (cx0..=cx1).contains(&x0) {
            points.push((x0, y));
        }
        if x1 != x0 && (cx0..=cx1).contains(&x1) {
            points.push((x1, y));
        }
    }
    points
}

/// Every point inside the rectangle spanned by two corners.
pub fn rect_fill_points(a: (i32, i32), b: (i32, i32), clip: Clip) -> Vec<(i32, i32)> {
    let x0 = a.0.min(b.0).max(clip.x0);
    let x1 = a.0.max(b.0).min(clip.x1);
    let y0 = a.1.min(b.1).max(clip.y0);
    let y1 = a.1.max(b.1).min(clip.y1);
    (y0..=y1).flat_map(|y| (x0..=x1).map(move |x| (x, y))).collect()
}

/// Midpoint ellipse inscribed in the box spanned by two corners.
///
/// Ellipses whose perimeter dwarfs `clip` are traced per clip row and column
/// instead, so the cost follows the window rather than the radii.
pub fn ellipse_points(a: (i32, i32), b: (i32, i32), clip: Clip) -> Vec<(i32, i32)> {
    let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
    let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
    let rx = (x1 as i64 - x0 as i64) / 2;
    let ry = (y1 as i64 - y0 as i64) / 2;

    if rx == 0 || ry == 0 {
        return line_points((x0, y0), (x1, y1), clip);
    }

    let center = (x0 as i64 + rx, y0 as i64 + ry);
    let mut points = if rx + ry > 2 * clip.span() + 16 {
        traced_ellipse(center, rx, ry, clip)
    } else {
        midpoint_ellipse(center, rx, ry, clip)
    };
    points.sort_unstable();
    points.dedup();
    points
}

fn midpoint_ellipse((xc, yc): (i64, i64), rx: i64, ry: i64, clip: Clip) -> Vec<(i32, i32)> {
    let mut points = Vec::new();
    let mut plot4 = |x: i64, y: i64| {
        for (px, py) in [(xc + x, yc + y), (xc - x, yc + y), (xc + x, yc - y), (xc - x, yc - y)] {
            if clip.contains(px, py) {
                points.push((px as i32, py as i32));
            }
        }
    };

    // Decision terms reach rx^2 * ry, past i64 for wide boxes.
    let rx2 = rx as i128 * rx as i128;
    let ry2 = ry as i128 * ry as i128;
    let mut x = 0i64;
    let mut y = ry;
    let mut dx: i128 = 0;
    let mut dy: i128 = 2 * rx2 * y as i128;

    // Region 1: slope shallower than -1. Decision values are scaled by 4 to
    // stay in integers.
    let mut d1 = 4 * ry2 - 4 * rx2 * ry as i128 + rx2;
    while dx < dy {
        plot4(x, y);
        x += 1;
        dx += 2 * ry2;
        if d1 < 0 {
            d1 += 4 * (dx + ry2);
        } else {
            y -= 1;
            dy -= 2 * rx2;
            d1 += 4 * (dx - dy + ry2);
        }
    }

    // Region 2: steep part down to the horizontal axis.
    let (xw, yw) = (x as i128, y as i128);
    let mut d2 = ry2 * (2 * xw + 1) * (2 * xw + 1) + 4 * rx2 * (yw - 1) * (yw - 1) - 4 * rx2 * ry2;
    while y >= 0 {
        plot4(x, y);
        y -= 1;
        dy -= 2 * rx2;
        if d2 > 0 {
            d2 += 4 * (rx2 - dy);
        } else {
            x += 1;
            dx += 2 * ry2;
            d2 += 4 * (dx - dy + rx2);
        }
    }
    points
}

/// Sample the ellipse once per clip column and once per clip row.
fn traced_ellipse((xc, yc): (i64, i64), rx: i64, ry: i64, clip: Clip) -> Vec<(i32, i32)> {
    let (rxf, ryf) = (rx as f64, ry as f64);
    let mut points = Vec::new();
    for x in clip.x0..=clip.x1 {
        let t = (x as i64 - xc) as f64 / rxf;
        if t.abs() > 1.0 {
            continue;
        }
        let h = ryf * (1.0 - t * t).sqrt();
        for y in [yc as f64 + h, yc as f64 - h] {
            let y = y.round() as i64;
            if clip.contains(x as i64, y) {
                points.push((x, y as i32));
            }
        }
    }
    for y in clip.y0..=clip.y1 {
        let t = (y as i64 - yc) as f64 / ryf;
        if t.abs() > 1.0 {
            continue;
        }
        let w = rxf * (1.0 - t * t).sqrt();
        for x in [xc as f64 + w, xc as f64 - w] {
            let x = x.round() as i64;
            if clip.contains(x, y as i64) {
                points.push((x as i32, y));
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endpoints_and_continuity() {
        let points = line_points((0, 0), (7, 3), Clip::UNBOUNDED);
        assert_eq!(points.first(), Some(&(0, 0)));
        assert_eq!(points.last(), Some(&(7, 3)));
        assert_eq!(points.len(), 8);
        for w in points.windows(2) {
            assert!((w[1].0 - w[0].0).abs() <= 1);
            assert!((w[1].1 - w[0].1).abs() <= 1);
        }
    }

    #[test]
    fn test_line_reverse_and_single_point() {
        assert_eq!(line_points((3, 3), (3, 3), Clip::UNBOUNDED), vec![(3, 3)]);
        let back = line_points((5, 0), (0, 0), Clip::UNBOUNDED);
        assert_eq!(back.len(), 6);
        assert_eq!(back.last(), Some(&(0, 0)));
    }

    #[test]
    fn test_stamp_side_is_odd() {
        assert_eq!(square_points((0, 0), stamp_half_width(1), Clip::UNBOUNDED).count(), 1);
        assert_eq!(square_points((0, 0), stamp_half_width(2), Clip::UNBOUNDED).count(), 9);
        assert_eq!(square_points((0, 0), stamp_half_width(3), Clip::UNBOUNDED).count(), 9);
        assert_eq!(square_points((0, 0), stamp_half_width(4), Clip::UNBOUNDED).count(), 25);
    }

    #[test]
    fn test_rect_outline() {
        let points = rect_outline_points((4, 4), (0, 0), Clip::UNBOUNDED);
        assert_eq!(points.len(), 16);
        assert!(!points.contains(&(2, 2)));
        assert!(points.contains(&(4, 0)));
        assert_eq!(rect_fill_points((0, 0), (4, 4), Clip::UNBOUNDED).len(), 25);
    }

    #[test]
    fn test_ellipse_is_symmetric_and_touches_box() {
        let points = ellipse_points((0, 0), (10, 6), Clip::UNBOUNDED);
        assert!(points.contains(&(5, 0)));
        assert!(points.contains(&(5, 6)));
        assert!(points.contains(&(0, 3)));
        assert!(points.contains(&(10, 3)));
        for &(x, y) in &points {
            assert!(points.contains(&(10 - x, y)));
            assert!(points.contains(&(x, 6 - y)));
            assert!((0..=10).contains(&x) && (0..=6).contains(&y));
        }
    }

    #[test]
    fn test_degenerate_ellipse_is_a_line() {
        assert_eq!(ellipse_points((0, 2), (5, 2), Clip::UNBOUNDED).len(), 6);
    }

    #[test]
    fn test_extreme_line_is_clipped() {
        let clip = Clip::canvas(4, 4).unwrap();
        let points = line_points((-2_000_000_000, 1), (2_000_000_000, 1), clip);
        assert_eq!(points, vec![(0, 1), (1, 1), (2, 1), (3, 1)]);

        let diagonal = line_points((i32::MIN, i32::MIN), (i32::MAX, i32::MAX), clip);
        assert!(diagonal.len() <= 4);
        assert!(diagonal.iter().all(|&(x, y)| clip.contains(x as i64, y as i64)));

        assert!(line_points((-10, -10), (-5, -1), clip).is_empty());
    }

    #[test]
    fn test_clipped_line_matches_unclipped() {
        let clip = Clip { x0: 2, y0: 0, x1: 5, y1: 9 };
        let full: Vec<_> = line_points((0, 0), (9, 4), Clip::UNBOUNDED)
            .into_iter()
            .filter(|&(x, y)| clip.contains(x as i64, y as i64))
            .collect();
        assert_eq!(line_points((0, 0), (9, 4), clip), full);
    }

    #[test]
    fn test_extreme_rects_are_clipped() {
        let clip = Clip::canvas(4, 3).unwrap();
        assert_eq!(rect_fill_points((i32::MIN, i32::MIN), (i32::MAX, i32::MAX), clip).len(), 12);
        assert!(rect_outline_points((i32::MIN, i32::MIN), (i32::MAX, i32::MAX), clip).is_empty());
        let edge = rect_outline_points((-5, 1), (1_000_000_000, 9), clip);
        assert_eq!(edge, vec![(0, 1), (1, 1), (2, 1), (3, 1)]);
        assert_eq!(square_points((0, 0), i32::MAX, clip).count(), 12);
    }

    #[test]
    fn test_extreme_ellipse_is_clipped() {
        let clip = Clip::canvas(4, 4).unwrap();
        let huge = ellipse_points((-1_000_000_000, -1_000_000_000), (1_000_000_000, 1_000_000_000), clip);
        assert!(huge.is_empty());

        // left arc of a huge ellipse passes through the window
        let arc = ellipse_points((0, -1_000_000_000), (2_000_000_000, 1_000_000_002), clip);
        assert!(arc.contains(&(0, 1)));
        assert!(arc.iter().all(|&(x, y)| clip.contains(x as i64, y as i64)));

        let full = ellipse_points((i32::MIN, i32::MIN), (i32::MAX, i32::MAX), Clip::canvas(8, 8).unwrap());
        assert!(full.is_empty());
    }

    #[test]
    fn test_clipped_ellipse_matches_unclipped() {
        let clip = Clip::canvas(6, 4).unwrap();
        let full: Vec<_> = ellipse_points((0, 0), (10, 6), Clip::UNBOUNDED)
            .into_iter()
            .filter(|&(x, y)| clip.contains(x as i64, y as i64))
            .collect();
        assert_eq!(ellipse_points((0, 0), (10, 6), clip), full);
    }
}
