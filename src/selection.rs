use std::collections::BTreeSet;

use crate::color::{color_difference, threshold_to_distance, Color};

/// How a new region combines with the existing selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectMode {
    #[default]
    Replace,
    Add,
}

/// Set of selected tiles, addressed as `x + y * width`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    width: u16,
    height: u16,
    indices: BTreeSet<usize>,
}

impl Selection {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            indices: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// True when `index` may be touched: the selection is empty or holds it.
    pub fn allows(&self, index: usize) -> bool {
        self.indices.is_empty() || self.indices.contains(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn select_all(&mut self) {
        let total = self.width as usize * self.height as usize;
        self.indices = (0..total).collect();
    }

    pub fn invert(&mut self) {
        let total = self.width as usize * self.height as usize;
        self.indices = (0..total).filter(|i| !self.indices.contains(i)).collect();
    }

    /// Replace or extend the selection with `indices`, dropping any that
    /// fall outside the canvas.
    pub fn apply(&mut self, indices: impl IntoIterator<Item = usize>, mode: SelectMode) {
        let total = self.width as usize * self.height as usize;
        if mode == SelectMode::Replace {
            self.indices.clear();
        }
        self.indices.extend(indices.into_iter().filter(|&i| i < total));
    }

    /// Inclusive `(min_x, min_y, max_x, max_y)` of the selected tiles.
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        bounds_of(self.indices.iter().copied(), self.width)
    }

    /// Select the tiles covered by the box spanned by `a` and `b`, given in
    /// tile units. The min corner is floored and the max corner ceiled.
    pub fn select_rect(&mut self, a: (f32, f32), b: (f32, f32), mode: SelectMode) {
        let x0 = (a.0.min(b.0).floor() as i32).clamp(0, self.width as i32);
        let y0 = (a.1.min(b.1).floor() as i32).clamp(0, self.height as i32);
        let x1 = (a.0.max(b.0).ceil() as i32).clamp(0, self.width as i32);
        let y1 = (a.1.max(b.1).ceil() as i32).clamp(0, self.height as i32);

        let count = (x1 - x0) as usize * (y1 - y0) as usize;
        if count <= 1 {
            if mode == SelectMode::Replace {
                self.clear();
            }
            return;
        }

        let width = self.width as usize;
        let tiles = (y0..y1).flat_map(|y| (x0..x1).map(move |x| x as usize + y as usize * width));
        self.apply(tiles.collect::<Vec<_>>(), mode);
    }

    /// Select tiles whose center lies inside the closed path, plus tiles
    /// whose edges cross it.
    pub fn select_polygon(&mut self, points: &[(f32, f32)], mode: SelectMode) {
        if points.len() < 3 {
            if mode == SelectMode::Replace {
                self.clear();
            }
            return;
        }

        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for &(x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let x0 = (min_x.floor() as i32).clamp(0, self.width as i32);
        let y0 = (min_y.floor() as i32).clamp(0, self.height as i32);
        let x1 = (max_x.ceil() as i32).clamp(0, self.width as i32);
        let y1 = (max_y.ceil() as i32).clamp(0, self.height as i32);

        let mut tiles = Vec::new();
        for y in y0..y1 {
            for x in x0..x1 {
                let center = (x as f32 + 0.5, y as f32 + 0.5);
                if point_in_polygon(center, points) || tile_crosses_polygon(x, y, points) {
                    tiles.push(x as usize + y as usize * self.width as usize);
                }
            }
        }
        self.apply(tiles, mode);
    }
}

/// Inclusive bounding box of flat indices on a grid of the given width.
pub fn bounds_of(indices: impl IntoIterator<Item = usize>, width: u16) -> Option<(i32, i32, i32, i32)> {
    if width == 0 {
        return None;
    }
    let w = width as usize;
    let mut bounds: Option<(i32, i32, i32, i32)> = None;
    for i in indices {
        let (x, y) = ((i % w) as i32, (i / w) as i32);
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

/// Even-odd ray cast.
pub fn point_in_polygon(p: (f32, f32), polygon: &[(f32, f32)]) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > p.1) != (yj > p.1) && p.0 < (xj - xi) * (p.1 - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn tile_crosses_polygon(x: i32, y: i32, polygon: &[(f32, f32)]) -> bool {
    let (x0, y0, x1, y1) = (x as f32, y as f32, x as f32 + 1.0, y as f32 + 1.0);
    let edges = [
        ((x0, y0), (x1, y0)),
        ((x1, y0), (x1, y1)),
        ((x1, y1), (x0, y1)),
        ((x0, y1), (x0, y0)),
    ];
    let n = polygon.len();
    (0..n).any(|i| {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        edges.iter().any(|&(c, d)| segments_intersect(a, b, c, d))
    })
}

fn cross(o: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn on_segment(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

pub fn segments_intersect(a: (f32, f32), b: (f32, f32), c: (f32, f32), d: (f32, f32)) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

/// 4-connected flood from `seed`, collecting every tile whose color is within
/// `threshold` (0-100) of the seed color. When `restrict` is non-empty only
/// its tiles are visited.
pub fn flood_region(
    pixels: &[Color],
    width: u16,
    height: u16,
    seed: (i32, i32),
    threshold: u8,
    restrict: Option<&Selection>,
) -> Vec<usize> {
    let (w, h) = (width as i32, height as i32);
    if w == 0 || h == 0 || seed.0 < 0 || seed.1 < 0 || seed.0 >= w || seed.1 >= h {
        return Vec::new();
    }
    if pixels.len() != w as usize * h as usize {
        log::error!(
            "Flood fill over {} pixels on a {}x{} grid",
            pixels.len(),
            width,
            height
        );
        return Vec::new();
    }

    let index = |x: i32, y: i32| x as usize + y as usize * w as usize;
    let seed_color = pixels[index(seed.0, seed.1)];
    let limit = threshold_to_distance(threshold);
    let restrict = restrict.filter(|s| !s.is_empty());

    let mut region = Vec::new();
    let mut visited = vec![false; pixels.len()];
    let mut stack = vec![seed];

    while let Some((x, y)) = stack.pop() {
        if x < 0 || y < 0 || x >= w || y >= h {
            continue;
        }
        let i = index(x, y);
        if visited[i] {
            continue;
        }
        visited[i] = true;

        if let Some(sel) = restrict {
            if !sel.contains(i) {
                continue;
            }
        }
        if color_difference(pixels[i], seed_color) > limit {
            continue;
        }
        region.push(i);

        stack.push((x - 1, y));
        stack.push((x + 1, y));
        stack.push((x, y - 1));
        stack.push((x, y + 1));
    }

    region
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_selection_snaps_to_grid() {
        let mut sel = Selection::new(10, 10);
        sel.select_rect((1.5, 1.2), (3.2, 2.9), SelectMode::Replace);
        // x 1..4, y 1..3
        assert_eq!(sel.len(), 6);
        assert!(sel.contains(1 + 10));
        assert!(sel.contains(3 + 2 * 10));
        assert!(!sel.contains(4 + 2 * 10));
        assert_eq!(sel.bounds(), Some((1, 1, 3, 2)));
    }

    #[test]
    fn test_single_tile_rect_clears() {
        let mut sel = Selection::new(10, 10);
        sel.select_all();
        sel.select_rect((2.0, 2.0), (3.0, 3.0), SelectMode::Replace);
        assert!(sel.is_empty());
    }

    #[test]
    fn test_rect_clipped_to_canvas() {
        let mut sel = Selection::new(4, 4);
        sel.select_rect((-5.0, -5.0), (50.0, 2.0), SelectMode::Replace);
        assert_eq!(sel.len(), 8);
    }

    #[test]
    fn test_add_mode_extends() {
        let mut sel = Selection::new(8, 8);
        sel.select_rect((0.0, 0.0), (2.0, 2.0), SelectMode::Replace);
        sel.select_rect((4.0, 4.0), (6.0, 6.0), SelectMode::Add);
        assert_eq!(sel.len(), 8);
    }

    #[test]
    fn test_invert_and_all() {
        let mut sel = Selection::new(3, 3);
        sel.apply([0, 4, 99], SelectMode::Replace);
        assert_eq!(sel.len(), 2);
        sel.invert();
        assert_eq!(sel.len(), 7);
        assert!(!sel.contains(4));
        sel.select_all();
        assert_eq!(sel.len(), 9);
    }

    #[test]
    fn test_polygon_square_interior() {
        let mut sel = Selection::new(10, 10);
        let square = [(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0)];
        sel.select_polygon(&square, SelectMode::Replace);
        assert_eq!(sel.len(), 16);
        assert_eq!(sel.bounds(), Some((2, 2, 5, 5)));
    }

    #[test]
    fn test_polygon_catches_partial_edge_tiles() {
        let mut sel = Selection::new(10, 10);
        // thin sliver whose interior contains no tile centers
        let sliver = [(1.1, 1.1), (7.9, 1.2), (7.9, 1.3)];
        sel.select_polygon(&sliver, SelectMode::Replace);
        assert!(!sel.is_empty());
        assert!(sel.contains(1 + 10));
        assert!(sel.contains(7 + 10));
    }

    #[test]
    fn test_polygon_too_short_clears() {
        let mut sel = Selection::new(4, 4);
        sel.select_all();
        sel.select_polygon(&[(0.0, 0.0), (2.0, 2.0)], SelectMode::Replace);
        assert!(sel.is_empty());
    }

    #[test]
    fn test_point_in_polygon() {
        let tri = [(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)];
        assert!(point_in_polygon((1.0, 1.0), &tri));
        assert!(!point_in_polygon((3.0, 3.0), &tri));
    }

    #[test]
    fn test_segments_intersect() {
        assert!(segments_intersect((0.0, 0.0), (2.0, 2.0), (0.0, 2.0), (2.0, 0.0)));
        assert!(!segments_intersect((0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)));
        assert!(segments_intersect((0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (3.0, 0.0)));
    }

    fn two_regions() -> Vec<Color> {
        // left half red, right half blue, 6x4
        let mut pixels = vec![Color::rgb(255, 0, 0); 24];
        for y in 0..4 {
            for x in 3..6 {
                pixels[x + y * 6] = Color::rgb(0, 0, 255);
            }
        }
        pixels
    }

    #[test]
    fn test_flood_selects_connected_region_only() {
        let pixels = two_regions();
        for seed in [(0, 0), (1, 2), (2, 3)] {
            let mut region = flood_region(&pixels, 6, 4, seed, 0, None);
            region.sort();
            let expected: Vec<usize> = (0..4)
                .flat_map(|y| (0..3).map(move |x| x + y * 6))
                .collect();
            assert_eq!(region, expected);
        }
    }

    #[test]
    fn test_flood_threshold_zero_requires_exact_match() {
        let mut pixels = vec![Color::rgb(100, 100, 100); 9];
        pixels[1] = Color::rgb(101, 100, 100);
        let region = flood_region(&pixels, 3, 3, (0, 0), 0, None);
        assert_eq!(region.len(), 8);
        assert!(!region.contains(&1));
        let region = flood_region(&pixels, 3, 3, (0, 0), 1, None);
        assert_eq!(region.len(), 9);
    }

    #[test]
    fn test_flood_respects_restriction() {
        let pixels = vec![Color::BLACK; 16];
        let mut sel = Selection::new(4, 4);
        sel.select_rect((0.0, 0.0), (2.0, 2.0), SelectMode::Replace);
        let region = flood_region(&pixels, 4, 4, (0, 0), 0, Some(&sel));
        assert_eq!(region.len(), 4);
        assert!(flood_region(&pixels, 4, 4, (3, 3), 0, Some(&sel)).is_empty());
    }

    #[test]
    fn test_flood_degenerate_inputs() {
        assert!(flood_region(&[], 0, 0, (0, 0), 0, None).is_empty());
        assert!(flood_region(&[Color::BLACK], 1, 1, (5, 0), 0, None).is_empty());
        assert!(flood_region(&[Color::BLACK], 1, 1, (-1, 0), 0, None).is_empty());
    }
}
