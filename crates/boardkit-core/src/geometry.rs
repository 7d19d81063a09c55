//! Pure geometry helpers: union bounds, intersection tests, grid snapping
//! and the canonical anchor-point formulas.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// The nine canonical attachment locations on an element's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anchor {
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// World-space position of an anchor on a bounding box.
pub fn anchor_position(bounds: Rect, anchor: Anchor) -> Point {
    let cx = (bounds.x0 + bounds.x1) / 2.0;
    let cy = (bounds.y0 + bounds.y1) / 2.0;
    match anchor {
        Anchor::Center => Point::new(cx, cy),
        Anchor::Top => Point::new(cx, bounds.y0),
        Anchor::Bottom => Point::new(cx, bounds.y1),
        Anchor::Left => Point::new(bounds.x0, cy),
        Anchor::Right => Point::new(bounds.x1, cy),
        Anchor::TopLeft => Point::new(bounds.x0, bounds.y0),
        Anchor::TopRight => Point::new(bounds.x1, bounds.y0),
        Anchor::BottomLeft => Point::new(bounds.x0, bounds.y1),
        Anchor::BottomRight => Point::new(bounds.x1, bounds.y1),
    }
}

/// Union bounding box of an iterator of rects.
pub fn union_bounds<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    let mut result: Option<Rect> = None;
    for rect in rects {
        result = Some(match result {
            Some(r) => r.union(rect),
            None => rect,
        });
    }
    result
}

/// Axis-aligned box intersection test (touching edges count as intersecting).
pub fn bounds_intersect(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Point containment test.
pub fn point_in_bounds(p: Point, bounds: Rect) -> bool {
    bounds.contains(p)
}

/// Area of the overlap between two boxes (0.0 when disjoint).
pub fn overlap_area(a: Rect, b: Rect) -> f64 {
    let overlap = a.intersect(b);
    if overlap.width() <= 0.0 || overlap.height() <= 0.0 {
        0.0
    } else {
        overlap.area()
    }
}

/// Snap a point to the nearest grid intersection. Identity when disabled.
pub fn snap_point_to_grid(point: Point, grid_size: f64, enabled: bool) -> Point {
    if !enabled || grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_positions() {
        let b = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(anchor_position(b, Anchor::Center), Point::new(50.0, 25.0));
        assert_eq!(anchor_position(b, Anchor::Top), Point::new(50.0, 0.0));
        assert_eq!(anchor_position(b, Anchor::Bottom), Point::new(50.0, 50.0));
        assert_eq!(anchor_position(b, Anchor::Left), Point::new(0.0, 25.0));
        assert_eq!(anchor_position(b, Anchor::Right), Point::new(100.0, 25.0));
        assert_eq!(
            anchor_position(b, Anchor::BottomRight),
            Point::new(100.0, 50.0)
        );
    }

    #[test]
    fn test_union_bounds_disjoint() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(100.0, 50.0, 120.0, 80.0);
        let union = union_bounds([a, b]).unwrap();
        assert_eq!(union, Rect::new(0.0, 0.0, 120.0, 80.0));
    }

    #[test]
    fn test_union_bounds_overlapping() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(25.0, 25.0, 75.0, 75.0);
        let union = union_bounds([a, b]).unwrap();
        assert_eq!(union, Rect::new(0.0, 0.0, 75.0, 75.0));
    }

    #[test]
    fn test_union_bounds_empty() {
        assert!(union_bounds(std::iter::empty::<Rect>()).is_none());
    }

    #[test]
    fn test_bounds_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(bounds_intersect(a, Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(bounds_intersect(a, Rect::new(10.0, 0.0, 20.0, 10.0))); // touching
        assert!(!bounds_intersect(a, Rect::new(11.0, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_overlap_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert!((overlap_area(a, b) - 25.0).abs() < f64::EPSILON);
        assert_eq!(overlap_area(a, Rect::new(20.0, 20.0, 30.0, 30.0)), 0.0);
    }

    #[test]
    fn test_snap_point_to_grid() {
        let p = snap_point_to_grid(Point::new(23.0, 47.0), 20.0, true);
        assert_eq!(p, Point::new(20.0, 40.0));
        let p = snap_point_to_grid(Point::new(23.0, 47.0), 20.0, false);
        assert_eq!(p, Point::new(23.0, 47.0));
    }
}
