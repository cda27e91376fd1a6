//! Segment and rectangle intersection helpers for the whiteboard.
//!
//! All coordinates are drawing-area (screen) coordinates: x grows rightward,
//! y grows downward, so a rectangle is given by its top-left and bottom-right
//! corners. Colinear and parallel segments are treated as non-intersecting.

/// A point in drawing-area coordinates.
pub type Point = euclid::default::Point2D<f64>;

pub fn point(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// Parametric segment/segment intersection. Returns false for parallel or
/// colinear segments.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let denom = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);
    if denom == 0.0 {
        return false;
    }
    let ua = ((b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x)) / denom;
    let ub = ((a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x)) / denom;
    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// True iff the segment `l1`→`l2` crosses any of the four sides of the
/// rectangle with top-left `r1` and bottom-right `r2`. A segment entirely
/// inside the rectangle crosses no side and returns false.
pub fn segment_intersects_rect(l1: Point, l2: Point, r1: Point, r2: Point) -> bool {
    let tr = point(r2.x, r1.y);
    let bl = point(r1.x, r2.y);
    segments_intersect(l1, l2, r1, tr)
        || segments_intersect(l1, l2, tr, r2)
        || segments_intersect(l1, l2, r2, bl)
        || segments_intersect(l1, l2, bl, r1)
}

/// Axis-aligned inclusive containment test against the rectangle with
/// top-left `r1` and bottom-right `r2`.
pub fn point_in_rect(p: Point, r1: Point, r2: Point) -> bool {
    r1.x <= p.x && p.x <= r2.x && r1.y <= p.y && p.y <= r2.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_diagonals_intersect() {
        assert!(segments_intersect(
            point(0.0, 0.0),
            point(10.0, 10.0),
            point(0.0, 10.0),
            point(10.0, 0.0)
        ));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(
            point(0.0, 0.0),
            point(10.0, 0.0),
            point(0.0, 1.0),
            point(10.0, 1.0)
        ));
    }

    #[test]
    fn colinear_overlap_is_treated_as_non_intersecting() {
        assert!(!segments_intersect(
            point(0.0, 0.0),
            point(10.0, 0.0),
            point(5.0, 0.0),
            point(15.0, 0.0)
        ));
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        assert!(!segments_intersect(
            point(0.0, 0.0),
            point(1.0, 1.0),
            point(5.0, 5.0),
            point(6.0, 4.0)
        ));
    }

    #[test]
    fn intersection_is_commutative_in_segments_and_endpoints() {
        let (a1, a2) = (point(0.0, 0.0), point(10.0, 10.0));
        let (b1, b2) = (point(0.0, 10.0), point(10.0, 0.0));
        let hit = segments_intersect(a1, a2, b1, b2);
        assert_eq!(hit, segments_intersect(b1, b2, a1, a2));
        assert_eq!(hit, segments_intersect(a2, a1, b2, b1));

        let (c1, c2) = (point(20.0, 20.0), point(30.0, 20.5));
        let miss = segments_intersect(a1, a2, c1, c2);
        assert_eq!(miss, segments_intersect(c1, c2, a1, a2));
        assert_eq!(miss, segments_intersect(a2, a1, c2, c1));
    }

    #[test]
    fn segment_crossing_a_side_intersects_the_rect() {
        let r1 = point(2.0, 2.0);
        let r2 = point(8.0, 8.0);
        assert!(segment_intersects_rect(point(0.0, 5.0), point(5.0, 5.0), r1, r2));
        // fully inside: no side crossed
        assert!(!segment_intersects_rect(point(3.0, 3.0), point(7.0, 7.0), r1, r2));
        // fully outside
        assert!(!segment_intersects_rect(point(0.0, 0.0), point(1.0, 1.0), r1, r2));
    }

    #[test]
    fn point_in_rect_is_inclusive() {
        let r1 = point(2.0, 2.0);
        let r2 = point(8.0, 8.0);
        assert!(point_in_rect(point(2.0, 2.0), r1, r2));
        assert!(point_in_rect(point(8.0, 8.0), r1, r2));
        assert!(point_in_rect(point(5.0, 3.0), r1, r2));
        assert!(!point_in_rect(point(1.9, 5.0), r1, r2));
        assert!(!point_in_rect(point(5.0, 8.1), r1, r2));
    }
}
