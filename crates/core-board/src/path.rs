//! Polyline path data in `M x y L x y …` form.

use core_geom::Point;

/// Vertex list of a stroked polyline. The wire form is the SVG-like `d`
/// attribute `M x0 y0 L x1 y1 …`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathData {
    points: Vec<Point>,
}

impl PathData {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Parse a `d` attribute. Returns `None` for anything that is not a
    /// well-formed `M x y (L x y)*` polyline.
    pub fn parse(d: &str) -> Option<Self> {
        let mut tokens = d.split_whitespace();
        if tokens.next()? != "M" {
            return None;
        }
        let mut points = Vec::new();
        let x: f64 = tokens.next()?.parse().ok()?;
        let y: f64 = tokens.next()?.parse().ok()?;
        points.push(Point::new(x, y));
        loop {
            match tokens.next() {
                None => break,
                Some("L") => {
                    let x: f64 = tokens.next()?.parse().ok()?;
                    let y: f64 = tokens.next()?.parse().ok()?;
                    points.push(Point::new(x, y));
                }
                Some(_) => return None,
            }
        }
        Some(Self { points })
    }

    pub fn to_d(&self) -> String {
        let mut out = String::new();
        for (i, p) in self.points.iter().enumerate() {
            if i == 0 {
                out.push_str(&format!("M {} {}", p.x, p.y));
            } else {
                out.push_str(&format!(" L {} {}", p.x, p.y));
            }
        }
        out
    }

    pub fn push(&mut self, p: Point) {
        self.points.push(p);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Consecutive vertex pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Axis-aligned bounds as (top-left, bottom-right); `None` when empty.
    pub fn bbox(&self) -> Option<(Point, Point)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }
}
