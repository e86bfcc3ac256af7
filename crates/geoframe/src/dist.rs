use geo::{Coord, Geometry, Intersects, LineString, Polygon};

/// Distance between two points.
#[inline]
fn point_point(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Distance from a point to a segment, via clamped projection onto it.
fn point_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return point_point(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    point_point(p, Coord { x: a.x + t * dx, y: a.y + t * dy })
}

/// A geometry broken down into bare points and boundary segments.
#[derive(Default)]
struct Pieces {
    points: Vec<Coord<f64>>,
    segments: Vec<(Coord<f64>, Coord<f64>)>,
}

impl Pieces {
    fn of(geometry: &Geometry<f64>) -> Self {
        let mut pieces = Self::default();
        pieces.push_geometry(geometry);
        pieces
    }

    fn push_geometry(&mut self, geometry: &Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.points.push(p.0),
            Geometry::MultiPoint(mp) => self.points.extend(mp.iter().map(|p| p.0)),
            Geometry::Line(line) => self.segments.push((line.start, line.end)),
            Geometry::LineString(ls) => self.push_line_string(ls),
            Geometry::MultiLineString(mls) => mls.iter().for_each(|ls| self.push_line_string(ls)),
            Geometry::Polygon(poly) => self.push_polygon(poly),
            Geometry::MultiPolygon(mp) => mp.iter().for_each(|poly| self.push_polygon(poly)),
            Geometry::Rect(rect) => self.push_polygon(&rect.to_polygon()),
            Geometry::Triangle(tri) => self.push_polygon(&tri.to_polygon()),
            Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| self.push_geometry(g)),
        }
    }

    fn push_line_string(&mut self, line: &LineString<f64>) {
        match line.0.as_slice() {
            [] => {}
            [p] => self.points.push(*p),
            coords => self.segments.extend(coords.windows(2).map(|pair| (pair[0], pair[1]))),
        }
    }

    fn push_polygon(&mut self, polygon: &Polygon<f64>) {
        self.push_line_string(polygon.exterior());
        polygon.interiors().iter().for_each(|ring| self.push_line_string(ring));
    }
}

/// Minimum planar distance between two geometries.
///
/// Zero whenever the geometries intersect (boundary contact included). Both
/// geometries must be expressed in the same linear frame; the result is in
/// that frame's unit. Empty geometries are infinitely far from everything.
///
/// Exactness: for disjoint shapes the minimum is attained at a vertex of one
/// side, so checking every vertex against every opposing segment is exact.
pub fn shape_distance(a: &Geometry<f64>, b: &Geometry<f64>) -> f64 {
    if a.intersects(b) {
        return 0.0;
    }
    let left = Pieces::of(a);
    let right = Pieces::of(b);
    let mut best = f64::INFINITY;
    for &p in &left.points {
        for &q in &right.points {
            best = best.min(point_point(p, q));
        }
        for &(b0, b1) in &right.segments {
            best = best.min(point_segment(p, b0, b1));
        }
    }
    for &(a0, a1) in &left.segments {
        for &q in &right.points {
            best = best.min(point_segment(q, a0, a1));
        }
        for &(b0, b1) in &right.segments {
            best = best.min(point_segment(a0, b0, b1));
            best = best.min(point_segment(a1, b0, b1));
            best = best.min(point_segment(b0, a0, a1));
            best = best.min(point_segment(b1, a0, a1));
        }
    }
    best
}
