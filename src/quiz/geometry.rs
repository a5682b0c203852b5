use serde::{Deserialize, Serialize};

// Tolerance for boundary and point-to-point checks.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Point>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Self { exterior }
    }

    fn centroid(&self) -> Point {
        let n = self.exterior.len() as f64;
        let (sum_x, sum_y) = self
            .exterior
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sum_x / n, sum_y / n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Point(Point),
    Polygon(Polygon),
}

/// Answers the two spatial questions the game needs: "expand this shape for
/// display" and "does this shape contain that point".
pub trait GeometryOracle {
    fn buffer(&self, geometry: &Geometry, distance: f64) -> Geometry;
    fn contains(&self, container: &Geometry, point: &Point) -> bool;
}

/// Oracle over plain x/y coordinates (the decks store lon/lat degrees).
/// Buffering is a display-only dilation, never used for scoring.
pub struct PlanarOracle;

impl GeometryOracle for PlanarOracle {
    fn buffer(&self, geometry: &Geometry, distance: f64) -> Geometry {
        match geometry {
            Geometry::Point(p) => Geometry::Polygon(Polygon::new(vec![
                Point::new(p.x - distance, p.y - distance),
                Point::new(p.x + distance, p.y - distance),
                Point::new(p.x + distance, p.y + distance),
                Point::new(p.x - distance, p.y + distance),
            ])),
            Geometry::Polygon(polygon) => {
                let centroid = polygon.centroid();
                let exterior = polygon
                    .exterior
                    .iter()
                    .map(|v| {
                        let dx = v.x - centroid.x;
                        let dy = v.y - centroid.y;
                        let len = (dx * dx + dy * dy).sqrt();
                        if len < EPSILON {
                            *v
                        } else {
                            Point::new(v.x + dx / len * distance, v.y + dy / len * distance)
                        }
                    })
                    .collect();
                Geometry::Polygon(Polygon::new(exterior))
            }
        }
    }

    fn contains(&self, container: &Geometry, point: &Point) -> bool {
        match container {
            Geometry::Point(p) => {
                let (dx, dy) = (p.x - point.x, p.y - point.y);
                (dx * dx + dy * dy).sqrt() <= EPSILON
            }
            Geometry::Polygon(polygon) => polygon_contains(polygon, point),
        }
    }
}

// A point on the boundary counts as contained.
fn polygon_contains(polygon: &Polygon, point: &Point) -> bool {
    let ring = &polygon.exterior;
    if ring.len() < 3 {
        return false;
    }
    if on_boundary(ring, point) {
        return true;
    }

    // Even-odd ray cast along +x.
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_boundary(ring: &[Point], point: &Point) -> bool {
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        if point_to_segment_distance(point, &ring[j], &ring[i]) <= EPSILON {
            return true;
        }
        j = i;
    }
    false
}

fn point_to_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
