//! Shape → point-membership test.
//!
//! `Classifier` owns everything it needs (rings copied, circle center cached),
//! so one instance can be built per drawn shape and reused across every
//! re-analysis of that shape without touching the `Shape` again.
//!
//! Rules
//! - Polygon: even-odd against the outer ring; a point inside any hole is out.
//! - Rectangle: inclusive bounds on both axes. No antimeridian wraparound.
//! - Circle: haversine distance from the center ≤ radius.
//! - MultiPolygon: inside any member polygon.

use super::types::{BoundingBox, Coordinate, MultiPolygon, Polygon, Shape};
use super::util::{haversine_m, point_in_ring};

#[derive(Clone, Debug)]
struct RingTest {
    vertices: Vec<Coordinate>,
    bbox: BoundingBox,
}

impl RingTest {
    fn new(vertices: &[Coordinate]) -> Option<Self> {
        let bbox = BoundingBox::around(vertices)?;
        Some(Self {
            vertices: vertices.to_vec(),
            bbox,
        })
    }
    #[inline]
    fn contains(&self, c: Coordinate) -> bool {
        self.bbox.contains(c) && point_in_ring(c, &self.vertices)
    }
}

#[derive(Clone, Debug)]
struct PolygonTest {
    outer: Option<RingTest>,
    holes: Vec<RingTest>,
}

impl PolygonTest {
    fn new(outer: &[Coordinate], holes: impl Iterator<Item = Vec<Coordinate>>) -> Self {
        let outer = if outer.len() >= 3 {
            RingTest::new(outer)
        } else {
            None
        };
        Self {
            outer,
            holes: holes
                .filter(|h| h.len() >= 3)
                .filter_map(|h| RingTest::new(&h))
                .collect(),
        }
    }
    fn from_polygon(p: &Polygon) -> Self {
        Self::new(
            p.exterior.open_vertices(),
            p.holes.iter().map(|h| h.open_vertices().to_vec()),
        )
    }
    #[inline]
    fn contains(&self, c: Coordinate) -> bool {
        match &self.outer {
            Some(outer) => outer.contains(c) && !self.holes.iter().any(|h| h.contains(c)),
            None => false,
        }
    }
}

#[derive(Clone, Debug)]
enum Region {
    Polygons(Vec<PolygonTest>),
    Rectangle(BoundingBox),
    Circle { center: Coordinate, radius_m: f64 },
}

/// Precomputed, stateless membership test for a selection region.
#[derive(Clone, Debug)]
pub struct Classifier {
    region: Region,
}

/// Build the membership test for a drawn shape.
pub fn from_shape(shape: &Shape) -> Classifier {
    Classifier::from_shape(shape)
}

impl Classifier {
    pub fn from_shape(shape: &Shape) -> Self {
        let region = match shape {
            Shape::Polygon { vertices, holes } => Region::Polygons(vec![PolygonTest::new(
                vertices.open_vertices(),
                holes.iter().map(|h| h.open_vertices().to_vec()),
            )]),
            Shape::Rectangle { .. } => match shape.bounding_box() {
                Some(bb) => Region::Rectangle(bb),
                None => Region::Polygons(Vec::new()),
            },
            Shape::Circle {
                center,
                radius_meters,
            } => Region::Circle {
                center: *center,
                radius_m: *radius_meters,
            },
            Shape::MultiPolygon { polygons } => return Self::from_multipolygon(polygons),
        };
        Self { region }
    }

    /// A point is inside the region if it is inside any member polygon.
    pub fn from_multipolygon(mp: &MultiPolygon) -> Self {
        Self {
            region: Region::Polygons(mp.iter().map(PolygonTest::from_polygon).collect()),
        }
    }

    #[inline]
    pub fn contains(&self, c: Coordinate) -> bool {
        match &self.region {
            Region::Polygons(polys) => polys.iter().any(|p| p.contains(c)),
            Region::Rectangle(bb) => bb.contains(c),
            Region::Circle { center, radius_m } => haversine_m(*center, c) <= *radius_m,
        }
    }

    /// Closure form for callers that take `Fn(Coordinate) -> bool`.
    pub fn as_fn(&self) -> impl Fn(Coordinate) -> bool + '_ {
        move |c| self.contains(c)
    }
}
