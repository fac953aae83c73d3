//! Geographic value types: coordinates, rings, polygons, drawn shapes.
//!
//! Conventions
//! - Coordinates are latitude-first degrees (`lat`, `lng`). WKT's longitude-first
//!   order is handled exclusively by `crate::wkt`.
//! - Rings are implicitly closed; a trailing copy of the first vertex is allowed
//!   and ignored by `Ring::open_vertices`.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::util::{circle_polygon, ring_area_sq_meters};
use crate::cfg::{EARTH_RADIUS_M, METERS_PER_DEGREE};

/// A WGS84 position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[inline]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
    /// Finite and within lat∈[-90,90], lng∈[-180,180].
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Ordered vertex sequence bounding a polygon or a hole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring(pub Vec<Coordinate>);

impl Ring {
    pub fn new(vertices: Vec<Coordinate>) -> Self {
        Self(vertices)
    }
    #[inline]
    pub fn vertices(&self) -> &[Coordinate] {
        &self.0
    }
    /// Vertices without an explicit closing duplicate of the first one.
    pub fn open_vertices(&self) -> &[Coordinate] {
        match (self.0.first(), self.0.last()) {
            (Some(a), Some(b)) if self.0.len() > 1 && a == b => &self.0[..self.0.len() - 1],
            _ => &self.0,
        }
    }
    /// A ring needs at least three distinct vertices to enclose area.
    pub fn is_polygonal(&self) -> bool {
        let open = self.open_vertices();
        if open.len() < 3 {
            return false;
        }
        let mut keys: Vec<(f64, f64)> = open.iter().map(|c| (c.lat, c.lng)).collect();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        keys.dedup();
        keys.len() >= 3
    }
}

impl From<Vec<Coordinate>> for Ring {
    fn from(v: Vec<Coordinate>) -> Self {
        Self(v)
    }
}

/// Outer ring plus zero or more holes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Ring,
    #[serde(default)]
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }
}

pub type MultiPolygon = Vec<Polygon>;

/// Axis-aligned latitude/longitude box (inclusive bounds).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Smallest box covering `coords`; `None` if empty.
    pub fn around(coords: &[Coordinate]) -> Option<Self> {
        let first = coords.first()?;
        let mut bb = BoundingBox {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        for c in &coords[1..] {
            bb.south = bb.south.min(c.lat);
            bb.north = bb.north.max(c.lat);
            bb.west = bb.west.min(c.lng);
            bb.east = bb.east.max(c.lng);
        }
        Some(bb)
    }
    #[inline]
    pub fn contains(&self, c: Coordinate) -> bool {
        c.lat >= self.south && c.lat <= self.north && c.lng >= self.west && c.lng <= self.east
    }
    #[inline]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south + self.north) * 0.5,
            (self.west + self.east) * 0.5,
        )
    }
}

/// A user-drawn selection shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Shape {
    #[serde(rename_all = "camelCase")]
    Polygon {
        vertices: Ring,
        #[serde(default)]
        holes: Vec<Ring>,
    },
    #[serde(rename_all = "camelCase")]
    Rectangle {
        north_east: Coordinate,
        south_west: Coordinate,
    },
    #[serde(rename_all = "camelCase")]
    Circle {
        center: Coordinate,
        radius_meters: f64,
    },
    /// Disjoint polygons selected together, e.g. a WKT `MULTIPOLYGON` region.
    MultiPolygon { polygons: MultiPolygon },
}

/// Vertex count of the polygon approximating a circle for WKT export.
const CIRCLE_WKT_SEGMENTS: usize = 64;

impl Shape {
    /// Label used by exports and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Polygon { .. } => "polygon",
            Shape::Rectangle { .. } => "rectangle",
            Shape::Circle { .. } => "circle",
            Shape::MultiPolygon { .. } => "multipolygon",
        }
    }

    pub fn from_polygon(p: Polygon) -> Self {
        Shape::Polygon {
            vertices: p.exterior,
            holes: p.holes,
        }
    }

    /// A single member collapses to `Shape::Polygon`; `None` when empty.
    pub fn from_multipolygon(mut mp: MultiPolygon) -> Option<Self> {
        match mp.len() {
            0 => None,
            1 => mp.pop().map(Shape::from_polygon),
            _ => Some(Shape::MultiPolygon { polygons: mp }),
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Shape::Polygon { vertices, .. } => BoundingBox::around(vertices.vertices()),
            Shape::Rectangle {
                north_east,
                south_west,
            } => Some(BoundingBox {
                south: south_west.lat.min(north_east.lat),
                west: south_west.lng.min(north_east.lng),
                north: south_west.lat.max(north_east.lat),
                east: south_west.lng.max(north_east.lng),
            }),
            Shape::Circle {
                center,
                radius_meters,
            } => {
                // Angular radius on the same sphere the haversine test uses.
                let d = radius_meters.max(0.0) / EARTH_RADIUS_M;
                let dlat = d.to_degrees();
                let ratio = d.sin() / center.lat.to_radians().cos().abs();
                let dlng = if d < FRAC_PI_2 && ratio < 1.0 {
                    ratio.asin().to_degrees()
                } else {
                    180.0
                };
                Some(BoundingBox {
                    south: (center.lat - dlat).max(-90.0),
                    west: (center.lng - dlng).max(-180.0),
                    north: (center.lat + dlat).min(90.0),
                    east: (center.lng + dlng).min(180.0),
                })
            }
            Shape::MultiPolygon { polygons } => {
                let all: Vec<Coordinate> = polygons
                    .iter()
                    .flat_map(|p| p.exterior.vertices().iter().copied())
                    .collect();
                BoundingBox::around(&all)
            }
        }
    }

    /// Approximate enclosed area in square metres.
    pub fn area_sq_meters(&self) -> f64 {
        match self {
            Shape::Polygon { vertices, holes } => polygon_area(vertices, holes),
            Shape::MultiPolygon { polygons } => polygons
                .iter()
                .map(|p| polygon_area(&p.exterior, &p.holes))
                .sum(),
            Shape::Rectangle { .. } => match self.bounding_box() {
                Some(bb) => {
                    let mid = ((bb.south + bb.north) * 0.5).to_radians().cos();
                    let h = (bb.north - bb.south) * METERS_PER_DEGREE;
                    let w = (bb.east - bb.west) * METERS_PER_DEGREE * mid;
                    (h * w).abs()
                }
                None => 0.0,
            },
            Shape::Circle { radius_meters, .. } => {
                let r = radius_meters.max(0.0);
                std::f64::consts::PI * r * r
            }
        }
    }

    /// Outer ring used when persisting the shape as WKT.
    pub fn outline(&self) -> Vec<Coordinate> {
        match self {
            Shape::Polygon { vertices, .. } => vertices.open_vertices().to_vec(),
            Shape::Rectangle {
                north_east,
                south_west,
            } => vec![
                Coordinate::new(south_west.lat, south_west.lng),
                Coordinate::new(south_west.lat, north_east.lng),
                Coordinate::new(north_east.lat, north_east.lng),
                Coordinate::new(north_east.lat, south_west.lng),
            ],
            Shape::Circle {
                center,
                radius_meters,
            } => circle_polygon(*center, *radius_meters, CIRCLE_WKT_SEGMENTS),
            Shape::MultiPolygon { polygons } => polygons
                .first()
                .map(|p| p.exterior.open_vertices().to_vec())
                .unwrap_or_default(),
        }
    }

    /// `POLYGON((lng lat, ...))` for the outline, `MULTIPOLYGON` for a
    /// multipolygon, `None` if degenerate.
    pub fn to_wkt(&self) -> Option<String> {
        match self {
            Shape::MultiPolygon { polygons } => crate::wkt::encode_multipolygon(polygons),
            _ => crate::wkt::encode(&self.outline()),
        }
    }
}

fn polygon_area(exterior: &Ring, holes: &[Ring]) -> f64 {
    let outer = ring_area_sq_meters(exterior.open_vertices());
    let inner: f64 = holes
        .iter()
        .map(|h| ring_area_sq_meters(h.open_vertices()))
        .sum();
    (outer - inner).max(0.0)
}
