use nalgebra::Vector2;

use super::types::Coordinate;
use crate::cfg::{EARTH_RADIUS_M, METERS_PER_DEGREE};

/// Great-circle distance in metres (haversine, spherical Earth).
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Equirectangular projection to local metres around `origin` (x east, y north).
#[inline]
pub fn project(origin: Coordinate, c: Coordinate) -> Vector2<f64> {
    let cos = origin.lat.to_radians().cos();
    Vector2::new(
        (c.lng - origin.lng) * METERS_PER_DEGREE * cos,
        (c.lat - origin.lat) * METERS_PER_DEGREE,
    )
}

#[inline]
fn cross(p: Vector2<f64>, q: Vector2<f64>) -> f64 {
    p.x * q.y - q.x * p.y
}

/// Unsigned shoelace area of an open ring, projected around its first vertex.
pub fn ring_area_sq_meters(ring: &[Coordinate]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let origin = ring[0];
    let pts: Vec<Vector2<f64>> = ring.iter().map(|&c| project(origin, c)).collect();
    let mut a = 0.0;
    for i in 0..pts.len() {
        a += cross(pts[i], pts[(i + 1) % pts.len()]);
    }
    (0.5 * a).abs()
}

/// Even-odd (ray casting) membership in a ring, in degree space.
pub fn point_in_ring(c: Coordinate, ring: &[Coordinate]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let (x, y) = (c.lng, c.lat);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lng, ring[i].lat);
        let (xj, yj) = (ring[j].lng, ring[j].lat);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Regular `segments`-gon inscribed in the geodesic circle (destination-point formula).
pub fn circle_polygon(center: Coordinate, radius_m: f64, segments: usize) -> Vec<Coordinate> {
    let segments = segments.max(3);
    let d = radius_m.max(0.0) / EARTH_RADIUS_M;
    let lat1 = center.lat.to_radians();
    let lng1 = center.lng.to_radians();
    (0..segments)
        .map(|k| {
            let bearing = std::f64::consts::TAU * (k as f64) / (segments as f64);
            let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos()).asin();
            let lng2 = lng1
                + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());
            Coordinate::new(lat2.to_degrees(), lng2.to_degrees())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_m(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 10.0);
        assert_eq!(haversine_m(Coordinate::new(45.0, 7.0), Coordinate::new(45.0, 7.0)), 0.0);
    }

    #[test]
    fn shoelace_square_near_equator() {
        let step = 1000.0 / METERS_PER_DEGREE;
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, step),
            Coordinate::new(step, step),
            Coordinate::new(step, 0.0),
        ];
        assert!((ring_area_sq_meters(&ring) - 1.0e6).abs() < 1.0);
    }

    #[test]
    fn even_odd_concave_ring() {
        // U shape opening north
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 3.0),
            Coordinate::new(3.0, 3.0),
            Coordinate::new(3.0, 2.0),
            Coordinate::new(1.0, 2.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(3.0, 1.0),
            Coordinate::new(3.0, 0.0),
        ];
        assert!(point_in_ring(Coordinate::new(0.5, 1.5), &ring));
        assert!(point_in_ring(Coordinate::new(2.0, 0.5), &ring));
        assert!(!point_in_ring(Coordinate::new(2.0, 1.5), &ring));
        assert!(!point_in_ring(Coordinate::new(-1.0, 1.5), &ring));
    }

    #[test]
    fn circle_vertices_lie_on_radius() {
        let c = Coordinate::new(52.5, 13.4);
        for v in circle_polygon(c, 500.0, 16) {
            assert!((haversine_m(c, v) - 500.0).abs() < 0.5);
        }
    }
}
