//! WKT polygon codec (`POLYGON`, `MULTIPOLYGON`).
//!
//! Conventions
//! - Text is longitude-first (`lng lat`); in-memory `Coordinate` is latitude-first.
//! - Decoding never fails: malformed text yields an empty `MultiPolygon`,
//!   unreadable or out-of-range pairs are skipped, and polygons whose outer ring
//!   keeps fewer than three vertices are dropped.
//! - Encoding always appends the first vertex to close each ring.

use crate::geo::{Coordinate, MultiPolygon, Polygon, Ring};

const POLYGON: &str = "POLYGON";
const MULTIPOLYGON: &str = "MULTIPOLYGON";

/// Parse `POLYGON(...)` or `MULTIPOLYGON(...)` (keyword case-insensitive).
pub fn decode(text: &str) -> MultiPolygon {
    let text = text.trim();
    let upper = text.to_ascii_uppercase();
    let (body, multi) = if upper.starts_with(MULTIPOLYGON) {
        (&text[MULTIPOLYGON.len()..], true)
    } else if upper.starts_with(POLYGON) {
        (&text[POLYGON.len()..], false)
    } else {
        return Vec::new();
    };
    let Some(inner) = strip_parens(body) else {
        return Vec::new();
    };
    let Some(groups) = split_top_level(inner) else {
        return Vec::new();
    };
    if multi {
        groups
            .into_iter()
            .filter_map(|g| strip_parens(g).and_then(split_top_level))
            .filter_map(|rings| polygon_from_groups(&rings))
            .collect()
    } else {
        polygon_from_groups(&groups).into_iter().collect()
    }
}

/// Encode an outer ring as `POLYGON((lng lat, ...))`; `None` for fewer than 3 vertices.
pub fn encode(vertices: &[Coordinate]) -> Option<String> {
    if vertices.len() < 3 {
        return None;
    }
    Some(format!("{POLYGON}({})", ring_text(vertices)))
}

/// Encode polygons with holes as `MULTIPOLYGON(((...),(...)),((...)))`.
///
/// Polygons whose outer ring is not polygonal are skipped; `None` if none remain.
pub fn encode_multipolygon(mp: &MultiPolygon) -> Option<String> {
    let polys: Vec<String> = mp
        .iter()
        .filter(|p| p.exterior.is_polygonal())
        .map(|p| {
            let mut rings = vec![ring_text(p.exterior.open_vertices())];
            rings.extend(
                p.holes
                    .iter()
                    .filter(|h| h.is_polygonal())
                    .map(|h| ring_text(h.open_vertices())),
            );
            format!("({})", rings.join(","))
        })
        .collect();
    if polys.is_empty() {
        return None;
    }
    Some(format!("{MULTIPOLYGON}({})", polys.join(",")))
}

fn ring_text(vertices: &[Coordinate]) -> String {
    let pairs: Vec<String> = vertices
        .iter()
        .chain(vertices.first())
        .map(|c| format!("{} {}", c.lng, c.lat))
        .collect();
    format!("({})", pairs.join(", "))
}

fn strip_parens(s: &str) -> Option<&str> {
    let s = s.trim();
    s.strip_prefix('(')?.strip_suffix(')')
}

/// Split on commas at parenthesis depth 0; `None` if parentheses are unbalanced.
fn split_top_level(s: &str) -> Option<Vec<&str>> {
    let mut out = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    out.push(&s[start..]);
    Some(out)
}

fn polygon_from_groups(groups: &[&str]) -> Option<Polygon> {
    let mut rings = groups
        .iter()
        .filter_map(|g| strip_parens(g))
        .map(parse_ring);
    let exterior = rings.next()?;
    if !exterior.is_polygonal() {
        return None;
    }
    let holes = rings.filter(Ring::is_polygonal).collect();
    Some(Polygon::new(exterior, holes))
}

fn parse_ring(s: &str) -> Ring {
    Ring::new(s.split(',').filter_map(parse_pair).collect())
}

/// `lng lat [z [m]]` → latitude-first coordinate; extra ordinates are ignored.
fn parse_pair(s: &str) -> Option<Coordinate> {
    let mut it = s.split_whitespace();
    let lng: f64 = it.next()?.parse().ok()?;
    let lat: f64 = it.next()?.parse().ok()?;
    let c = Coordinate::new(lat, lng);
    c.is_valid().then_some(c)
}
