//! Geographic primitives and shape membership.
//!
//! Purpose
//! - Value types for coordinates, rings, polygons and drawn shapes (`types`).
//! - Turn a drawn `Shape` into a reusable point-membership test (`classify`).
//! - Small spherical/planar helpers: haversine, local projection, shoelace (`util`).
//!
//! Code cross-refs: `crate::wkt` (text codec), `crate::filter`, `crate::grid`.

pub mod classify;
mod types;
pub mod util;

pub use classify::{from_shape, Classifier};
pub use types::{BoundingBox, Coordinate, MultiPolygon, Polygon, Ring, Shape};
pub use util::haversine_m;
