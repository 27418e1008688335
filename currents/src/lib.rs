//! Tidal current interpolation.
//!
//! Atlas points (see `estran-formats`) are an irregular cloud, to get
//! the current anywhere at sea we triangulate them, throw away the
//! triangles that cross land and interpolate barycentrically inside
//! the rest.
//!

pub use coastline::*;
pub use mesh::*;

pub mod mercator;

mod coastline;
mod mesh;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
