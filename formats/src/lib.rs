//! Definition of the data formats
//!
//! This module gathers the file and wire formats the toolbox reads and
//! writes: NMEA 0183 sentences and capture logs, AIS AIVDM frames, GPX,
//! KML and GeoJSON tracks, SHOM current-atlas text files and GRIB
//! container identification.
//!
//! To add a new format, insert its name in `Format`, document it in
//! `formats.hcl` and add a `FORMAT.rs` file with the parsing code.
//!

pub use ais::*;
pub use atlas::*;
pub use format::*;
pub use geojson::*;
pub use gpx::*;
pub use grib::*;
pub use kml::*;
pub use nmea::*;
pub use track::*;

mod ais;
mod atlas;
mod format;
mod geojson;
mod gpx;
mod grib;
mod kml;
mod nmea;
mod track;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
