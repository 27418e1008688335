//! SHOM tidal current atlas, the fixed-width text flavour.
//!
//! Each atlas point takes three lines after a one-line header:
//!
//! - two 9-character angles, latitude then longitude,
//! - the spring-tide (vive eau, coefficient 95) current components,
//! - the neap-tide (morte eau, coefficient 45) ones.
//!
//! A component line holds 13 three-character integers for u, a `*` at
//! column 40, then 13 more for v; one sample per tidal hour from 6 hours
//! before to 6 hours after high water at the reference harbor.
//!

use estran_common::{parse_atlas_angle, Point, BB};
use eyre::{eyre, Result};
use tracing::trace;

/// Grid increments of the atlas rasters, in degrees.
pub const I_INCREMENT: f64 = 0.003369;
pub const J_INCREMENT: f64 = 0.002253;

/// Neap reference coefficient.
pub const NEAP_COEFF: f64 = 45.;
/// Spring reference coefficient.
pub const SPRING_COEFF: f64 = 95.;

/// u/v current samples over the 13 tidal hours, in atlas units
/// (hundredths of knots).
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Components {
    pub u: [i32; 13],
    pub v: [i32; 13],
}

impl Components {
    /// Parse one component line.
    ///
    fn parse(line: &str) -> Result<Self> {
        if line.len() < 80 || line.as_bytes()[40] != b'*' {
            return Err(eyre!("bad component line: {line:?}"));
        }
        let mut c = Components::default();
        for i in 0..13 {
            c.u[i] = line[i * 3..i * 3 + 3].trim().parse()?;
            c.v[i] = line[i * 3 + 41..i * 3 + 44].trim().parse()?;
        }
        Ok(c)
    }

    fn at(&self, hour: i32) -> (f64, f64) {
        let idx = (hour + 6) as usize;
        (f64::from(self.u[idx]), f64::from(self.v[idx]))
    }
}

/// One atlas grid point with both reference tides.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasPoint {
    pub lat: f64,
    pub lon: f64,
    pub spring: Components,
    pub neap: Components,
}

impl AtlasPoint {
    /// Current vector at this point for a given tidal coefficient and
    /// tidal hour (−6 to +6 around high water), linear between the neap
    /// and spring references.
    ///
    pub fn current_at(&self, coeff: f64, hour: i32) -> Result<(f64, f64)> {
        if !(-6..=6).contains(&hour) {
            return Err(eyre!("tidal hour out of range: {hour}"));
        }
        let (nu, nv) = self.neap.at(hour);
        let (su, sv) = self.spring.at(hour);
        let k = (coeff - NEAP_COEFF) / (SPRING_COEFF - NEAP_COEFF);
        Ok((nu + (su - nu) * k, nv + (sv - nv) * k))
    }

    pub fn position(&self) -> Point {
        Point::new(self.lat, self.lon)
    }
}

/// Read a whole atlas file, keeping only the points inside `bbox` when
/// one is given.  The first line is a header and is skipped.
///
#[tracing::instrument(skip(data))]
pub fn read_atlas(data: &str, bbox: Option<BB>) -> Result<Vec<AtlasPoint>> {
    let lines: Vec<&str> = data.lines().collect();
    let mut points = vec![];

    let mut i = 1;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            break;
        }
        if i + 2 >= lines.len() {
            return Err(eyre!("truncated atlas record at line {i}"));
        }
        let coords = lines[i];
        if coords.len() < 18 {
            return Err(eyre!("short coordinate line {i}: {coords:?}"));
        }
        let lat = parse_atlas_angle(&coords[0..9])?;
        let lon = parse_atlas_angle(&coords[9..18])?;

        let spring = Components::parse(lines[i + 1])?;
        let neap = Components::parse(lines[i + 2])?;

        if bbox.is_none_or(|bb| bb.contains(Point::new(lat, lon))) {
            points.push(AtlasPoint {
                lat,
                lon,
                spring,
                neap,
            });
        }
        i += 3;
    }
    trace!("{} atlas points", points.len());
    Ok(points)
}
