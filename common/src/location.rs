//! Location related module
//!

use serde::{Deserialize, Serialize};

/// one degree is circumference of earth / 360°, convert into nautical miles
const ONE_DEG_NM: f64 = (40_000. / 1.852) / 360.;

/// A plain geographic point in decimal degrees.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Point {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Point { lat, lon }
    }
}

/// Geographic bounding box, as used by GRIB subsets and current atlases.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BB {
    /// Longitude - X0
    pub min_lon: f64,
    /// Latitude - Y0
    pub min_lat: f64,
    /// Longitude - X1
    pub max_lon: f64,
    /// Latitude - Y1
    pub max_lat: f64,
}

impl BB {
    /// Take a lat lon tuple and create a bounding box of `dist` nautical miles away
    ///
    /// So from (lat, lon) we generate the following bounding box:
    /// (lat - dist, lon - dist, lat + dist, lon + dist)
    ///
    /// NOTE: `dist` is in Nautical Miles
    ///
    #[tracing::instrument]
    pub fn from_lat_lon(lat: f64, lon: f64, dist: u32) -> Self {
        let dist = f64::from(dist) / ONE_DEG_NM;

        // Calculate the four corners
        //
        let (min_lat, max_lat) = (lat - dist, lat + dist);
        let (min_lon, max_lon) = (lon - dist, lon + dist);

        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Grow the box so it includes `p`.
    ///
    pub fn extend(&mut self, p: Point) {
        self.min_lon = self.min_lon.min(p.lon);
        self.min_lat = self.min_lat.min(p.lat);
        self.max_lon = self.max_lon.max(p.lon);
        self.max_lat = self.max_lat.max(p.lat);
    }

    /// Smallest box around a set of points.
    ///
    pub fn around(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bb = BB {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        points[1..].iter().for_each(|p| bb.extend(*p));
        Some(bb)
    }

    pub fn contains(&self, p: Point) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lon..=self.max_lon).contains(&p.lon)
    }

    /// Generate an array with the four points in a BB
    ///
    pub fn to_polygon(&self) -> [(f64, f64); 4] {
        [
            (self.min_lon, self.min_lat),
            (self.min_lon, self.max_lat),
            (self.max_lon, self.max_lat),
            (self.max_lon, self.min_lat),
        ]
    }
}
