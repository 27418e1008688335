//! Land mask from a coastline GeoJSON file.
//!
//! Point-in-polygon against detailed coastline polygons is slow and
//! the mesh asks about the same grid points for every run, so answers
//! are memoized in a JSON file keyed by `lon,lat`.
//!

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{eyre, Result};
use geo::Contains;
use geo_types::{Geometry, MultiPolygon, Point};
use geojson::{quick_collection, GeoJson};
use tracing::{debug, trace};

/// The mask, with its memo.
///
#[derive(Debug)]
pub struct Coastline {
    land: MultiPolygon<f64>,
    memo: BTreeMap<String, bool>,
    memo_path: Option<PathBuf>,
}

impl Coastline {
    /// Land polygons from a GeoJSON file.
    ///
    pub fn from_geojson_file(path: &Path) -> Result<Self> {
        debug!("reading coastline {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_geojson_str(&content)
    }

    pub fn from_geojson_str(content: &str) -> Result<Self> {
        let gj: GeoJson = content.parse()?;
        let collection = quick_collection(&gj)?;

        let mut polygons = vec![];
        for geometry in collection {
            match geometry {
                Geometry::Polygon(p) => polygons.push(p),
                Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
                _ => (),
            }
        }
        if polygons.is_empty() {
            return Err(eyre!("no polygons in coastline file"));
        }

        Ok(Coastline {
            land: MultiPolygon(polygons),
            memo: BTreeMap::new(),
            memo_path: None,
        })
    }

    /// Attach (and load) a memo file.
    ///
    pub fn with_memo(mut self, path: &Path) -> Self {
        self.memo = fs::read_to_string(path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default();
        self.memo_path = Some(path.to_path_buf());
        self
    }

    /// Whether a point is on land.
    ///
    pub fn is_land(&mut self, lon: f64, lat: f64) -> bool {
        let key = format!("{lon},{lat}");
        if let Some(&earth) = self.memo.get(&key) {
            return earth;
        }

        let earth = self.land.contains(&Point::new(lon, lat));
        trace!("point ({lon}, {lat}) -> {earth}");
        self.memo.insert(key, earth);
        earth
    }

    /// Persist the memo, a no-op without a memo file.
    ///
    pub fn save_memo(&self) -> Result<()> {
        if let Some(path) = &self.memo_path {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, serde_json::to_string(&self.memo)?)?;
        }
        Ok(())
    }
}
