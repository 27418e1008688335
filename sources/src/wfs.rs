//! WFS client for the SHOM feature layers.
//!
//! Three layers interest us: the SPM harbors, the tide zones and the
//! oceanogramme spots.  All are fetched through a plain `GetFeature`
//! returning GeoJSON, keyed by the property each layer uses as its
//! identifier.
//!

use std::collections::BTreeMap;
use std::fs;

use clap::{crate_name, crate_version};
use eyre::Result;
use serde_json::Value;
use strsim::jaro_winkler;
use tracing::debug;

use crate::{lean, SourceError};

/// Names further apart than this are not a match
const MAX_DISTANCE: f64 = 0.15;

/// One queryable layer and how to query it.
///
#[derive(Clone, Copy, Debug)]
pub struct WfsLayer {
    /// Feature type, `NAMESPACE:layer`
    pub type_name: &'static str,
    /// WFS protocol version the endpoint insists on
    pub version: &'static str,
    /// Property used as the map key
    pub key: &'static str,
    /// Some endpoints 403 without a known `Referer`
    pub referer: Option<&'static str>,
}

/// SPM harbors as known to the tide pages
pub const HARBORS_LAYER: WfsLayer = WfsLayer {
    type_name: "SPM_PORTS_WFS:liste_ports_spm_h2m",
    version: "1.0.0",
    key: "cst",
    referer: None,
};

/// Tide zones (one reference harbor each)
pub const ZONES_LAYER: WfsLayer = WfsLayer {
    type_name: "H2M_ZONES_WFS:zones_h2m_20160126",
    version: "1.0.0",
    key: "zone_fr",
    referer: None,
};

/// Oceanogramme spots, lives on a different endpoint
pub const SPOTS_LAYER: WfsLayer = WfsLayer {
    type_name: "OCEANOGRAMME_SPOTS_BDD_WFS:spots_oceanogramme_positions_modeles",
    version: "1.1.0",
    key: "cst",
    referer: Some("https://data.shom.fr/"),
};

/// One feature out of a layer.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    /// The key property value
    pub name: String,
    /// All properties as returned
    pub properties: Value,
    /// Raw GeoJSON geometry
    pub geometry: Value,
}

impl Feature {
    /// Point coordinates, in the projection the layer was requested in
    /// (EPSG:3857 here).
    ///
    pub fn point_3857(&self) -> Option<(f64, f64)> {
        let coords = self.geometry.get("coordinates")?.as_array()?;
        let x = coords.first()?.as_f64()?;
        let y = coords.get(1)?.as_f64()?;
        Some((x, y))
    }

    /// Fetch one property as text.
    ///
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.properties.get(name)?.as_str()
    }
}

/// Features keyed by the layer key property
pub type FeatureMap = BTreeMap<String, Feature>;

/// Client for one WFS endpoint.
///
#[derive(Clone, Debug)]
pub struct Wfs {
    /// Endpoint base URL
    pub base_url: String,
    /// reqwest blocking client
    pub client: reqwest::blocking::Client,
}

impl Wfs {
    pub fn new(base_url: &str) -> Self {
        Wfs {
            base_url: base_url.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// `GetFeature` on one layer, keyed by its key property.
    ///
    pub fn features(&self, layer: &WfsLayer) -> Result<FeatureMap> {
        let body = self.get_layer(layer)?;
        collect_features(&body, layer.key)
    }

    /// Same but through a JSON file cache, the layers move maybe once a
    /// year.
    ///
    pub fn features_cached(&self, layer: &WfsLayer, dir: &std::path::Path) -> Result<FeatureMap> {
        let fname = dir.join(format!("wfs_{}.json", lean(layer.type_name)));
        if fname.exists() {
            let content = fs::read_to_string(&fname)?;
            if let Ok(body) = serde_json::from_str::<Value>(&content) {
                return collect_features(&body, layer.key);
            }
        }
        let body = self.get_layer(layer)?;
        fs::create_dir_all(dir)?;
        fs::write(&fname, serde_json::to_string(&body)?)?;
        collect_features(&body, layer.key)
    }

    fn get_layer(&self, layer: &WfsLayer) -> Result<Value> {
        let url = format!(
            "{}?service=WFS&version={}&srsName=EPSG:3857&request=GetFeature&typeName={}&outputFormat=application/json",
            self.base_url, layer.version, layer.type_name,
        );
        debug!("fetching {url}");

        let mut req = self
            .client
            .get(&url)
            .header(
                "user-agent",
                format!("{}/{}", crate_name!(), crate_version!()),
            )
            .header("accept", "*/*");
        if let Some(referer) = layer.referer {
            req = req.header("referer", referer);
        }
        let resp = req.send()?;
        if !resp.status().is_success() {
            return Err(SourceError::Http {
                status: resp.status().as_u16(),
                url,
            }
            .into());
        }
        Ok(resp.json()?)
    }
}

fn collect_features(body: &Value, key: &str) -> Result<FeatureMap> {
    let features = body
        .get("features")
        .and_then(|f| f.as_array())
        .ok_or_else(|| SourceError::BadPayload("wfs".to_string(), "no features".to_string()))?;

    let mut map = FeatureMap::new();
    for f in features {
        let props = f.get("properties").cloned().unwrap_or(Value::Null);
        let name = match props.get(key).and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            _ => continue,
        };
        let geometry = f.get("geometry").cloned().unwrap_or(Value::Null);
        map.insert(
            name.clone(),
            Feature {
                name,
                properties: props,
                geometry,
            },
        );
    }
    Ok(map)
}

/// Find features by name.  A pattern with `*` selects every lean name
/// it globs, otherwise we want the exact lean name and fall back on the
/// closest one by Jaro-Winkler when nothing matches exactly.
///
pub fn find<'a>(features: &'a FeatureMap, pattern: &str) -> Vec<&'a Feature> {
    if pattern.contains('*') {
        let glob = lean_glob(pattern);
        return features
            .values()
            .filter(|f| glob_match(&lean(&f.name), &glob))
            .collect();
    }

    let wanted = lean(pattern);
    if let Some(f) = features.values().find(|f| lean(&f.name) == wanted) {
        return vec![f];
    }

    let mut best: Option<(f64, &Feature)> = None;
    for f in features.values() {
        let d = 1. - jaro_winkler(&lean(&f.name), &wanted);
        if d <= MAX_DISTANCE && best.map(|(bd, _)| d < bd).unwrap_or(true) {
            best = Some((d, f));
        }
    }
    match best {
        Some((_, f)) => vec![f],
        _ => vec![],
    }
}

/// Like [`lean`] but keeping the `*` wildcards.
///
fn lean_glob(pattern: &str) -> String {
    pattern
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic() || *c == '*')
        .collect()
}

/// Minimal glob on `*` only.
///
fn glob_match(name: &str, glob: &str) -> bool {
    let parts: Vec<&str> = glob.split('*').collect();
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match name[pos..].find(part) {
            Some(idx) => {
                // No leading `*` means the first part anchors at the start
                if i == 0 && idx != 0 {
                    return false;
                }
                pos += idx + part.len();
            }
            _ => return false,
        }
    }
    // No trailing `*` means the last part anchors at the end
    if let Some(last) = parts.last() {
        if !last.is_empty() && !name.ends_with(last) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    const LAYER: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    { "type": "Feature",
      "properties": { "cst": "BREST", "toponyme": "Brest" },
      "geometry": { "type": "Point", "coordinates": [-500626.0, 6170508.9] } },
    { "type": "Feature",
      "properties": { "cst": "LE_CONQUET", "toponyme": "Le Conquet" },
      "geometry": { "type": "Point", "coordinates": [-532130.0, 6166640.0] } },
    { "type": "Feature",
      "properties": { "cst": "CAMARET", "toponyme": "Camaret-sur-Mer" },
      "geometry": { "type": "Point", "coordinates": [-505000.0, 6160000.0] } }
  ]
}"#;

    fn sample() -> FeatureMap {
        let body: Value = serde_json::from_str(LAYER).unwrap();
        collect_features(&body, "cst").unwrap()
    }

    #[test]
    fn test_collect_features() {
        let map = sample();
        assert_eq!(3, map.len());
        let brest = &map["BREST"];
        assert_eq!(Some("Brest"), brest.prop("toponyme"));
        assert_eq!(Some((-500626.0, 6170508.9)), brest.point_3857());
    }

    #[test]
    fn test_find_exact() {
        let map = sample();
        let hits = find(&map, "brest");
        assert_eq!(1, hits.len());
        assert_eq!("BREST", hits[0].name);
    }

    #[test]
    fn test_find_fuzzy() {
        let map = sample();
        // One letter off, Jaro-Winkler catches it
        let hits = find(&map, "brst");
        assert_eq!(1, hits.len());
        assert_eq!("BREST", hits[0].name);

        let hits = find(&map, "zanzibar");
        assert!(hits.is_empty());
    }

    #[test]
    fn test_find_glob() {
        let map = sample();
        let hits = find(&map, "c*");
        assert_eq!(1, hits.len());
        assert_eq!("CAMARET", hits[0].name);

        let hits = find(&map, "*e*");
        assert_eq!(3, hits.len());
    }

    #[test]
    fn test_features_request() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/wfs")
                .query_param("request", "GetFeature")
                .query_param("typeName", SPOTS_LAYER.type_name)
                .header("referer", "https://data.shom.fr/");
            then.status(200)
                .header("content-type", "application/json")
                .body(LAYER);
        });

        let wfs = Wfs::new(&server.url("/wfs"));
        let map = wfs.features(&SPOTS_LAYER).unwrap();
        assert_eq!(3, map.len());
        m.assert();
    }
}
