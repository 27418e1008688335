//! BAN geocoding (Base Adresse Nationale).
//!
//! Turns a city name into coordinates and back, we mostly use it to
//! find the INSEE code a Météo-France tide request wants.
//!

use clap::{crate_name, crate_version};
use crate::http_get;
use eyre::Result;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::debug;

use crate::{Site, SourceError};

/// One geocoded place.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub city: String,
    pub citycode: String,
}

/// Client for the geocoding API.
///
#[derive(Clone, Debug)]
pub struct Adresse {
    /// API base URL
    pub base_url: String,
    /// Route to forward geocoding
    search_route: String,
    /// Route to reverse geocoding
    reverse_route: String,
    /// reqwest blocking client
    pub client: reqwest::blocking::Client,
}

impl Adresse {
    pub fn new(site: &Site) -> Result<Self> {
        let name = site.name.clone().unwrap_or_else(|| "adresse".to_string());
        let search_route = site
            .route("search")
            .ok_or_else(|| SourceError::NoRoute("search".to_string(), name.clone()))?
            .clone();
        let reverse_route = site
            .route("reverse")
            .ok_or_else(|| SourceError::NoRoute("reverse".to_string(), name))?
            .clone();
        Ok(Adresse {
            base_url: site.base_url.trim_end_matches('/').to_string(),
            search_route,
            reverse_route,
            client: reqwest::blocking::Client::new(),
        })
    }

    /// Find a municipality by name.
    ///
    pub fn search(&self, city: &str) -> Result<Place> {
        let url = format!(
            "{}{}?q={}&type=municipality&limit=1&autocomplete=0",
            self.base_url,
            self.search_route,
            utf8_percent_encode(city, NON_ALPHANUMERIC),
        );
        self.place(&url)
    }

    /// Find what is at the given point.
    ///
    pub fn reverse(&self, lat: f64, lon: f64) -> Result<Place> {
        let url = format!(
            "{}{}?lon={}&lat={}",
            self.base_url, self.reverse_route, lon, lat,
        );
        self.place(&url)
    }

    fn place(&self, url: &str) -> Result<Place> {
        debug!("fetching {url}");
        let resp = http_get!(self, url)?;
        if !resp.status().is_success() {
            return Err(SourceError::Http {
                status: resp.status().as_u16(),
                url: url.to_string(),
            }
            .into());
        }
        let body: Value = resp.json()?;
        extract_place(&body)
    }
}

fn extract_place(body: &Value) -> Result<Place> {
    let feature = body
        .get("features")
        .and_then(|f| f.as_array())
        .and_then(|f| f.first())
        .ok_or_else(|| SourceError::BadPayload("adresse".to_string(), "no features".to_string()))?;

    let coords = feature
        .pointer("/geometry/coordinates")
        .and_then(|c| c.as_array())
        .ok_or_else(|| {
            SourceError::BadPayload("adresse".to_string(), "no coordinates".to_string())
        })?;
    let lon = coords.first().and_then(|v| v.as_f64()).unwrap_or(f64::NAN);
    let lat = coords.get(1).and_then(|v| v.as_f64()).unwrap_or(f64::NAN);

    let prop = |name: &str| {
        feature
            .pointer(&format!("/properties/{name}"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };

    Ok(Place {
        lat,
        lon,
        name: prop("name"),
        city: prop("city"),
        citycode: prop("citycode"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use httpmock::prelude::*;

    use super::*;

    const ANSWER: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    { "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [-4.7683, 48.3601] },
      "properties": { "name": "Le Conquet", "city": "Le Conquet", "citycode": "29040" } }
  ]
}"#;

    fn site(url: &str) -> Site {
        let mut routes = BTreeMap::new();
        routes.insert("search".to_string(), "/search/".to_string());
        routes.insert("reverse".to_string(), "/reverse/".to_string());
        Site {
            name: Some("adresse".to_string()),
            base_url: url.to_string(),
            auth: None,
            routes: Some(routes),
        }
    }

    #[test]
    fn test_search() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/search/")
                .query_param("q", "le conquet")
                .query_param("type", "municipality");
            then.status(200)
                .header("content-type", "application/json")
                .body(ANSWER);
        });

        let a = Adresse::new(&site(&server.base_url())).unwrap();
        let p = a.search("le conquet").unwrap();
        assert_eq!("29040", p.citycode);
        assert_eq!(48.3601, p.lat);
        assert_eq!(-4.7683, p.lon);
        m.assert();
    }

    #[test]
    fn test_reverse() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/reverse/")
                .query_param("lon", "-4.7683")
                .query_param("lat", "48.3601");
            then.status(200)
                .header("content-type", "application/json")
                .body(ANSWER);
        });

        let a = Adresse::new(&site(&server.base_url())).unwrap();
        let p = a.reverse(48.3601, -4.7683).unwrap();
        assert_eq!("Le Conquet", p.city);
    }

    #[test]
    fn test_empty_answer() {
        let body: Value = serde_json::from_str(r#"{"features": []}"#).unwrap();
        assert!(extract_place(&body).is_err());
    }
}
