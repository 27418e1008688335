//! Météo-France marine forecasts.
//!
//! Same API the mobile application talks to, the token in `sources.hcl`
//! is the public one it ships with.  We only use the marine forecast
//! and the tide endpoints.
//!

use chrono::DateTime;
use clap::{crate_name, crate_version};
use crate::http_get;
use eyre::Result;
use serde::Deserialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::debug;

use crate::{Site, SourceError};

/// One per 45° sector, north-up, pointing where the wind goes
const ARROWS: [&str; 8] = ["⬇", "↙", "⬅", "↖", "⬆", "↗", "➡", "↘"];

/// One forecast step.
///
#[derive(Clone, Debug, Deserialize)]
pub struct MarineEntry {
    pub time: String,
    pub wind_speed_kt: f64,
    pub beaufort_scale: u32,
    pub wind_direction: f64,
    pub sea_condition_description: String,
}

/// Zone & harbor the answer is about.
///
#[derive(Clone, Debug, Deserialize)]
pub struct MarineProperties {
    pub zone: String,
    pub name: String,
    pub insee: String,
    pub marine: Vec<MarineEntry>,
}

/// The `forecast/marine` answer, a GeoJSON-ish feature.
///
#[derive(Clone, Debug, Deserialize)]
pub struct MarineForecast {
    pub update_time: String,
    pub properties: MarineProperties,
}

/// Client for the forecast API.
///
#[derive(Clone, Debug)]
pub struct MeteoFrance {
    /// API base URL
    pub base_url: String,
    /// Application token
    token: String,
    /// Route to the marine forecast
    marine_route: String,
    /// Route to the tide endpoint
    tide_route: String,
    /// reqwest blocking client
    pub client: reqwest::blocking::Client,
}

impl MeteoFrance {
    pub fn new(site: &Site) -> Result<Self> {
        let token = site
            .token()
            .ok_or_else(|| SourceError::BadParam("meteofrance needs a token".to_string()))?
            .to_string();
        let name = site.name.clone().unwrap_or_else(|| "meteofrance".to_string());
        let marine_route = site
            .route("marine")
            .ok_or_else(|| SourceError::NoRoute("marine".to_string(), name.clone()))?
            .clone();
        let tide_route = site
            .route("tide")
            .ok_or_else(|| SourceError::NoRoute("tide".to_string(), name))?
            .clone();
        Ok(MeteoFrance {
            base_url: site.base_url.trim_end_matches('/').to_string(),
            token,
            marine_route,
            tide_route,
            client: reqwest::blocking::Client::new(),
        })
    }

    /// Marine forecast around a point.
    ///
    pub fn marine(&self, lat: f64, lon: f64) -> Result<MarineForecast> {
        let url = format!(
            "{}{}?lat={}&lon={}&id=&token={}",
            self.base_url, self.marine_route, lat, lon, self.token,
        );
        debug!("fetching marine forecast for {lat},{lon}");
        let resp = http_get!(self, &url)?;
        if !resp.status().is_success() {
            return Err(SourceError::Http {
                status: resp.status().as_u16(),
                url: format!("{}{}", self.base_url, self.marine_route),
            }
            .into());
        }
        Ok(resp.json()?)
    }

    /// Tide almanac for a city, the id is the INSEE code with `52`
    /// appended.
    ///
    pub fn tide(&self, citycode: &str) -> Result<Value> {
        let url = format!(
            "{}{}?id={}52&token={}",
            self.base_url, self.tide_route, citycode, self.token,
        );
        debug!("fetching tide for {citycode}");
        let resp = http_get!(self, &url)?;
        if !resp.status().is_success() {
            return Err(SourceError::Http {
                status: resp.status().as_u16(),
                url: format!("{}{}", self.base_url, self.tide_route),
            }
            .into());
        }
        Ok(resp.json()?)
    }
}

/// Arrow for a wind direction in degrees.
///
pub fn arrow(wind_direction: f64) -> &'static str {
    let idx = (((wind_direction + 22.5) % 360.) / 45.) as usize;
    ARROWS[idx % 8]
}

/// `2026-08-29T06:00:00Z` as `2026-08-29 06:00 UTC`, left alone when
/// unparseable.
///
fn fmt_time(time: &str) -> String {
    match DateTime::parse_from_rfc3339(time) {
        Ok(t) => t.format("%Y-%m-%d %H:%M UTC").to_string(),
        _ => time.to_string(),
    }
}

/// Render the forecast as a table, header line first.
///
pub fn wind_table(forecast: &MarineForecast) -> String {
    let p = &forecast.properties;
    let header = vec!["time", "kt", "Bf", "wind", "sea"];

    let mut builder = Builder::default();
    builder.push_record(header);
    for e in &p.marine {
        let row = vec![
            fmt_time(&e.time),
            format!("{}", e.wind_speed_kt),
            format!("{}", e.beaufort_scale),
            format!("{}  {:3}°", arrow(e.wind_direction), e.wind_direction),
            e.sea_condition_description.clone(),
        ];
        builder.push_record(row);
    }
    let table = builder.build().with(Style::modern()).to_string();
    format!(
        "{} {}  {}  {}\n{}",
        fmt_time(&forecast.update_time),
        p.zone,
        p.name,
        p.insee,
        table
    )
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    const FORECAST: &str = r#"{
  "update_time": "2026-08-29T06:00:00Z",
  "properties": {
    "zone": "Ouessant",
    "name": "Le Conquet",
    "insee": "29040",
    "marine": [
      { "time": "2026-08-29T09:00:00Z",
        "wind_speed_kt": 12,
        "beaufort_scale": 4,
        "wind_direction": 270,
        "sea_condition_description": "Mer peu agitée" },
      { "time": "2026-08-29T12:00:00Z",
        "wind_speed_kt": 18,
        "beaufort_scale": 5,
        "wind_direction": 300,
        "sea_condition_description": "Mer agitée" }
    ]
  }
}"#;

    fn site(url: &str) -> Site {
        let mut routes = std::collections::BTreeMap::new();
        routes.insert("marine".to_string(), "/forecast/marine".to_string());
        routes.insert("tide".to_string(), "/tide".to_string());
        Site {
            name: Some("meteofrance".to_string()),
            base_url: url.to_string(),
            auth: Some(crate::site::Auth::Token {
                token: "TESTTOKEN".to_string(),
            }),
            routes: Some(routes),
        }
    }

    #[test]
    fn test_arrow_sectors() {
        // Wind from the north blows southward
        assert_eq!("⬇", arrow(0.));
        assert_eq!("⬇", arrow(359.));
        assert_eq!("⬅", arrow(90.));
        assert_eq!("⬆", arrow(180.));
        assert_eq!("➡", arrow(270.));
        assert_eq!("↘", arrow(315.));
    }

    #[test]
    fn test_marine_forecast() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/forecast/marine")
                .query_param("lat", "48.3598")
                .query_param("lon", "-4.7805")
                .query_param("token", "TESTTOKEN");
            then.status(200)
                .header("content-type", "application/json")
                .body(FORECAST);
        });

        let mf = MeteoFrance::new(&site(&server.base_url())).unwrap();
        let f = mf.marine(48.3598, -4.7805).unwrap();
        assert_eq!("Ouessant", f.properties.zone);
        assert_eq!(2, f.properties.marine.len());
        assert_eq!(12., f.properties.marine[0].wind_speed_kt);
        m.assert();
    }

    #[test]
    fn test_wind_table() {
        let f: MarineForecast = serde_json::from_str(FORECAST).unwrap();
        let txt = wind_table(&f);
        assert!(txt.starts_with("2026-08-29 06:00 UTC Ouessant  Le Conquet  29040"));
        assert!(txt.contains("Mer agitée"));
        assert!(txt.contains("➡"));
    }

    #[test]
    fn test_tide_citycode() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/tide").query_param("id", "4413152");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"high_tide": []}"#);
        });

        let mf = MeteoFrance::new(&site(&server.base_url())).unwrap();
        let v = mf.tide("44131").unwrap();
        assert!(v.get("high_tide").is_some());
        m.assert();
    }
}
