//! Oceanogramme rendering service.
//!
//! Four days of weather & sea state for a point, rendered by SHOM as a
//! javascript widget, an HTML page, a PNG or plain text.  Points are
//! either a predefined spot out of the WFS layer (property `cst`) or a
//! free latitude/longitude pair.
//!

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use clap::{crate_name, crate_version};
use crate::http_get;
use eyre::Result;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use strum::{Display, EnumString};
use tracing::debug;

use crate::{Site, SourceError};

/// Optional physics overlays, bit flags
pub const TEMPERATURE_AT_SURFACE: u32 = 1;
pub const SALINITY_AT_SURFACE: u32 = 2;
pub const WIND_WAVES: u32 = 4;
pub const PRIMARY_SWELL: u32 = 8;
pub const SECONDARY_SWELL: u32 = 16;
pub const ALL_PARAMETERS: u32 = 31;

/// Encode everything but the unreserved characters
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~');

/// The four renderings the service offers.
///
#[derive(Clone, Copy, Debug, Default, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Render {
    Widget,
    #[default]
    Html,
    Image,
    Text,
}

impl Render {
    /// File suffix for the renderings we save to disk.
    ///
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Render::Image => Some("png"),
            Render::Text => Some("txt"),
            _ => None,
        }
    }
}

/// Where to point the oceanogramme, one or the other.
///
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// A `cst` out of the spots layer
    Spot(String),
    /// Any point at sea
    LatLon { lat: f64, lon: f64 },
}

impl Target {
    /// Build from the two CLI options, exactly one must be given.
    ///
    pub fn from_options(spot: Option<String>, latlon: Option<(f64, f64)>) -> Result<Self> {
        match (spot, latlon) {
            (Some(s), None) => Ok(Target::Spot(s)),
            (None, Some((lat, lon))) => Ok(Target::LatLon { lat, lon }),
            _ => Err(SourceError::BadParam("spot or (lat,lon)".to_string()).into()),
        }
    }

    /// Default basename when saving to disk.
    ///
    pub fn basename(&self) -> String {
        match self {
            Target::Spot(s) => s.to_lowercase(),
            Target::LatLon { lat, lon } => format!("{}_{}", lat, lon),
        }
    }
}

/// Client for the rendering endpoint.
///
#[derive(Clone, Debug)]
pub struct Oceano {
    /// Render endpoint base URL
    pub base_url: String,
    /// Overlay bit flags
    pub parameters: u32,
    /// reqwest blocking client
    pub client: reqwest::blocking::Client,
}

impl Oceano {
    pub fn new(site: &Site) -> Self {
        Oceano {
            base_url: site.base_url.trim_end_matches('/').to_string(),
            parameters: 0,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Select the physics overlays.
    ///
    pub fn with_parameters(mut self, parameters: u32) -> Self {
        self.parameters = parameters;
        self
    }

    /// Build the rendering URL, this is all the `html` and `widget`
    /// renderings need.
    ///
    pub fn url(&self, render: Render, target: &Target) -> String {
        let mut url = format!("{}/{}?duration=4&delta-date=0", self.base_url, render);
        match target {
            Target::Spot(spot) => {
                let _ = write!(url, "&spot={spot}");
            }
            Target::LatLon { lat, lon } => {
                let _ = write!(url, "&lat={lat}&lon={lon}");
            }
        }
        url.push_str("&lang=fr");
        if let Some(params) = parameter_list(self.parameters) {
            let _ = write!(
                url,
                "&parameters={}",
                utf8_percent_encode(&params, QUERY)
            );
        }
        url
    }

    /// Fetch one rendering as raw bytes.
    ///
    pub fn fetch(&self, render: Render, target: &Target) -> Result<Vec<u8>> {
        let url = self.url(render, target);
        debug!("fetching {url}");
        let resp = http_get!(self, &url)?;
        if !resp.status().is_success() {
            return Err(SourceError::Http {
                status: resp.status().as_u16(),
                url,
            }
            .into());
        }
        Ok(resp.bytes()?.to_vec())
    }

    /// Fetch and save, returns the written path.
    ///
    pub fn save(
        &self,
        render: Render,
        target: &Target,
        filename: Option<&str>,
    ) -> Result<PathBuf> {
        let suffix = render.suffix().ok_or_else(|| {
            SourceError::BadParam(format!("rendering {render} is not a file"))
        })?;
        let data = self.fetch(render, target)?;
        let base = match filename {
            Some(f) => f.to_string(),
            _ => target.basename(),
        };
        let fname = PathBuf::from(format!("{base}.{suffix}"));
        fs::write(&fname, data)?;
        Ok(fname)
    }
}

/// Expand the bit flags into the query parameter names.
///
fn parameter_list(flags: u32) -> Option<String> {
    let all = [
        (TEMPERATURE_AT_SURFACE, "temperature_at_surface"),
        (SALINITY_AT_SURFACE, "salinity_at_surface"),
        (WIND_WAVES, "wind_waves"),
        (PRIMARY_SWELL, "primary_swell"),
        (SECONDARY_SWELL, "secondary_swell"),
    ];
    let list = all
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>();
    if list.is_empty() {
        None
    } else {
        Some(list.join(","))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    fn oceano(url: &str) -> Oceano {
        Oceano {
            base_url: url.trim_end_matches('/').to_string(),
            parameters: 0,
            client: reqwest::blocking::Client::new(),
        }
    }

    #[test]
    fn test_url_spot() {
        let o = oceano("https://services.data.shom.fr/oceano/render");
        let t = Target::Spot("PORTSALL".to_string());
        assert_eq!(
            "https://services.data.shom.fr/oceano/render/html?duration=4&delta-date=0&spot=PORTSALL&lang=fr",
            o.url(Render::Html, &t)
        );
    }

    #[test]
    fn test_url_latlon_with_parameters() {
        let o = oceano("https://services.data.shom.fr/oceano/render")
            .with_parameters(TEMPERATURE_AT_SURFACE | WIND_WAVES);
        let t = Target::LatLon {
            lat: 48.5,
            lon: -4.7,
        };
        let url = o.url(Render::Image, &t);
        assert!(url.contains("/image?"));
        assert!(url.contains("&lat=48.5&lon=-4.7"));
        assert!(url.contains("&parameters=temperature_at_surface%2Cwind_waves"));
    }

    #[test]
    fn test_target_exclusive() {
        assert!(Target::from_options(None, None).is_err());
        assert!(
            Target::from_options(Some("BREST".to_string()), Some((48., -4.))).is_err()
        );
        let t = Target::from_options(Some("BREST".to_string()), None).unwrap();
        assert_eq!("brest", t.basename());
    }

    #[test]
    fn test_fetch_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/render/text")
                .query_param("spot", "BREST")
                .query_param("lang", "fr");
            then.status(200).body("mer belle");
        });

        let o = oceano(&server.url("/render"));
        let t = Target::Spot("BREST".to_string());
        let data = o.fetch(Render::Text, &t).unwrap();
        assert_eq!(b"mer belle".to_vec(), data);
    }

    #[test]
    fn test_render_suffix() {
        assert_eq!(Some("png"), Render::Image.suffix());
        assert_eq!(None, Render::Widget.suffix());
        assert_eq!("image", Render::Image.to_string());
    }
}
