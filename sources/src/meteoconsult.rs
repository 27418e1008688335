//! MeteoConsult Marine GRIB files.
//!
//! No API here, we scrape the public downloads page.  Each zone comes
//! as one `<a class="restriction-link">` holding the wind file in its
//! `href` and the current file in a data attribute.  The page itself is
//! cached until the `Expires` date it was served with.
//!

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use clap::{crate_name, crate_version};
use crate::http_get;
use eyre::Result;
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use tracing::{debug, trace};

use estran_common::{makepath, CachedFile};

use crate::{Site, SourceError};

/// Cached index page
const INDEX_CACHE: &str = "meteoconsult_gribs";

/// Sidecar holding its `Expires` date
const EXPIRES_CACHE: &str = "meteoconsult_expires";

/// The two downloads of one zone.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneGribs {
    pub zone: String,
    pub wind_url: String,
    pub current_url: String,
}

/// Client for the downloads page.
///
#[derive(Clone, Debug)]
pub struct MeteoConsult {
    /// Index page URL
    pub base_url: String,
    /// Where the index & files land
    pub cache_dir: PathBuf,
    /// reqwest blocking client
    pub client: reqwest::blocking::Client,
}

impl MeteoConsult {
    pub fn new(site: &Site, cache_dir: &Path) -> Self {
        MeteoConsult {
            base_url: site.base_url.clone(),
            cache_dir: cache_dir.to_path_buf(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// The zone links, scraped from the (possibly cached) index.
    ///
    pub fn zones(&self) -> Result<Vec<ZoneGribs>> {
        let page = self.index()?;
        parse_index(&page)
    }

    /// One zone by name, spaces and case do not matter.
    ///
    pub fn zone(&self, name: &str) -> Result<ZoneGribs> {
        let wanted = squash(name);
        let zones = self.zones()?;
        match zones.iter().find(|z| squash(&z.zone) == wanted) {
            Some(z) => Ok(z.clone()),
            _ => {
                let available = zones
                    .iter()
                    .map(|z| z.zone.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(SourceError::ZoneNotFound(name.to_string(), available).into())
            }
        }
    }

    /// Download the wind or current file of a zone into the cache
    /// directory, named after the zone and today's date.
    ///
    pub fn fetch(&self, name: &str, current: bool) -> Result<PathBuf> {
        let zone = self.zone(name)?;
        let kind = if current { "current" } else { "wind" };
        let url = if current {
            &zone.current_url
        } else {
            &zone.wind_url
        };

        let today = Local::now().format("%Y%m%d");
        let fname = format!("meteoconsult_{}_{}_{}.grb", squash(name), today, kind);
        debug!("fetching {url} as {fname}");

        let cache = CachedFile::new(&self.cache_dir, &fname)?;
        let path = cache.fetch(&self.client, url)?;
        Ok(path.to_path_buf())
    }

    /// The index page, refetched once its `Expires` date has passed.
    ///
    fn index(&self) -> Result<String> {
        let fname: PathBuf = makepath!(&self.cache_dir, INDEX_CACHE);
        let ename: PathBuf = makepath!(&self.cache_dir, EXPIRES_CACHE);

        if fname.exists() && ename.exists() {
            if let Ok(expires) = fs::read_to_string(&ename) {
                if let Ok(expires) = DateTime::parse_from_rfc2822(expires.trim()) {
                    if Utc::now() < expires {
                        trace!("index still fresh until {expires}");
                        return Ok(fs::read_to_string(&fname)?);
                    }
                }
            }
        }

        debug!("downloading index {}", self.base_url);
        let resp = http_get!(self, &self.base_url)?;
        if !resp.status().is_success() {
            return Err(SourceError::Http {
                status: resp.status().as_u16(),
                url: self.base_url.clone(),
            }
            .into());
        }
        let expires = resp
            .headers()
            .get(reqwest::header::EXPIRES)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string());
        let page = resp.text()?;

        fs::create_dir_all(&self.cache_dir)?;
        fs::write(&fname, &page)?;
        if let Some(expires) = expires {
            fs::write(&ename, expires)?;
        }
        Ok(page)
    }
}

/// Lowercase, spaces removed.
///
fn squash(text: &str) -> String {
    text.to_lowercase().replace(' ', "")
}

fn parse_index(page: &str) -> Result<Vec<ZoneGribs>> {
    let doc = Html::parse_document(page);
    let sel = Selector::parse("a.restriction-link")
        .map_err(|e| SourceError::BadPayload("meteoconsult".to_string(), e.to_string()))?;

    let mut zones = vec![];
    for a in doc.select(&sel) {
        let attr = |name: &str| {
            a.value()
                .attr(name)
                .map(|v| percent_decode_str(v).decode_utf8_lossy().to_string())
        };
        let (Some(zone), Some(wind_url), Some(current_url)) =
            (attr("data-title"), attr("href"), attr("data-linkgribtotalcurrent"))
        else {
            continue;
        };
        zones.push(ZoneGribs {
            zone,
            wind_url,
            current_url,
        });
    }
    Ok(zones)
}
