//! Horaires des marées service discovery.
//!
//! The tide API endpoints are not published anywhere, the single page
//! application at `maree.shom.fr` carries them inside a `<meta>` tag
//! holding its URL-encoded Ember environment.  We scrape that tag,
//! decode the JSON blob and keep the two URLs we care about.
//!

use std::fs;
use std::path::{Path, PathBuf};

use clap::{crate_name, crate_version};
use crate::http_get;
use eyre::Result;
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use estran_common::makepath;

use crate::{Site, SourceError};

/// Name of the meta tag holding the SPA environment
const ENV_META: &str = "shom-horaires-des-marees/config/environment";

/// Discovery stamp file, HCL like the rest of the configuration
const HDM_CACHE: &str = "hdm.hcl";

/// The two service URLs we extract from the environment blob
///
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct HdmConfig {
    /// Base URL of the SPM tide service
    pub hdm_service_url: String,
    /// WFS endpoint serving the harbor & zone layers
    pub wfs_harbor_url: String,
}

/// Client for the discovery page
///
#[derive(Clone, Debug)]
pub struct Hdm {
    /// Base URL of `maree.shom.fr`
    pub base_url: String,
    /// reqwest blocking client
    pub client: reqwest::blocking::Client,
}

impl Hdm {
    pub fn new(site: &Site) -> Self {
        Hdm {
            base_url: site.base_url.clone(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch the SPA page and extract both service URLs.
    ///
    pub fn discover(&self) -> Result<HdmConfig> {
        trace!("hdm::discover");
        let resp = http_get!(self, &self.base_url)?;
        if !resp.status().is_success() {
            return Err(SourceError::Http {
                status: resp.status().as_u16(),
                url: self.base_url.clone(),
            }
            .into());
        }
        let page = resp.text()?;
        extract_config(&page)
    }

    /// Cached variant of [`discover`], the blob almost never changes so
    /// we keep it around in `hdm.hcl` under the cache directory.
    ///
    pub fn config(&self, cache_dir: &Path) -> Result<HdmConfig> {
        let fname: PathBuf = makepath!(cache_dir, HDM_CACHE);
        if fname.exists() {
            let content = fs::read_to_string(&fname)?;
            if let Ok(cfg) = hcl::from_str::<HdmConfig>(&content) {
                debug!("hdm config from stamp {:?}", fname);
                return Ok(cfg);
            }
        }
        let cfg = self.discover()?;
        fs::create_dir_all(cache_dir)?;
        fs::write(&fname, hcl::to_string(&cfg)?)?;
        Ok(cfg)
    }
}

/// Pull the environment blob out of the page and decode it.
///
fn extract_config(page: &str) -> Result<HdmConfig> {
    let doc = Html::parse_document(page);
    let sel = Selector::parse(&format!(r#"meta[name="{}"]"#, ENV_META))
        .map_err(|e| SourceError::BadPayload("hdm".to_string(), e.to_string()))?;

    let meta = doc.select(&sel).next().ok_or_else(|| {
        SourceError::BadPayload("hdm".to_string(), "no environment meta tag".to_string())
    })?;
    let content = meta.value().attr("content").ok_or_else(|| {
        SourceError::BadPayload("hdm".to_string(), "empty environment meta tag".to_string())
    })?;

    let blob = percent_decode_str(content).decode_utf8()?;
    let env: serde_json::Value = serde_json::from_str(&blob)?;

    let hdm = env["hdmServiceUrl"].as_str().ok_or_else(|| {
        SourceError::BadPayload("hdm".to_string(), "no hdmServiceUrl".to_string())
    })?;
    let wfs = env["wfsHarborUrl"].as_str().ok_or_else(|| {
        SourceError::BadPayload("hdm".to_string(), "no wfsHarborUrl".to_string())
    })?;

    Ok(HdmConfig {
        hdm_service_url: strip_query(hdm),
        wfs_harbor_url: strip_query(wfs),
    })
}

/// Keep only `scheme://host/path`, the embedded URLs carry session keys
/// in their query string which we must not persist.
///
fn strip_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.trim_end_matches('/').to_string(),
        _ => url.trim_end_matches('/').to_string(),
    }
}
