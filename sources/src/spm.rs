//! SPM tide client (Service de Prédiction des Marées).
//!
//! Almanac data comes from the service the `maree.shom.fr` application
//! talks to, see [`crate::Hdm`] for how its base URL is discovered.
//! Answers are cached aggressively in `spm.json`, a given harbor/date
//! pair never changes once published.
//!

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use clap::{crate_name, crate_version};
use crate::http_get_referred;
use eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, trace};

use estran_common::{makepath, CachedFile, HourMinute};

use crate::{lean, SourceError};

/// Pages served by the tide SPA, sent along as `Origin`
const SHOM_ORIGIN: &str = "https://maree.shom.fr";

/// Almanac cache file
const SPM_CACHE: &str = "spm.json";

/// Harbor list cache file
const HARBORS_CACHE: &str = "harbors.xml";

/// The hlt endpoint hands out windows of this many days
const WINDOW: i64 = 7;

/// High water, low water, or the padding rows days with 3 tides carry.
///
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq, Deserialize, Serialize)]
pub enum TideKind {
    #[strum(serialize = "tide.high", to_string = "PM")]
    High,
    #[strum(serialize = "tide.low", to_string = "BM")]
    Low,
    #[strum(serialize = "tide.none", to_string = "--")]
    None,
}

/// One line of the almanac, a high or low water event.
///
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TideEvent {
    pub kind: TideKind,
    /// Local standard time, absent on padding rows
    pub time: Option<HourMinute>,
    /// Height in metres above chart datum
    pub height: Option<f64>,
    /// Coefficient, only on high waters of reference harbors
    pub coeff: Option<u32>,
}

impl TideEvent {
    /// Parse one row of the hlt answer, 4 strings like
    /// `["tide.high", "04:11", "7.20", "95"]`.
    ///
    fn from_row(row: &[Value]) -> Result<Self> {
        if row.len() < 4 {
            return Err(
                SourceError::BadPayload("spm".to_string(), format!("short row {row:?}")).into(),
            );
        }
        let txt = |i: usize| row[i].as_str().unwrap_or("").to_string();

        let kind = TideKind::from_str(&txt(0))
            .map_err(|_| SourceError::BadPayload("spm".to_string(), format!("bad tide {row:?}")))?;
        let time = HourMinute::from_str(&txt(1).replace(':', "h")).ok();
        let height = txt(2).parse::<f64>().ok();
        let coeff = txt(3).parse::<u32>().ok();
        Ok(TideEvent {
            kind,
            time,
            height,
            coeff,
        })
    }
}

/// One harbor out of `listHarbors`.
///
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Harbor {
    pub cst: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub coeff_available: bool,
    pub toponyme: Option<String>,
}

/// Water heights sampled every 5 mn, `288` points per day.
///
pub type WaterLevels = Vec<(HourMinute, f64)>;

/// On-disk almanac cache, harbor -> service -> date -> raw rows.
///
type SpmCache = BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>;

/// Client for the tide service proper.
///
#[derive(Clone, Debug)]
pub struct Spm {
    /// Discovered service base URL
    pub service_url: String,
    /// Where `spm.json` and the harbor list live
    pub cache_dir: PathBuf,
    /// reqwest blocking client
    pub client: reqwest::blocking::Client,
}

impl Spm {
    pub fn new(service_url: &str, cache_dir: &Path) -> Self {
        Spm {
            service_url: service_url.trim_end_matches('/').to_string(),
            cache_dir: cache_dir.to_path_buf(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch (or reuse) the harbor list and parse it.
    ///
    pub fn harbors(&self) -> Result<Vec<Harbor>> {
        let url = format!("{}/spm/listHarbors", self.service_url);
        let cache = CachedFile::new(&self.cache_dir, HARBORS_CACHE)?;
        let path = cache.fetch(&self.client, &url)?;
        let content = fs::read_to_string(path)?;
        parse_harbors(&content)
    }

    /// Find one harbor, by exact `cst` code first, then by lean name.
    ///
    pub fn resolve(&self, name: &str) -> Result<Harbor> {
        let harbors = self.harbors()?;
        if let Some(h) = harbors.iter().find(|h| h.cst == name) {
            return Ok(h.clone());
        }
        let wanted = lean(name);
        harbors
            .into_iter()
            .find(|h| lean(&h.name) == wanted)
            .ok_or_else(|| SourceError::HarborNotFound(name.to_string()).into())
    }

    /// High/low water events for `[begin..=end]`, a map of date to the
    /// events of that day in order.
    ///
    pub fn tides(
        &self,
        harbor: &Harbor,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Vec<TideEvent>>> {
        let mut out = BTreeMap::new();
        let mut date = begin;
        while date <= end {
            let raw = self.day(harbor, "hlt", date)?;
            let rows = raw.as_array().ok_or_else(|| {
                SourceError::BadPayload("spm".to_string(), format!("hlt for {date}"))
            })?;
            let events = rows
                .iter()
                .filter_map(|r| r.as_array())
                .map(|r| TideEvent::from_row(r))
                .collect::<Result<Vec<_>>>()?;
            out.insert(date, events);
            date += Duration::days(1);
        }
        Ok(out)
    }

    /// Water levels for one day, 288 points 5 mn apart.
    ///
    pub fn water_levels(&self, harbor: &Harbor, date: NaiveDate) -> Result<WaterLevels> {
        let raw = self.day(harbor, "wl", date)?;
        let rows = raw
            .as_array()
            .ok_or_else(|| SourceError::BadPayload("spm".to_string(), format!("wl for {date}")))?;

        let mut levels = Vec::with_capacity(rows.len());
        for row in rows.iter().filter_map(|r| r.as_array()) {
            if row.len() < 2 {
                continue;
            }
            let t = row[0].as_str().unwrap_or("");
            let time = match HourMinute::from_str(&t.replace(':', "h")) {
                Ok(t) => t,
                _ => continue,
            };
            let height = match &row[1] {
                Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                Value::String(s) => match s.parse::<f64>() {
                    Ok(h) => h,
                    _ => continue,
                },
                _ => continue,
            };
            levels.push((time, height));
        }
        Ok(levels)
    }

    /// Raw rows for one harbor/service/date, through the cache.
    ///
    fn day(&self, harbor: &Harbor, service: &str, date: NaiveDate) -> Result<Value> {
        let mut cache = self.load_cache();
        let key = date.format("%Y-%m-%d").to_string();

        if let Some(rows) = cache
            .get(&harbor.cst)
            .and_then(|h| h.get(service))
            .and_then(|s| s.get(&key))
        {
            trace!("spm cache hit {}/{}/{}", harbor.cst, service, key);
            return Ok(rows.clone());
        }

        let window = self.fetch_window(harbor, service, date)?;
        let slot = cache
            .entry(harbor.cst.clone())
            .or_default()
            .entry(service.to_string())
            .or_default();
        for (d, rows) in &window {
            slot.insert(d.clone(), rows.clone());
        }
        self.store_cache(&cache)?;

        window
            .get(&key)
            .cloned()
            .ok_or_else(|| SourceError::BadPayload("spm".to_string(), format!("no {key}")).into())
    }

    /// One network call, answers cover a 7 day window keyed by date.
    ///
    fn fetch_window(
        &self,
        harbor: &Harbor,
        service: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<String, Value>> {
        // Correlation mirrors the harbor's coefficient flag, asking for
        // coefficients on a secondary harbor yields garbage.
        //
        let correlation = u8::from(harbor.coeff_available);
        let mut url = format!(
            "{}/spm/{}?harborName={}&duration={}&date={}&utc=standard&correlation={}",
            self.service_url,
            service,
            harbor.cst,
            WINDOW,
            date.format("%Y-%m-%d"),
            correlation,
        );
        if service == "wl" {
            url.push_str("&nbWaterLevels=288");
        }
        debug!("fetching {url}");

        let resp = http_get_referred!(self, &url, SHOM_ORIGIN)?;
        if !resp.status().is_success() {
            return Err(SourceError::Http {
                status: resp.status().as_u16(),
                url,
            }
            .into());
        }
        let body: BTreeMap<String, Value> = resp.json()?;
        Ok(body)
    }

    fn load_cache(&self) -> SpmCache {
        let fname: PathBuf = makepath!(&self.cache_dir, SPM_CACHE);
        fs::read_to_string(&fname)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default()
    }

    fn store_cache(&self, cache: &SpmCache) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        let fname: PathBuf = makepath!(&self.cache_dir, SPM_CACHE);
        fs::write(&fname, serde_json::to_string(cache)?)?;
        Ok(())
    }
}

/// The harbor list is a flat XML document, one element per harbor with
/// everything in attributes.
///
fn parse_harbors(content: &str) -> Result<Vec<Harbor>> {
    let doc = roxmltree::Document::parse(content)
        .map_err(|e| SourceError::BadPayload("spm".to_string(), e.to_string()))?;

    let harbors = doc
        .descendants()
        .filter(|n| n.has_attribute("cst"))
        .filter_map(|n| {
            let cst = n.attribute("cst")?.to_string();
            let name = n.attribute("name")?.to_string();
            let lat = n.attribute("lat")?.parse::<f64>().ok()?;
            let lon = n.attribute("lon")?.parse::<f64>().ok()?;
            let coeff_available = n.attribute("isCoeffAvailable") == Some("1");
            let toponyme = n.attribute("toponyme").map(|s| s.to_string());
            Some(Harbor {
                cst,
                name,
                lat,
                lon,
                coeff_available,
                toponyme,
            })
        })
        .collect::<Vec<_>>();
    Ok(harbors)
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use httpmock::Method::HEAD;
    use tempfile::tempdir;

    use super::*;

    const HARBORS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<harborList>
  <harbor cst="BREST" name="BREST" lat="48.3829" lon="-4.4953" isCoeffAvailable="1" toponyme="Brest"/>
  <harbor cst="LE_CONQUET" name="LE_CONQUET" lat="48.3598" lon="-4.7805" isCoeffAvailable="0" toponyme="Le Conquet"/>
</harborList>"#;

    const HLT: &str = r#"{
  "2026-08-29": [
    ["tide.low", "04:07", "1.55", "---"],
    ["tide.high", "09:58", "6.90", "82"],
    ["tide.low", "16:28", "1.60", "---"],
    ["tide.high", "22:19", "7.05", "86"]
  ],
  "2026-08-30": [
    ["tide.low", "04:51", "1.30", "---"],
    ["tide.high", "10:41", "7.15", "90"],
    ["tide.low", "17:10", "1.35", "---"],
    ["tide.none", "--:--", "---", "---"]
  ]
}"#;

    const WL: &str = r#"{
  "2026-08-29": [
    ["00:00", 5.12],
    ["00:05", 5.01],
    ["00:10", "4.89"]
  ]
}"#;

    fn brest() -> Harbor {
        Harbor {
            cst: "BREST".to_string(),
            name: "BREST".to_string(),
            lat: 48.3829,
            lon: -4.4953,
            coeff_available: true,
            toponyme: Some("Brest".to_string()),
        }
    }

    #[test]
    fn test_parse_harbors() {
        let h = parse_harbors(HARBORS).unwrap();
        assert_eq!(2, h.len());
        assert_eq!("BREST", h[0].cst);
        assert!(h[0].coeff_available);
        assert!(!h[1].coeff_available);
        assert_eq!(Some("Le Conquet".to_string()), h[1].toponyme);
    }

    #[test]
    fn test_resolve_lean() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/spm/listHarbors");
            then.status(200).body(HARBORS);
        });
        server.mock(|when, then| {
            when.method(HEAD).path("/spm/listHarbors");
            then.status(200).header("last-modified", "Sat, 01 Aug 2026 00:00:00 GMT");
        });

        let dir = tempdir().unwrap();
        let spm = Spm::new(&server.base_url(), dir.path());

        let h = spm.resolve("le conquet").unwrap();
        assert_eq!("LE_CONQUET", h.cst);

        let r = spm.resolve("atlantis");
        assert!(r.is_err());
    }

    #[test]
    fn test_resolve_exact_cst() {
        // `cst` codes and display names diverge on some harbors.
        //
        const LIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<harborList>
  <harbor cst="SAINT_MALO" name="ST MALO (BASE)" lat="48.6412" lon="-2.0232" isCoeffAvailable="1" toponyme="Saint-Malo"/>
  <harbor cst="PAIMPOL" name="SAINT MALO DE PAIMPOL" lat="48.7805" lon="-3.0445" isCoeffAvailable="0"/>
</harborList>"#;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/spm/listHarbors");
            then.status(200).body(LIST);
        });
        server.mock(|when, then| {
            when.method(HEAD).path("/spm/listHarbors");
            then.status(200).header("last-modified", "Sat, 01 Aug 2026 00:00:00 GMT");
        });

        let dir = tempdir().unwrap();
        let spm = Spm::new(&server.base_url(), dir.path());

        // The code wins over any fuzzier name match.
        //
        let h = spm.resolve("SAINT_MALO").unwrap();
        assert_eq!("ST MALO (BASE)", h.name);

        // Lean-name fallback still applies when no code matches.
        //
        let h = spm.resolve("saint malo de paimpol").unwrap();
        assert_eq!("PAIMPOL", h.cst);
    }

    #[test]
    fn test_tides_and_cache() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/spm/hlt")
                .query_param("harborName", "BREST")
                .query_param("date", "2026-08-29")
                .query_param("utc", "standard")
                .header("origin", SHOM_ORIGIN);
            then.status(200)
                .header("content-type", "application/json")
                .body(HLT);
        });

        let dir = tempdir().unwrap();
        let spm = Spm::new(&server.base_url(), dir.path());
        let d1 = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        let tides = spm.tides(&brest(), d1, d2).unwrap();
        assert_eq!(2, tides.len());

        let day1 = &tides[&d1];
        assert_eq!(4, day1.len());
        assert_eq!(TideKind::Low, day1[0].kind);
        assert_eq!(Some(1.55), day1[0].height);
        assert_eq!(None, day1[0].coeff);
        assert_eq!(TideKind::High, day1[1].kind);
        assert_eq!(Some(82), day1[1].coeff);
        assert_eq!("09h58", day1[1].time.unwrap().to_string());

        let day2 = &tides[&d2];
        assert_eq!(TideKind::None, day2[3].kind);
        assert_eq!(None, day2[3].time);

        // Both days were in the first 7-day window, one hit only
        //
        m.assert_hits(1);
    }

    #[test]
    fn test_correlation_follows_coeff_flag() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/spm/hlt")
                .query_param("harborName", "LE_CONQUET")
                .query_param("correlation", "0");
            then.status(200)
                .header("content-type", "application/json")
                .body(HLT);
        });

        let conquet = Harbor {
            cst: "LE_CONQUET".to_string(),
            name: "LE_CONQUET".to_string(),
            lat: 48.3598,
            lon: -4.7805,
            coeff_available: false,
            toponyme: None,
        };

        let dir = tempdir().unwrap();
        let spm = Spm::new(&server.base_url(), dir.path());
        let d = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();

        spm.tides(&conquet, d, d).unwrap();
        m.assert_hits(1);
    }

    #[test]
    fn test_water_levels() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/spm/wl")
                .query_param("nbWaterLevels", "288");
            then.status(200)
                .header("content-type", "application/json")
                .body(WL);
        });

        let dir = tempdir().unwrap();
        let spm = Spm::new(&server.base_url(), dir.path());
        let d = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();

        let wl = spm.water_levels(&brest(), d).unwrap();
        assert_eq!(3, wl.len());
        assert_eq!("00h05", wl[1].0.to_string());
        assert_eq!(4.89, wl[2].1);
    }

    #[test]
    fn test_tide_kind_labels() {
        assert_eq!("PM", TideKind::High.to_string());
        assert_eq!("BM", TideKind::Low.to_string());
        assert_eq!(TideKind::High, TideKind::from_str("tide.high").unwrap());
    }
}
