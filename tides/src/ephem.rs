//! Sun ephemeris for the almanac strips.
//!
//! Rise & set are computed locally (no network) and memoized in a JSON
//! file, the strips ask for the same handful of harbors over and over.
//!

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate, TimeZone};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Rise & set, local time.
///
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SunTimes {
    pub rise: String,
    pub set: String,
}

/// Cache entry, nested under `sun` to leave room for moon data.
///
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct Entry {
    sun: SunTimes,
}

/// The memoized ephemeris.
///
#[derive(Debug)]
pub struct Ephemeris {
    path: PathBuf,
    cache: BTreeMap<String, Entry>,
}

impl Ephemeris {
    /// Backed by the given JSON file, loaded when present.
    ///
    pub fn new(path: &Path) -> Self {
        let cache = fs::read_to_string(path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default();
        Ephemeris {
            path: path.to_path_buf(),
            cache,
        }
    }

    /// Sunrise & sunset at a point on a date, `HH:MM` local.
    ///
    pub fn sun(&mut self, lat: f64, lon: f64, date: NaiveDate) -> Result<SunTimes> {
        let key = format!("{},{},{}", lat, lon, date.format("%Y-%m-%d"));
        if let Some(entry) = self.cache.get(&key) {
            trace!("ephem cache hit {key}");
            return Ok(entry.sun.clone());
        }

        let (rise, set) =
            sunrise::sunrise_sunset(lat, lon, date.year(), date.month(), date.day());
        let sun = SunTimes {
            rise: local_hhmm(rise)?,
            set: local_hhmm(set)?,
        };

        self.cache.insert(key, Entry { sun: sun.clone() });
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.cache)?)?;
        Ok(sun)
    }
}

fn local_hhmm(ts: i64) -> Result<String> {
    let t = Local
        .timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| eyre!("bad timestamp {ts}"))?;
    Ok(t.format("%H:%M").to_string())
}
