//! Météo-France GRIB cache (AROME & ARPEGE runs).
//!
//! The DCPC cache serves whole forecast packages per model run.  Each
//! model/resolution pair has its own grid, hour ranges and package
//! list, anything else gets refused upstream so we validate before
//! building the URL.
//!

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use eyre::Result;
use strum::{Display, EnumString};
use tracing::debug;

use estran_common::CachedFile;

use crate::{Site, SourceError};

/// Numerical weather models the cache carries.
///
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Model {
    Arome,
    Arpege,
}

/// Grid, valid hour ranges and packages for one model/resolution.
///
#[derive(Clone, Debug)]
pub struct ModelParameters {
    /// Grid resolution in degrees, as the service spells it
    pub grid: &'static str,
    /// Hour ranges a request may ask for
    pub ranges: Vec<String>,
    /// Parameter packages available
    pub packages: &'static [&'static str],
}

/// Everything needed to fetch one package.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GribRequest {
    pub url: String,
    pub filename: String,
}

pub fn model_parameters(model: Model, hd: bool) -> ModelParameters {
    match (model, hd) {
        (Model::Arpege, true) => ModelParameters {
            grid: "0.1",
            ranges: [
                "00H12H", "13H24H", "25H36H", "37H48H", "49H60H", "61H72H", "73H84H", "85H96H",
                "97H102H", "103H114H",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            packages: &["HP1", "HP2", "IP1", "IP2", "IP3", "IP4", "SP1", "SP2"],
        },
        (Model::Arpege, false) => ModelParameters {
            grid: "0.5",
            ranges: ["00H24H", "27H48H", "51H72H", "75H102H", "105H114H"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            packages: &["HP1", "HP2", "IP1", "IP2", "IP3", "IP4", "SP1", "SP2"],
        },
        (Model::Arome, true) => ModelParameters {
            grid: "0.01",
            ranges: (0..43).map(|i| format!("{i:02}H")).collect(),
            packages: &["HP1", "SP1", "SP2", "SP3"],
        },
        (Model::Arome, false) => ModelParameters {
            grid: "0.025",
            ranges: [
                "00H06H", "07H12H", "13H18H", "19H24H", "25H30H", "31H36H", "36H42H",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            packages: &[
                "HP1", "HP2", "HP3", "IP1", "IP2", "IP3", "IP4", "IP5", "SP1", "SP2", "SP3",
            ],
        },
    }
}

/// Run hours per model.
///
fn run_hours(model: Model) -> &'static [u32] {
    match model {
        Model::Arome => &[0, 3, 6, 12],
        Model::Arpege => &[0, 6, 12, 18],
    }
}

/// The latest run plus the 4 before it, newest first.  Runs wrap to
/// the previous day when the clock does.
///
pub fn latest_runs_at(model: Model, now: DateTime<Utc>) -> Vec<NaiveDateTime> {
    let runs = run_hours(model);
    let i = runs
        .iter()
        .rposition(|&v| v <= now.hour())
        .unwrap_or(runs.len() - 1);

    let latest = now
        .naive_utc()
        .date()
        .and_hms_opt(runs[i], 0, 0)
        .unwrap_or(now.naive_utc());
    let mut all = vec![latest];

    for j in 0..4 {
        let k = (i + runs.len() - (j + 1) % runs.len()) % runs.len();
        let mut delta = runs[i] as i64 - runs[k] as i64;
        if delta <= 0 {
            delta += 24;
        }
        all.push(latest - Duration::hours(delta));
    }
    all
}

/// Same against the wall clock.
///
pub fn latest_runs(model: Model) -> Vec<NaiveDateTime> {
    latest_runs_at(model, Utc::now())
}

/// URL of the constant fields (relief & land-sea mask).
///
pub fn static_url(model: Model, hd: bool) -> String {
    let params = model_parameters(model, hd);
    format!(
        "https://donneespubliques.meteofrance.fr/donnees_libres/Static/gribsConstants/{}_{}_CONSTANT.grib",
        model, params.grid,
    )
}

/// Client for the DCPC cache.
///
#[derive(Clone, Debug)]
pub struct MfGrib {
    /// Cache endpoint
    pub base_url: String,
    /// Access token
    token: String,
    /// reqwest blocking client
    pub client: reqwest::blocking::Client,
}

impl MfGrib {
    pub fn new(site: &Site) -> Result<Self> {
        let token = site
            .token()
            .ok_or_else(|| SourceError::BadParam("mfgrib needs a token".to_string()))?
            .to_string();
        Ok(MfGrib {
            base_url: site.base_url.clone(),
            token,
            client: reqwest::blocking::Client::new(),
        })
    }

    /// Validate and build the request for one package.
    ///
    /// `time` is an hour, resolved to the first range starting there.
    ///
    pub fn request(
        &self,
        model: Model,
        hd: bool,
        package: &str,
        time: u32,
        reference: Option<NaiveDateTime>,
    ) -> Result<GribRequest> {
        let params = model_parameters(model, hd);

        if !params.packages.contains(&package) {
            return Err(SourceError::BadParam(format!(
                "package {package}, available: {}",
                params.packages.join(", ")
            ))
            .into());
        }

        let wanted = format!("{time:02}H");
        let range = params
            .ranges
            .iter()
            .find(|r| r.starts_with(&wanted))
            .ok_or_else(|| {
                SourceError::BadParam(format!(
                    "time {time}, available: {}",
                    params.ranges.join(", ")
                ))
            })?;

        let reference = match reference {
            Some(r) => r,
            _ => latest_runs(model)[0],
        };

        let url = format!(
            "{}?token={}&model={}&grid={}&package={}&time={}&referencetime={}Z&format=grib2",
            self.base_url,
            self.token,
            model,
            params.grid,
            package,
            range,
            reference.format("%Y-%m-%dT%H:%M:%S"),
        );
        let filename = format!(
            "W_fr-meteofrance,MODEL,{}+{}+{}+{}_C_LFPW_{}--.grib2",
            model,
            params.grid.replace('.', ""),
            package,
            range,
            reference.format("%Y%m%d%H%M"),
        );
        Ok(GribRequest { url, filename })
    }

    /// Download one package into `dir`, reusing a fresh local copy.
    ///
    pub fn fetch(&self, req: &GribRequest, dir: &Path) -> Result<PathBuf> {
        debug!("fetching {}", req.filename);
        let cache = CachedFile::new(dir, &req.filename)?;
        let path = cache.fetch(&self.client, &req.url)?;
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::site::Auth;

    use super::*;

    fn site() -> Site {
        Site {
            name: Some("mfgrib".to_string()),
            base_url: "http://dcpc-nwp.meteo.fr/services/PS_GetCache_DCPCPreviNum".to_string(),
            auth: Some(Auth::Token {
                token: "TESTTOKEN".to_string(),
            }),
            routes: None,
        }
    }

    #[test]
    fn test_model_parameters() {
        let p = model_parameters(Model::Arome, true);
        assert_eq!("0.01", p.grid);
        assert_eq!(43, p.ranges.len());
        assert_eq!("42H", p.ranges[42]);

        let p = model_parameters(Model::Arpege, false);
        assert_eq!("0.5", p.grid);
        assert_eq!(5, p.ranges.len());
    }

    #[test]
    fn test_request_url() {
        let mf = MfGrib::new(&site()).unwrap();
        let reference = NaiveDateTime::parse_from_str("2026-08-29T06:00:00", "%Y-%m-%dT%H:%M:%S")
            .unwrap();

        let r = mf
            .request(Model::Arpege, true, "SP1", 13, Some(reference))
            .unwrap();
        assert!(r.url.contains("model=ARPEGE"));
        assert!(r.url.contains("grid=0.1"));
        assert!(r.url.contains("time=13H24H"));
        assert!(r.url.contains("referencetime=2026-08-29T06:00:00Z"));
        assert_eq!(
            "W_fr-meteofrance,MODEL,ARPEGE+01+SP1+13H24H_C_LFPW_202608290600--.grib2",
            r.filename
        );
    }

    #[test]
    fn test_request_validation() {
        let mf = MfGrib::new(&site()).unwrap();

        // IP1 exists for ARPEGE, not for AROME HD
        assert!(mf.request(Model::Arpege, true, "IP1", 0, None).is_ok());
        assert!(mf.request(Model::Arome, true, "IP1", 0, None).is_err());

        // 44 is past the AROME HD horizon
        assert!(mf.request(Model::Arome, true, "SP1", 44, None).is_err());
    }

    #[test]
    fn test_latest_runs() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 14, 30, 0).unwrap();
        let runs = latest_runs_at(Model::Arpege, now);
        assert_eq!(5, runs.len());
        assert_eq!("2026-08-29 12:00:00", runs[0].to_string());
        assert_eq!("2026-08-29 06:00:00", runs[1].to_string());
        assert_eq!("2026-08-29 00:00:00", runs[2].to_string());
        assert_eq!("2026-08-28 18:00:00", runs[3].to_string());
        assert_eq!("2026-08-28 12:00:00", runs[4].to_string());
    }

    #[test]
    fn test_latest_runs_wrap() {
        // Early morning, most previous runs are yesterday's
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 1, 0, 0).unwrap();
        let runs = latest_runs_at(Model::Arome, now);
        assert_eq!("2026-08-29 00:00:00", runs[0].to_string());
        assert_eq!("2026-08-28 12:00:00", runs[1].to_string());
        assert_eq!("2026-08-28 06:00:00", runs[2].to_string());
        assert_eq!("2026-08-28 03:00:00", runs[3].to_string());
        assert_eq!("2026-08-28 00:00:00", runs[4].to_string());
    }

    #[test]
    fn test_static_url() {
        assert_eq!(
            "https://donneespubliques.meteofrance.fr/donnees_libres/Static/gribsConstants/AROME_0.01_CONSTANT.grib",
            static_url(Model::Arome, true)
        );
    }
}
