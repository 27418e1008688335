//! Hour+minute type used for tide almanacs.
//!

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use eyre::eyre;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_HM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)[hH](\d+)$").unwrap());

/// A time of day with minute resolution, as printed in tide tables
/// (`06h12`).  Arithmetic wraps around midnight.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HourMinute {
    pub hh: u32,
    pub mm: u32,
}

impl HourMinute {
    /// Normalizing constructor, `new(25, 70)` is 02h10.
    ///
    pub fn new(hh: u32, mm: u32) -> Self {
        let total = (hh * 60 + mm) % (24 * 60);
        HourMinute {
            hh: total / 60,
            mm: total % 60,
        }
    }

    /// Shift by a signed number of minutes, wrapping around midnight.
    ///
    pub fn add_minutes(self, m: i32) -> Self {
        let total = i32::try_from(self.hh * 60 + self.mm).unwrap_or(0) + m;
        let total = total.rem_euclid(24 * 60) as u32;
        HourMinute {
            hh: total / 60,
            mm: total % 60,
        }
    }

    /// Minutes elapsed from `self` to `other`, assuming `other` is later
    /// the same day or just past midnight.
    ///
    pub fn diff_minutes(self, other: Self) -> i32 {
        let a = i32::try_from(self.hh * 60 + self.mm).unwrap_or(0);
        let b = i32::try_from(other.hh * 60 + other.mm).unwrap_or(0);
        (b - a).rem_euclid(24 * 60)
    }

    /// Fractional hours, for plotting.
    ///
    pub fn as_hours(self) -> f64 {
        f64::from(self.hh) + f64::from(self.mm) / 60.
    }
}

impl FromStr for HourMinute {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = RE_HM
            .captures(s.trim())
            .ok_or_else(|| eyre!("invalid hour: {s}"))?;
        let hh: u32 = c[1].parse()?;
        let mm: u32 = c[2].parse()?;
        if hh >= 24 || mm >= 60 {
            return Err(eyre!("hour out of range: {s}"));
        }
        Ok(HourMinute { hh, mm })
    }
}

impl fmt::Display for HourMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}h{:02}", self.hh, self.mm)
    }
}
