//! Twelfths rule between two consecutive tide events.
//!
//! The tide covers 1/12 of its range during the first hour, 2/12 the
//! second, then 3, 3, 2 and 1.  An "hour" here is one sixth of the
//! actual interval.  Good enough for semi-diurnal coasts, which is
//! where the almanacs we feed it with come from.
//!

use std::fmt::{Display, Formatter};

use eyre::{eyre, Result};

use estran_common::HourMinute;

/// Twelfths per tidal hour
const TWELFTHS: [f64; 6] = [1., 2., 3., 3., 2., 1.];

/// Cumulated twelfths at the start of each tidal hour
const CUMUL: [f64; 6] = [0., 1., 3., 6., 9., 11.];

/// The interval between a low and a high water (either way around).
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TideInterval {
    /// First event
    pub h1: HourMinute,
    pub m1: f64,
    /// Second event, later the same tide cycle
    pub h2: HourMinute,
    pub m2: f64,
    /// 60 when the queries are in DST ("heure d'été")
    dst_offset: i32,
}

impl TideInterval {
    /// Both events in local standard time, heights in metres.
    ///
    pub fn new(h1: HourMinute, m1: f64, h2: HourMinute, m2: f64) -> Result<Self> {
        if h1.diff_minutes(h2) == 0 {
            return Err(eyre!("events at the same time"));
        }
        if m1 == m2 {
            return Err(eyre!("flat tide, heights are equal"));
        }
        Ok(TideInterval {
            h1,
            m1,
            h2,
            m2,
            dst_offset: 0,
        })
    }

    /// Queries and answers in summer time.
    ///
    pub fn summer(mut self) -> Self {
        self.dst_offset = 60;
        self
    }

    /// One tidal hour, in minutes.
    ///
    pub fn tidal_hour(&self) -> f64 {
        f64::from(self.h1.diff_minutes(self.h2)) / 6.
    }

    /// One twelfth of the range, signed.  Negative means the tide is
    /// falling.
    ///
    pub fn twelfth(&self) -> f64 {
        (self.m2 - self.m1) / 12.
    }

    /// Whether the interval runs from high to low water.
    ///
    pub fn falling(&self) -> bool {
        self.twelfth() < 0.
    }

    /// Height at a given local time.
    ///
    pub fn height_at(&self, h: HourMinute) -> Result<f64> {
        let delta =
            f64::from(self.h1.diff_minutes(h) - self.dst_offset) / self.tidal_hour();
        if !(0. ..6.).contains(&delta) {
            return Err(eyre!("{h} is outside the interval"));
        }
        let i = delta.floor() as usize;
        let fraction = CUMUL[i] + TWELFTHS[i] * (delta - delta.floor());
        Ok(self.m1 + fraction * self.twelfth())
    }

    /// Time at which the tide reaches a given height.
    ///
    pub fn time_at(&self, height: f64) -> Result<HourMinute> {
        let twelfths = (height - self.m1) / self.twelfth();
        let whole = twelfths.floor();

        for i in 0..6 {
            if CUMUL[i] <= whole && whole < CUMUL[i] + TWELFTHS[i] {
                let delta = (i as f64 + (twelfths - CUMUL[i]) / TWELFTHS[i]) * self.tidal_hour();
                return Ok(self
                    .h1
                    .add_minutes(delta.round() as i32 + self.dst_offset));
            }
        }
        Err(eyre!("{height} m is outside the interval"))
    }
}

impl Display for TideInterval {
    /// The two events, high water first when falling.
    ///
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (first, second) = if self.falling() { ("PM", "BM") } else { ("BM", "PM") };
        writeln!(f, "{}: {} {:5.2} m", first, self.h1, self.m1)?;
        writeln!(f, "{}: {} {:5.2} m", second, self.h2, self.m2)?;
        write!(
            f,
            "HM={:.3} min  dz={:.3} m",
            self.tidal_hour(),
            self.twelfth().abs()
        )
    }
}
