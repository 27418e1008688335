//! The `tides` command group.
//!
//! `table`, `nav` and `plot` go through the SHOM clients and render
//! LaTeX, `calc` is a purely local twelfths-rule calculator.
//!

use std::str::FromStr;

use chrono::{Duration, Local, NaiveDate};
use eyre::{eyre, Result};
use tracing::trace;

use estran_common::HourMinute;
use estran_sources::{find, Harbor, Oceano, Render, Spm, Target, Wfs, SPOTS_LAYER};
use estran_tides::{
    nav as nav_doc, plot as plot_doc, strip as strip_doc, DayTide, Ephemeris, HarborStrip,
    TexDoc, TideInterval,
};

use crate::cmds::{hdm_config, site};
use crate::{Context, Opts, TideCalcOpts, TideNavOpts, TidePlotOpts, TideTableOpts, TidesOpts};

pub fn dispatch(opts: &Opts, topts: &TidesOpts) -> Result<String> {
    match &topts.subcmd {
        crate::TidesSubCommand::Calc(copts) => calc(copts),
        crate::TidesSubCommand::Nav(nopts) => {
            let ctx = Context::load(&opts.config)?;
            nav(&ctx, nopts)
        }
        crate::TidesSubCommand::Plot(popts) => {
            let ctx = Context::load(&opts.config)?;
            plot(&ctx, popts)
        }
        crate::TidesSubCommand::Table(topts) => {
            let ctx = Context::load(&opts.config)?;
            table(&ctx, topts)
        }
    }
}

/// Day strip for one harbor.
///
fn table(ctx: &Context, opts: &TideTableOpts) -> Result<String> {
    let (spm, start) = client(ctx, &opts.date)?;
    let harbor = spm.resolve(&opts.harbor)?;

    let strip = strip_for(ctx, &spm, &harbor, start, opts.days)?;
    let mut doc = TexDoc::new();
    strip_doc(&mut doc, &strip);
    Ok(doc.render())
}

/// Full nav document, one strip per leg harbor.
///
fn nav(ctx: &Context, opts: &TideNavOpts) -> Result<String> {
    let (spm, start) = client(ctx, &opts.date)?;

    let strips = opts
        .harbors
        .iter()
        .map(|name| {
            let harbor = spm.resolve(name)?;
            strip_for(ctx, &spm, &harbor, start, opts.days)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(nav_doc(&strips))
}

/// Standalone water-level curve.
///
fn plot(ctx: &Context, opts: &TidePlotOpts) -> Result<String> {
    let (spm, start) = client(ctx, &opts.date)?;
    let harbor = spm.resolve(&opts.harbor)?;

    let mut levels = vec![];
    for i in 0..opts.days {
        let date = start + Duration::days(i);
        levels.push((date, spm.water_levels(&harbor, date)?));
    }
    Ok(plot_doc(start, opts.days, &levels, true))
}

/// Twelfths rule, a height for every time query and a time for every
/// height query.
///
pub fn calc(opts: &TideCalcOpts) -> Result<String> {
    let (h1, m1) = reference(&opts.first)?;
    let (h2, m2) = reference(&opts.second)?;

    let mut tide = TideInterval::new(h1, m1, h2, m2)?;
    if opts.summer {
        tide = tide.summer();
    }

    let lines = opts
        .queries
        .iter()
        .map(|q| match q.parse::<f64>() {
            Ok(height) => {
                let t = tide.time_at(height)?;
                Ok(format!("{:.2} m at {}", height, t))
            }
            _ => {
                let t = HourMinute::from_str(q)?;
                let h = tide.height_at(t)?;
                Ok(format!("{:.2} m at {}", h, t))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

/// `HHhMM,HEIGHT` into its two parts.
///
fn reference(text: &str) -> Result<(HourMinute, f64)> {
    let (t, h) = text
        .split_once(',')
        .ok_or_else(|| eyre!("expected HHhMM,HEIGHT, got {text}"))?;
    Ok((HourMinute::from_str(t)?, h.parse::<f64>()?))
}

/// The tide client plus the resolved first day.
///
fn client(ctx: &Context, date: &Option<String>) -> Result<(Spm, NaiveDate)> {
    let cfg = hdm_config(ctx)?;
    let spm = Spm::new(&cfg.hdm_service_url, &ctx.cache);
    let start = match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")?,
        _ => Local::now().date_naive(),
    };
    Ok((spm, start))
}

/// Tides plus sun times over consecutive days for one harbor.
///
fn strip_for(
    ctx: &Context,
    spm: &Spm,
    harbor: &Harbor,
    start: NaiveDate,
    days: i64,
) -> Result<HarborStrip> {
    let end = start + Duration::days(days - 1);
    let almanac = spm.tides(harbor, start, end)?;

    let mut ephem = Ephemeris::new(&ctx.cache.join("ephem.json"));
    let days = almanac
        .into_iter()
        .map(|(date, events)| {
            let sun = ephem.sun(harbor.lat, harbor.lon, date)?;
            Ok(DayTide { date, events, sun })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(HarborStrip {
        harbor: harbor.name.clone(),
        url: oceano_url(ctx, harbor),
        days,
    })
}

/// Oceanogramme link for the strip sidebar.  Points at the matching
/// spot when the layer knows one, at the raw coordinates otherwise.
///
fn oceano_url(ctx: &Context, harbor: &Harbor) -> String {
    let target = spot_target(ctx, harbor).unwrap_or(Target::LatLon {
        lat: harbor.lat,
        lon: harbor.lon,
    });
    match site(ctx, "oceano") {
        Ok(s) => Oceano::new(s).url(Render::Html, &target),
        _ => String::new(),
    }
}

fn spot_target(ctx: &Context, harbor: &Harbor) -> Option<Target> {
    let s = site(ctx, "clevisu").ok()?;
    let spots = Wfs::new(&s.base_url)
        .features_cached(&SPOTS_LAYER, &ctx.cache)
        .ok()?;
    let found = find(&spots, &harbor.name);
    let spot = found.first()?;
    trace!("spot {} for {}", spot.name, harbor.name);
    Some(Target::Spot(spot.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc_opts(first: &str, second: &str, queries: &[&str], summer: bool) -> TideCalcOpts {
        TideCalcOpts {
            first: first.to_string(),
            second: second.to_string(),
            summer,
            queries: queries.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_calc_height_query() {
        // Rising tide, one tidal hour is 62 mn, one twelfth 0.475 m.
        let out = calc(&calc_opts("06h12,1.1", "12h25,6.8", &["08h16"], false)).unwrap();
        assert!(out.starts_with("2.52 m at 08h16"), "{out}");
    }

    #[test]
    fn test_calc_time_query() {
        let out = calc(&calc_opts("06h12,1.1", "12h25,6.8", &["4.0"], false)).unwrap();
        assert!(out.contains("4.00 m at "), "{out}");
    }

    #[test]
    fn test_calc_bad_reference() {
        assert!(calc(&calc_opts("06h12", "12h25,6.8", &["4.0"], false)).is_err());
    }
}
