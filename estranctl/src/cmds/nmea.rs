//! The `nmea` command group.
//!

use std::fs;
use std::path::Path;

use eyre::Result;
use tracing::warn;

use estran_formats::{write_gpx, write_kml, LogLine, LogStats, Track, TrackPoint};

use crate::{NmeaExtractOpts, NmeaOpts, NmeaStatsOpts, NmeaSubCommand, NmeaTrackOpts};

pub fn dispatch(opts: &NmeaOpts) -> Result<String> {
    match &opts.subcmd {
        NmeaSubCommand::Extract(eopts) => extract(eopts),
        NmeaSubCommand::Stats(sopts) => stats(sopts),
        NmeaSubCommand::Track(topts) => track(topts),
    }
}

/// Raw sentences of one tag, unparsable lines are skipped.
///
fn extract(opts: &NmeaExtractOpts) -> Result<String> {
    let content = fs::read_to_string(&opts.file)?;
    let tag = opts.tag.to_uppercase();

    let lines = parse_log(&content)
        .filter(|ll| ll.sentence.tag == tag)
        .map(|ll| ll.sentence.raw)
        .collect::<Vec<_>>();
    Ok(lines.join("\n"))
}

/// Per-tag tally.
///
fn stats(opts: &NmeaStatsOpts) -> Result<String> {
    let content = fs::read_to_string(&opts.file)?;
    Ok(LogStats::from_log(&content).list())
}

/// Positions out of GLL/RMC/GGA sentences into one track file.
///
fn track(opts: &NmeaTrackOpts) -> Result<String> {
    let content = fs::read_to_string(&opts.file)?;
    let stem = stem_of(&opts.file);

    let mut seg = vec![];
    for ll in parse_log(&content) {
        let Ok(Some(p)) = ll.sentence.position() else {
            continue;
        };
        seg.push(TrackPoint {
            lat: p.lat,
            lon: p.lon,
            ele: None,
            time: ll.time,
        });
    }

    let mut track = Track::new(&stem);
    track.segments.push(seg);

    let base = opts.output.clone().unwrap_or(stem);
    let (fname, data) = if opts.gpx {
        (
            format!("{}.gpx", base),
            write_gpx("estranctl", std::slice::from_ref(&track))?,
        )
    } else {
        (
            format!("{}.kml", base),
            write_kml(&base, std::slice::from_ref(&track))?,
        )
    };
    fs::write(&fname, data)?;
    Ok(format!("{} points into {}", track.len(), fname))
}

/// Parsed log lines, warning once per bad line.
///
pub(crate) fn parse_log(content: &str) -> impl Iterator<Item = LogLine> + '_ {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| match LogLine::parse(l) {
            Ok(ll) => Some(ll),
            Err(e) => {
                warn!("skipping: {e}");
                None
            }
        })
}

pub(crate) fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "track".to_string())
}
