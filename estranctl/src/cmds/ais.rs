//! The `ais` command group.
//!

use std::collections::BTreeMap;
use std::fs;

use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use serde_json::json;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::warn;

use estran_formats::{write_gpx, Assembler, Message, Static, Track, TrackPoint};

use crate::cmds::nmea::parse_log;
use crate::{AisDecodeOpts, AisOpts, AisShipsOpts, AisSubCommand, AisTrackOpts};

pub fn dispatch(opts: &AisOpts) -> Result<String> {
    match &opts.subcmd {
        AisSubCommand::Decode(dopts) => decode(dopts),
        AisSubCommand::Ships(sopts) => ships(sopts),
        AisSubCommand::Track(topts) => track(topts),
    }
}

/// Every decoded message, one line each, optionally as JSON.
///
fn decode(opts: &AisDecodeOpts) -> Result<String> {
    let content = fs::read_to_string(&opts.file)?;

    let lines = messages(&content)
        .into_iter()
        .filter(|(_, m)| match opts.mmsi {
            Some(wanted) => m.mmsi() == Some(wanted),
            _ => true,
        })
        .map(|(time, m)| render(time, &m, opts.json))
        .collect::<Vec<_>>();
    Ok(lines.join("\n"))
}

/// Ships seen in the log, static data merged in when type 5 showed up.
///
fn ships(opts: &AisShipsOpts) -> Result<String> {
    let content = fs::read_to_string(&opts.file)?;

    let mut seen: BTreeMap<u32, Option<Static>> = BTreeMap::new();
    for (_, m) in messages(&content) {
        match m {
            Message::Static(s) => {
                seen.insert(s.mmsi, Some(s));
            }
            Message::Position(p) => {
                seen.entry(p.mmsi).or_insert(None);
            }
            Message::Unsupported(_) => (),
        }
    }

    let mut builder = Builder::default();
    builder.push_record(["MMSI", "Name", "Callsign", "Type", "Destination"]);
    let mut count = 0;
    for (mmsi, data) in &seen {
        match data {
            Some(s) => builder.push_record([
                mmsi.to_string(),
                s.shipname.clone(),
                s.callsign.clone(),
                s.shiptype.to_string(),
                s.destination.clone(),
            ]),
            None if opts.all => {
                builder.push_record([mmsi.to_string(), "".into(), "".into(), "".into(), "".into()])
            }
            None => continue,
        }
        count += 1;
    }
    Ok(format!(
        "{}\n{} ship(s)",
        builder.build().with(Style::modern()),
        count
    ))
}

/// Position reports of one ship into a GPX track.
///
fn track(opts: &AisTrackOpts) -> Result<String> {
    let content = fs::read_to_string(&opts.file)?;

    let mut seg = vec![];
    for (time, m) in messages(&content) {
        let Message::Position(p) = m else {
            continue;
        };
        if p.mmsi != opts.mmsi {
            continue;
        }
        seg.push(TrackPoint {
            lat: p.lat,
            lon: p.lon,
            ele: None,
            time,
        });
    }
    if seg.is_empty() {
        return Err(eyre!("no position report for {}", opts.mmsi));
    }

    let base = opts.output.clone().unwrap_or_else(|| opts.mmsi.to_string());
    let mut track = Track::new(&base);
    track.segments.push(seg);

    let fname = format!("{}.gpx", base);
    fs::write(&fname, write_gpx("estranctl", std::slice::from_ref(&track))?)?;
    Ok(format!("{} points into {}", track.len(), fname))
}

/// Reassemble the carrier sentences of a whole log.
///
fn messages(content: &str) -> Vec<(Option<DateTime<Utc>>, Message)> {
    let mut assembler = Assembler::new();
    let mut out = vec![];
    for ll in parse_log(content) {
        if !ll.sentence.is_aivdm() {
            continue;
        }
        match assembler.push(&ll.sentence) {
            Ok(Some(m)) => out.push((ll.time, m)),
            Ok(None) => (),
            Err(e) => warn!("skipping: {e}"),
        }
    }
    out
}

fn render(time: Option<DateTime<Utc>>, m: &Message, as_json: bool) -> String {
    if !as_json {
        return match time {
            Some(t) => format!("{} {:?}", t.format("%Y-%m-%dT%H:%M:%SZ"), m),
            _ => format!("{:?}", m),
        };
    }
    let mut v = match m {
        Message::Position(p) => json!({
            "type": "position",
            "mmsi": p.mmsi,
            "lat": p.lat,
            "lon": p.lon,
            "sog": p.sog,
            "cog": p.cog,
            "heading": p.heading,
        }),
        Message::Static(s) => json!({
            "type": "static",
            "mmsi": s.mmsi,
            "shipname": s.shipname,
            "callsign": s.callsign,
            "shiptype": s.shiptype,
            "destination": s.destination,
        }),
        Message::Unsupported(t) => json!({"type": "unsupported", "message_type": t}),
    };
    if let Some(t) = time {
        v["time"] = json!(t.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    }
    v.to_string()
}
