//! GPX 1.1 reading and writing.
//!

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use eyre::{eyre, Result};
use roxmltree::{Document, Node};
use tracing::trace;

use crate::{Track, TrackPoint};

/// Read every `<trk>` of a GPX document.
///
#[tracing::instrument(skip(data))]
pub fn read_gpx(data: &str) -> Result<Vec<Track>> {
    let doc = Document::parse(data)?;
    let root = doc.root_element();
    if root.tag_name().name() != "gpx" {
        return Err(eyre!("not a GPX document"));
    }

    let tracks: Vec<Track> = root
        .children()
        .filter(|n| n.has_tag_name("trk"))
        .map(read_trk)
        .collect::<Result<_>>()?;
    trace!("{} track(s)", tracks.len());
    Ok(tracks)
}

fn read_trk(trk: Node) -> Result<Track> {
    let name = trk
        .children()
        .find(|n| n.has_tag_name("name"))
        .and_then(|n| n.text())
        .unwrap_or_default()
        .to_string();

    let segments = trk
        .children()
        .filter(|n| n.has_tag_name("trkseg"))
        .map(|seg| {
            seg.children()
                .filter(|n| n.has_tag_name("trkpt"))
                .map(read_trkpt)
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Track { name, segments })
}

fn read_trkpt(pt: Node) -> Result<TrackPoint> {
    let lat: f64 = pt
        .attribute("lat")
        .ok_or_else(|| eyre!("trkpt without lat"))?
        .parse()?;
    let lon: f64 = pt
        .attribute("lon")
        .ok_or_else(|| eyre!("trkpt without lon"))?
        .parse()?;

    let ele = pt
        .children()
        .find(|n| n.has_tag_name("ele"))
        .and_then(|n| n.text())
        .map(str::parse)
        .transpose()?;
    let time = pt
        .children()
        .find(|n| n.has_tag_name("time"))
        .and_then(|n| n.text())
        .map(|t| t.parse::<DateTime<Utc>>())
        .transpose()?;

    Ok(TrackPoint {
        lat,
        lon,
        ele,
        time,
    })
}

/// Render tracks as a GPX 1.1 document.
///
#[tracing::instrument(skip(tracks))]
pub fn write_gpx(creator: &str, tracks: &[Track]) -> Result<String> {
    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<gpx version="1.1" creator="{creator}" xmlns="http://www.topografix.com/GPX/1/1">"#
    )?;
    for track in tracks {
        writeln!(out, "  <trk>")?;
        writeln!(out, "    <name>{}</name>", escape(&track.name))?;
        for seg in &track.segments {
            writeln!(out, "    <trkseg>")?;
            for p in seg {
                writeln!(out, r#"      <trkpt lat="{:.9}" lon="{:.9}">"#, p.lat, p.lon)?;
                if let Some(ele) = p.ele {
                    writeln!(out, "        <ele>{ele:.3}</ele>")?;
                }
                if let Some(time) = p.time {
                    writeln!(
                        out,
                        "        <time>{}</time>",
                        time.to_rfc3339_opts(SecondsFormat::Secs, true)
                    )?;
                }
                writeln!(out, "      </trkpt>")?;
            }
            writeln!(out, "    </trkseg>")?;
        }
        writeln!(out, "  </trk>")?;
    }
    writeln!(out, "</gpx>")?;
    Ok(out)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Rade de Brest</name>
    <trkseg>
      <trkpt lat="48.381200000" lon="-4.497200000">
        <ele>2.000</ele>
        <time>2024-05-12T10:41:45Z</time>
      </trkpt>
      <trkpt lat="48.382000000" lon="-4.496000000">
        <time>2024-05-12T10:42:45Z</time>
      </trkpt>
    </trkseg>
  </trk>
</gpx>
"#;

    #[test]
    fn test_read_gpx() {
        let tracks = read_gpx(SAMPLE).unwrap();
        assert_eq!(1, tracks.len());
        let t = &tracks[0];
        assert_eq!("Rade de Brest", t.name);
        assert_eq!(2, t.len());
        let p = &t.segments[0][0];
        assert_eq!(48.3812, p.lat);
        assert_eq!(Some(2.), p.ele);
        assert!(p.time.is_some());
        assert_eq!(None, t.segments[0][1].ele);
    }

    #[test]
    fn test_read_not_gpx() {
        assert!(read_gpx("<kml></kml>").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let tracks = read_gpx(SAMPLE).unwrap();
        let out = write_gpx("estran", &tracks).unwrap();
        let again = read_gpx(&out).unwrap();
        assert_eq!(tracks, again);
    }
}
