//! KML output for tracks.
//!

use std::collections::HashMap;

use eyre::Result;
use kml::{
    types::{AltitudeMode, Coord, Geometry, LineString, LineStyle, Placemark, Style},
    Kml, KmlDocument, KmlVersion,
};

use crate::Track;

/// Generate a `LineString` for one track segment.
///
fn from_segment_to_ls(seg: &[crate::TrackPoint]) -> LineString {
    let coords = seg
        .iter()
        .map(|p| Coord::new(p.lon, p.lat, p.ele))
        .collect::<Vec<_>>();

    LineString {
        tessellate: true,
        extrude: false,
        altitude_mode: AltitudeMode::ClampToGround,
        coords,
        ..Default::default()
    }
}

/// Create a `Style` entry for the track lines.
///
fn make_style(name: &str, colour: &str, size: f64) -> Kml {
    Kml::Style(Style {
        id: Some(name.into()),
        line: LineStyle {
            color: colour.into(),
            width: size,
            ..Default::default()
        }
        .into(),
        ..Default::default()
    })
}

/// Render tracks as a KML 2.2 document, one `Placemark` per segment.
///
#[tracing::instrument(skip(tracks))]
pub fn write_kml(name: &str, tracks: &[Track]) -> Result<String> {
    let mut elements = vec![make_style("track", "ff0000ff", 2.)];

    for track in tracks {
        for (n, seg) in track.segments.iter().enumerate() {
            let pname = if track.segments.len() > 1 {
                format!("{} ({})", track.name, n + 1)
            } else {
                track.name.clone()
            };
            elements.push(Kml::Placemark(Placemark {
                name: Some(pname),
                geometry: Some(Geometry::LineString(from_segment_to_ls(seg))),
                attrs: HashMap::from([("styleUrl".into(), "#track".into())]),
                ..Default::default()
            }));
        }
    }

    let doc = Kml::Document {
        attrs: HashMap::from([("name".into(), name.to_string())]),
        elements,
    };

    let kml = Kml::KmlDocument(KmlDocument {
        version: KmlVersion::V22,
        elements: vec![doc],
        ..Default::default()
    });

    Ok(kml.to_string())
}
